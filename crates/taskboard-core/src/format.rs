//! Message texts sent to users through the notification bot.

use std::fmt::Write;

use taskboard_db::models::TaskRow;

pub const NO_OPEN_TASKS: &str = "You have no open tasks.";
pub const NO_COMPLETED_TASKS: &str = "You have no tasks completed today.";

pub fn open_tasks(tasks: &[TaskRow]) -> String {
    if tasks.is_empty() {
        return NO_OPEN_TASKS.to_string();
    }
    numbered("Your tasks:", tasks, "in progress")
}

pub fn completed_tasks(tasks: &[TaskRow]) -> String {
    if tasks.is_empty() {
        return NO_COMPLETED_TASKS.to_string();
    }
    numbered("Your completed tasks:", tasks, "done")
}

pub fn task_created(title: &str, description: &str) -> String {
    format!("New task created: {title}\nDescription: {description}\nStatus: in progress")
}

fn numbered(heading: &str, tasks: &[TaskRow], status_label: &str) -> String {
    let mut out = format!("{heading}\n\n");
    for (n, task) in tasks.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "{}. {}\nDescription: {}\nStatus: {}\n\n",
            n + 1,
            task.title,
            task.description,
            status_label
        );
    }
    out
}
