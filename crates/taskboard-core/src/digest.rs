//! Daily digest: tell every linked user what is open and what they finished,
//! then roll every reported task over to archived.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::stream::{self, StreamExt};
use taskboard_db::Database;
use taskboard_db::models::{DigestRecipient, TaskRow};
use taskboard_types::models::TaskStatus;
use taskboard_types::notify::NoticeKind;

use crate::error::{AuthError, Result, required};
use crate::format;
use crate::notifier::Notifier;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Reads and the bulk rollover the digest needs from storage.
pub trait DigestStore: Send + Sync {
    fn digest_recipients(&self) -> anyhow::Result<Vec<DigestRecipient>>;
    fn find_recipient(&self, handle: &str) -> anyhow::Result<Option<DigestRecipient>>;
    fn tasks_for_user(&self, user_id: i64, status: TaskStatus) -> anyhow::Result<Vec<TaskRow>>;
    fn archive_reported(&self) -> anyhow::Result<usize>;
}

impl DigestStore for Database {
    fn digest_recipients(&self) -> anyhow::Result<Vec<DigestRecipient>> {
        Database::digest_recipients(self)
    }

    fn find_recipient(&self, handle: &str) -> anyhow::Result<Option<DigestRecipient>> {
        Ok(self.find_user_by_handle(handle)?.map(|u| DigestRecipient {
            user_id: u.id,
            tg_name: u.tg_name,
            chat_id: u.chat_id,
        }))
    }

    fn tasks_for_user(&self, user_id: i64, status: TaskStatus) -> anyhow::Result<Vec<TaskRow>> {
        Database::tasks_for_user(self, user_id, status)
    }

    fn archive_reported(&self) -> anyhow::Result<usize> {
        Database::archive_reported(self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestReport {
    pub users: usize,
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
    pub archived: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Delivered,
    Skipped,
    Failed,
}

pub struct DigestService {
    store: Arc<dyn DigestStore>,
    notifier: Arc<dyn Notifier>,
    concurrency: usize,
}

impl DigestService {
    pub fn new(store: Arc<dyn DigestStore>, notifier: Arc<dyn Notifier>, concurrency: usize) -> Self {
        Self {
            store,
            notifier,
            concurrency: concurrency.max(1),
        }
    }

    /// One full pass. Per-user failures are logged and counted; only a failure
    /// to list users or to run the rollover fails the whole run.
    pub async fn run(&self) -> Result<DigestReport> {
        let recipients = self.store.digest_recipients()?;

        let delivered = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        stream::iter(recipients.iter())
            .for_each_concurrent(self.concurrency, |recipient| {
                let (delivered, skipped, failed) = (&delivered, &skipped, &failed);
                async move {
                    let counter = match self.digest_user(recipient).await {
                        Outcome::Delivered => delivered,
                        Outcome::Skipped => skipped,
                        Outcome::Failed => failed,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
            .await;

        // Runs whatever the per-user outcomes were.
        let archived = self.store.archive_reported()?;

        let report = DigestReport {
            users: recipients.len(),
            delivered: delivered.into_inner(),
            skipped: skipped.into_inner(),
            failed: failed.into_inner(),
            archived,
        };
        tracing::info!(
            users = report.users,
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failed,
            archived = report.archived,
            "Digest run complete"
        );
        Ok(report)
    }

    /// On-demand digest for one handle, delivered in the background.
    /// `chat_id` must be the chat already linked to that account; nothing
    /// goes to any other chat. Nothing is archived.
    pub fn send_user_digest(self: &Arc<Self>, handle: &str, chat_id: i64) -> Result<()> {
        let handle = required(handle, "tg_name")?;
        let recipient = self
            .store
            .find_recipient(handle)?
            .ok_or(AuthError::UserNotFound)?;

        let user_id = recipient.user_id;
        if recipient.chat_id != Some(chat_id) {
            tracing::warn!(user_id, chat_id, "On-demand digest refused for an unlinked chat");
            return Err(AuthError::BadCredentials.into());
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = this.digest_user(&recipient).await;
            tracing::debug!(user_id, chat_id, ?outcome, "On-demand digest finished");
        });
        Ok(())
    }

    async fn digest_user(&self, recipient: &DigestRecipient) -> Outcome {
        let user_id = recipient.user_id;
        let Some(chat_id) = recipient.chat_id else {
            tracing::debug!(user_id, "No chat linked, skipping digest");
            return Outcome::Skipped;
        };

        let sections: [(TaskStatus, fn(&[TaskRow]) -> String); 2] = [
            (TaskStatus::Open, format::open_tasks),
            (TaskStatus::CompletedPendingReport, format::completed_tasks),
        ];

        // The second message only goes out if the first one did.
        for (status, render) in sections {
            let tasks = match self.store.tasks_for_user(user_id, status) {
                Ok(tasks) => tasks,
                Err(e) => {
                    tracing::warn!(user_id, ?status, error = %e, "Digest task fetch failed");
                    return Outcome::Failed;
                }
            };

            if let Err(e) = self.notifier.deliver(NoticeKind::Digest, chat_id, &render(&tasks)).await {
                tracing::warn!(user_id, chat_id, ?status, error = %e, "Digest delivery failed");
                return Outcome::Failed;
            }
        }

        Outcome::Delivered
    }
}
