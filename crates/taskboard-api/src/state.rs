use std::sync::Arc;

use taskboard_core::accounts::AccountService;
use taskboard_core::boards::BoardService;
use taskboard_core::digest::DigestService;
use taskboard_core::notifier::Notifier;
use taskboard_core::session::SessionKeys;
use taskboard_core::statuses::StatusService;
use taskboard_core::tasks::TaskService;
use taskboard_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub accounts: AccountService,
    pub boards: BoardService,
    pub tasks: TaskService,
    pub statuses: StatusService,
    pub digest: Arc<DigestService>,
}

impl AppStateInner {
    pub fn new(
        db: Arc<Database>,
        keys: SessionKeys,
        notifier: Arc<dyn Notifier>,
        digest_concurrency: usize,
    ) -> Self {
        Self {
            accounts: AccountService::new(db.clone(), keys),
            boards: BoardService::new(db.clone()),
            tasks: TaskService::new(db.clone(), notifier.clone()),
            statuses: StatusService::new(db.clone()),
            digest: Arc::new(DigestService::new(db, notifier, digest_concurrency)),
        }
    }
}
