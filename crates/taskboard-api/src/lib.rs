pub mod auth;
pub mod boards;
pub mod error;
pub mod middleware;
pub mod router;
pub mod state;
pub mod statuses;
pub mod tasks;

pub use router::router;
pub use state::{AppState, AppStateInner};
