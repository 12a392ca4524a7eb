// crates/server/src/state.rs
//! Application state for the Axum server.

use marketlens_db::Database;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Service handle over the shared connection adapter. The adapter may
    /// still be connecting when the first requests arrive.
    pub db: Database,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(db: Database) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketlens_db::ConnectionState;

    #[tokio::test]
    async fn test_app_state_new() {
        let db = Database::new_in_memory().await.expect("in-memory DB");
        let state = AppState::new(db);
        assert!(state.uptime_secs() < 1);
        assert_eq!(state.db.connection().state(), ConnectionState::Ready);
    }

    #[tokio::test]
    async fn test_app_state_clone() {
        let db = Database::new_in_memory().await.expect("in-memory DB");
        let state = AppState::new(db);
        let cloned = state.clone();
        assert_eq!(state.uptime_secs(), cloned.uptime_secs());
    }
}
