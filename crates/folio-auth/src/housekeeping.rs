//! Periodic removal of expired staging records and refresh tokens.
//!
//! Every read path re-checks expiry, so this only bounds table growth.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::service::{PurgeReport, SessionController};

pub const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Run [`SessionController::purge_expired`] every `every`, starting one
/// period from now.
pub fn spawn_housekeeping(controller: Arc<SessionController>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await; // Skip first immediate tick
        loop {
            interval.tick().await;
            match controller.purge_expired().await {
                Ok(report) if report != PurgeReport::default() => {
                    info!(
                        pending_registrations = report.pending_registrations,
                        reset_requests = report.reset_requests,
                        refresh_tokens = report.refresh_tokens,
                        "Background purge completed"
                    );
                }
                Ok(_) => debug!("Background purge found nothing to remove"),
                Err(e) => warn!(error = %e, "Background purge failed"),
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::{Argon2Hasher, JwtManager, OtpEngine};
    use crate::mail::LogMailer;
    use crate::storage::AuthDatabase;

    #[tokio::test]
    async fn purges_after_first_period() {
        let db = AuthDatabase::open_in_memory().await.unwrap();
        db.upsert_pending_registration("old@x.com", "Old", "h", "111111", 10)
            .await
            .unwrap();
        db.upsert_reset_request("old@x.com", "111111", 10)
            .await
            .unwrap();

        let controller = SessionController::new(
            db.clone(),
            Arc::new(Argon2Hasher::new()),
            Arc::new(JwtManager::new(b"a", 900, b"r", 3600)),
            OtpEngine::default(),
            Arc::new(LogMailer),
        )
        .unwrap();

        let handle = spawn_housekeeping(Arc::new(controller), Duration::from_millis(50));
        // Nothing happens on the skipped first tick.
        assert!(db.get_pending_registration("old@x.com").await.unwrap().is_some());

        let mut purged = false;
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(25)).await;
            if db.get_pending_registration("old@x.com").await.unwrap().is_none() {
                purged = true;
                break;
            }
        }
        handle.abort();

        assert!(purged, "expired registration was not purged");
        assert!(db.get_reset_request("old@x.com").await.unwrap().is_none());
    }
}
