use shared::models::{MessageResponse, Notification};

use crate::{ClientResult, HttpClient};

// ========== Notification API ==========

impl HttpClient {
    /// Stored notifications, newest first
    pub async fn notifications(&self) -> ClientResult<Vec<Notification>> {
        self.get("/notifications").await
    }

    /// The read flag is the only notification field the client changes
    pub async fn mark_notification_read(&self, notification_id: &str) -> ClientResult<()> {
        let _: MessageResponse = self
            .put_empty(&format!("/notifications/{}/read", notification_id))
            .await?;
        Ok(())
    }
}
