use anyhow::bail;
use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::{consts, models};

/// Hands notifications to the web app's internal API, which owns the
/// push/SMS/email/WhatsApp delivery.
#[derive(Clone)]
pub struct NotificationHandler {
    pub client: reqwest::Client,
    pub web_app_api_url: String,
    pub internal_api_secret: String,
}

impl NotificationHandler {
    pub fn notifications_endpoint(&self) -> String {
        format!(
            "{base}{path}",
            base = self.web_app_api_url.trim_end_matches('/'),
            path = consts::INTERNAL_NOTIFICATIONS_PATH
        )
    }
}

fn build_payload(
    notification: &models::notification::Notification,
    request_id: Uuid,
) -> serde_json::Value {
    json!({
        "request_id": request_id,
        "pet_id": notification.pet_id,
        "user_id": notification.user_app_id,
        "event_code": notification.event_code,
        "title": notification.title,
        "body": notification.message,
        "priority": notification.priority.to_string(),
        "channel": notification.channel.to_string(),
        "due_date": notification.due_date,
    })
}

#[async_trait]
impl crate::services::NotificationSender for NotificationHandler {
    async fn send(&self, notification: &models::notification::Notification) -> anyhow::Result<()> {
        let request_id = Uuid::new_v4();

        let response = self
            .client
            .post(self.notifications_endpoint())
            .header("accept", "application/json")
            .header(consts::INTERNAL_SECRET_HEADER, &self.internal_api_secret)
            .json(&build_payload(notification, request_id))
            .send()
            .await?;

        if response.status().is_success() {
            log::info!(
                "notification request_id={request_id} pet_id={} event={} sent",
                notification.pet_id,
                notification.event_code
            );
            return Ok(());
        }

        let status = response.status();
        let error_body = response
            .json::<serde_json::Value>()
            .await
            .unwrap_or_else(|_| json!({"error": "Unknown error"}));

        bail!("notification request_id={request_id} was rejected ({status}): {error_body}")
    }
}
