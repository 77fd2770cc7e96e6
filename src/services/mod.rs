pub mod notification;

use crate::models;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Delivers one notification through its channel.
    async fn send(&self, notification: &models::notification::Notification) -> anyhow::Result<()>;
}

pub type ImplNotificationSender = Box<dyn NotificationSender>;
