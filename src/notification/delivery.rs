use async_trait::async_trait;

use crate::reminder::ReminderContent;

/// Where a fired reminder ends up.
#[async_trait]
pub trait ReminderDeliveryChannel: Send + Sync + 'static {
    async fn deliver(&self, identifier: &str, content: &ReminderContent) -> anyhow::Result<()>;
}

pub struct LogDeliveryChannel;

#[async_trait]
impl ReminderDeliveryChannel for LogDeliveryChannel {
    async fn deliver(&self, identifier: &str, content: &ReminderContent) -> anyhow::Result<()> {
        log::info!(
            "[DELIVERED] {}: {} [identifier = {}]",
            content.title,
            content.body,
            identifier
        );

        Ok(())
    }
}
