use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use tokio::{
    sync::RwLock,
    task::{self, JoinHandle},
};
use tokio_util::sync::CancellationToken;

use crate::reminder::ReminderState;

use super::{
    NotificationRequest, NotificationService, NotificationServiceError,
    delivery::ReminderDeliveryChannel,
};

struct PendingNotification {
    generation: u64,
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

#[derive(Default)]
struct NotificationStore {
    pending: HashMap<String, PendingNotification>,
    delivered: HashSet<String>,
    next_generation: u64,
}

type SharedNotificationStore = Arc<RwLock<NotificationStore>>;

/// In-process notification service. Every pending request is a tokio task
/// sleeping until its trigger resolves in `timezone`.
pub struct LocalNotificationCenter {
    store: SharedNotificationStore,
    delivery_channel: Arc<dyn ReminderDeliveryChannel>,
    timezone: Tz,
    authorized: AtomicBool,
    shutdown: CancellationToken,
}

impl LocalNotificationCenter {
    pub fn new(delivery_channel: Arc<dyn ReminderDeliveryChannel>, timezone: Tz) -> Self {
        Self {
            store: Arc::new(RwLock::new(NotificationStore::default())),
            delivery_channel,
            timezone,
            authorized: AtomicBool::new(true),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn set_authorized(&self, authorized: bool) {
        self.authorized.store(authorized, Ordering::SeqCst);
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    pub async fn state(&self, identifier: &str) -> ReminderState {
        let store = self.store.read().await;
        if store.pending.contains_key(identifier) {
            ReminderState::Pending
        } else if store.delivered.contains(identifier) {
            ReminderState::Delivered
        } else {
            ReminderState::Unscheduled
        }
    }

    pub async fn pending_count(&self) -> usize {
        let mut store = self.store.write().await;
        store.pending.retain(|_, pending| !pending.task.is_finished());
        store.pending.len()
    }
}

impl Drop for LocalNotificationCenter {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl NotificationService for LocalNotificationCenter {
    async fn add(&self, request: NotificationRequest) -> Result<(), NotificationServiceError> {
        if !self.is_authorized() {
            return Err(NotificationServiceError::NotAuthorized);
        }

        let fire_at = request
            .trigger
            .resolve(self.timezone)
            .ok_or(NotificationServiceError::InvalidTrigger(request.trigger))?;
        let delay = (fire_at.with_timezone(&Utc) - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        let mut store = self.store.write().await;
        let identifier = request.identifier.clone();
        if let Some(previous) = store.pending.remove(&identifier) {
            log::info!("Replacing pending notification [identifier = {}]", identifier);
            previous.cancellation_token.cancel();
        }
        store.delivered.remove(&identifier);

        let generation = store.next_generation;
        store.next_generation += 1;

        let cancellation_token = self.shutdown.child_token();
        let task = task::spawn(run_notification(
            Arc::clone(&self.store),
            Arc::clone(&self.delivery_channel),
            request,
            generation,
            cancellation_token.clone(),
            delay,
        ));

        log::info!(
            "[SCHEDULE] Notification fires at {} in {:?} [identifier = {}]",
            fire_at,
            delay,
            identifier
        );

        store.pending.insert(
            identifier,
            PendingNotification {
                generation,
                task,
                cancellation_token,
            },
        );

        Ok(())
    }

    async fn remove_pending(&self, identifier: &str) {
        let mut store = self.store.write().await;
        if let Some(pending) = store.pending.remove(identifier) {
            pending.cancellation_token.cancel();
            log::info!("Removed pending notification [identifier = {}]", identifier);
        }
        store.delivered.remove(identifier);
    }
}

async fn run_notification(
    store: SharedNotificationStore,
    delivery_channel: Arc<dyn ReminderDeliveryChannel>,
    request: NotificationRequest,
    generation: u64,
    cancellation_token: CancellationToken,
    delay: Duration,
) {
    let identifier = request.identifier;
    tokio::select! {
        _ = cancellation_token.cancelled() => {
            log::info!("Notification was cancelled before firing [identifier = {}]", identifier);
            return;
        }
        _ = tokio::time::sleep(delay) => {}
    }

    {
        let mut store = store.write().await;
        match store.pending.get(&identifier) {
            Some(pending) if pending.generation == generation => {}
            _ => return,
        }
        store.pending.remove(&identifier);
        store.delivered.insert(identifier.clone());
    }

    if let Err(error) = delivery_channel.deliver(&identifier, &request.content).await {
        log::error!(
            "Failed to deliver notification. error = {}, identifier = {}",
            error,
            identifier
        );
    }
}
