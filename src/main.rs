use std::{sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Utc;
use release_reminder::{
    ReminderRequest,
    appsettings::AppSettings,
    notification::{delivery::LogDeliveryChannel, local_center::LocalNotificationCenter},
    scheduling::{ReleaseReminderService, ReminderScheduler},
};

const PENDING_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load().context("Failed to load appsettings")?;
    let calculator = settings.calculator()?;

    let center = Arc::new(LocalNotificationCenter::new(
        Arc::new(LogDeliveryChannel),
        calculator.timezone(),
    ));
    center.set_authorized(settings.notifications.authorized);

    let service = ReleaseReminderService::new(calculator, ReminderScheduler::new(center.clone()));

    let mut requests = settings.tracked;
    if let Some(request) = request_from_args(std::env::args().skip(1))? {
        requests.push(request);
    }

    log::info!("Tracking {} release(s)", requests.len());
    for request in &requests {
        // Failures are reported per release and never stop the others.
        if let Ok(reminder) = service.track_release(request, Utc::now()).await {
            log::info!(
                "Reminder for {:?} set for {}",
                request.title,
                reminder.fire_at
            );
        }
    }

    tokio::select! {
        _ = wait_for_deliveries(&center) => {
            log::info!("All reminders delivered");
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, dropping pending reminders");
        }
    }

    Ok(())
}

fn request_from_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<ReminderRequest>> {
    let Some(id) = args.next() else {
        return Ok(None);
    };
    let entity_id = id
        .parse()
        .with_context(|| format!("Entity id must be an integer, got {id:?}"))?;
    let title = args
        .next()
        .context("Usage: release-reminder [<id> <title> [<YYYY-MM-DD>]]")?;
    let target_date_raw = args.next();

    Ok(Some(ReminderRequest {
        entity_id,
        title,
        target_date_raw,
    }))
}

async fn wait_for_deliveries(center: &LocalNotificationCenter) {
    while center.pending_count().await > 0 {
        tokio::time::sleep(PENDING_POLL_INTERVAL).await;
    }
}
