use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;

/// Periodically cancels bookings whose deposit deadline passed unpaid.
pub async fn start_expiry_worker(state: Arc<AppState>) {
    let interval = Duration::from_secs(state.config.expiry_sweep_interval_secs);
    info!("Starting deposit expiry worker (every {}s)...", interval.as_secs());

    loop {
        let now = Utc::now();
        let span = info_span!("deposit_sweep", at = %now.to_rfc3339());

        async {
            match state.deposits.expire_overdue(now).await {
                Ok(expired) => {
                    for booking in &expired {
                        info!(
                            booking_id = %booking.id,
                            tenant_id = %booking.tenant_id,
                            "Booking canceled: deposit deadline passed"
                        );
                    }
                }
                Err(e) => error!("Deposit sweep failed: {:?}", e),
            }
        }
            .instrument(span)
            .await;

        sleep(interval).await;
    }
}
