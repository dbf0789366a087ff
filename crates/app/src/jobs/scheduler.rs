use std::future::Future;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::jobs::JobError;

/// Runs `job` every `period` until the surrounding task is dropped.
///
/// The first run happens one full period after start. A failing run is logged
/// and the schedule continues.
pub async fn run_interval<F, Fut>(
    name: &'static str,
    period: Duration,
    mut job: F,
) -> Result<(), JobError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), JobError>>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match job().await {
            Ok(()) => debug!(job = name, "job run complete"),
            Err(err) => warn!(error = %err, job = name, "job execution failed"),
        }
    }
}
