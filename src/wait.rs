use anyhow::{bail, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

pub async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Awaits `probe` every `interval` until it yields `Some`, fails, or `timeout` elapses.
/// The probe always runs at least once.
pub async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        let now = Instant::now();
        if now >= deadline {
            bail!("condition not met after {attempts} attempts in {timeout:?}");
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
