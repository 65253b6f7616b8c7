pub mod check_duplicate;
pub mod fetch_metadata;
pub mod persist_message;
pub mod persist_readings;
pub mod set_receiving_data;

use crate::prelude::*;

use std::future::Future;
use std::time::Duration;

/// Runs `call`, retrying exactly once after `delay` if it timed out.
///
/// Any other failure, or a second timeout, is returned as an error.
pub async fn retry_once_on_timeout<T, F, Fut>(delay: Duration, what: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    match call().await {
        Ok(value) => Ok(value),
        Err(err) if err.is_timeout() => {
            warn!("{} timed out, retrying in {}s", what, delay.as_secs());
            tokio::time::sleep(delay).await;
            call()
                .await
                .map_err(|err| anyhow!("{} failed after retry: {}", what, err))
        }
        Err(err) => Err(anyhow!("{} failed: {}", what, err)),
    }
}
