//! Offloading of blocking vendor calls from the async runtime.

use tokio::task::spawn_blocking;

use crate::prelude::*;

/// Run the blocking closure on the blocking pool and wait for it.
///
/// There is no timeout and no cancellation: the call runs to completion.
pub async fn run_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking(f).await.context("the blocking task has failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_blocking_ok() -> Result {
        let value = run_blocking(|| 2 + 2).await?;
        assert_eq!(value, 4);
        Ok(())
    }

    #[tokio::test]
    async fn run_blocking_panic_err() {
        let result = run_blocking(|| -> u8 { panic!("boom") }).await;
        assert!(result.is_err());
    }
}
