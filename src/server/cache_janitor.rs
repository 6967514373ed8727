use crate::infra_memory::SecretCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Wipes every signing context once per period. The first flush happens one
/// full period after start.
pub struct CacheJanitor {
    cache: Arc<SecretCache>,
    period: Duration,
    cancellation_token: CancellationToken,
}

impl CacheJanitor {
    pub fn new(
        cache: Arc<SecretCache>,
        period: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            cache,
            period,
            cancellation_token,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    fn flush_once(&self) {
        let flushed = self.cache.flush_all();
        info!(flushed, "secret cache flushed");
    }

    pub async fn run(&self) {
        if self.period.is_zero() {
            error!("cache janitor needs a non-zero period, not started");
            return;
        }
        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(period = ?self.period, "cache janitor started");

        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    info!("cache janitor shutting down...");
                    break;
                }
                _ = ticker.tick() => self.flush_once(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::{SigningSecret, UserId};

    fn janitor(period: Duration) -> (Arc<SecretCache>, CancellationToken, JoinHandle<()>) {
        let cache = Arc::new(SecretCache::new());
        let cancel = CancellationToken::new();
        let handle = CacheJanitor::new(cache.clone(), period, cancel.clone()).spawn();
        (cache, cancel, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn flushes_once_per_period() {
        let (cache, cancel, handle) = janitor(Duration::from_secs(60));
        let user = UserId::from("u1");
        cache.put(user.clone(), SigningSecret::from("s3cr3t"));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(cache.get(&user).is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(cache.get(&user).is_none());

        cache.put(user.clone(), SigningSecret::from("again"));
        tokio::time::sleep(Duration::from_secs(58)).await;
        assert!(cache.get(&user).is_some());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(cache.is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_exits_without_panicking() {
        let (cache, _cancel, handle) = janitor(Duration::ZERO);
        cache.put(UserId::from("u1"), SigningSecret::from("s3cr3t"));

        handle.await.unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_cancel() {
        let (cache, cancel, handle) = janitor(Duration::from_secs(60));
        cancel.cancel();
        handle.await.unwrap();

        cache.put(UserId::from("u1"), SigningSecret::from("s3cr3t"));
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(cache.len(), 1);
    }
}
