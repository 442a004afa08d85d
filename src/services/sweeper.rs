use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::database::gateway::AccountGateway;
use crate::database::DatabaseError;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Downgrades accounts whose premium period has elapsed.
pub struct SubscriptionSweeper {
    accounts: Arc<dyn AccountGateway>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionSweeper {
    pub fn new(accounts: Arc<dyn AccountGateway>, clock: Arc<dyn Clock>) -> Self {
        Self { accounts, clock }
    }

    pub async fn run_once(&self) -> Result<u64, DatabaseError> {
        let now = self.clock.now();
        let expired = self.accounts.expire_premium(now).await?;
        if expired > 0 {
            info!(expired, "Expired subscriptions updated");
        } else {
            debug!("No expired subscriptions");
        }
        Ok(expired)
    }

    /// Run on a fixed interval until the returned handle is stopped. A failed
    /// run is logged and retried on the next tick.
    pub fn spawn(self, interval: Duration) -> SweeperHandle {
        let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel_rx.recv() => {
                        info!("subscription sweeper shutdown requested");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(err) = self.run_once().await {
                            warn!(error = %err, "subscription sweep failed");
                        }
                    }
                }
            }
        });

        SweeperHandle { cancel_tx, join }
    }
}

pub struct SweeperHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn stop(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.cancel_tx.send(());
        self.join.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::database::models::NewAccount;
    use chrono::{Duration as ChronoDuration, TimeZone};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    async fn premium_account(store: &MemoryStore, email: &str, expiry: DateTime<Utc>) {
        store
            .create_if_absent(NewAccount {
                email: email.to_string(),
                name: None,
                photo: None,
            })
            .await
            .unwrap();
        store
            .activate_premium(email, Some("monthly".to_string()), expiry)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn clears_only_elapsed_subscriptions() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::new());
        premium_account(&store, "past@x.com", now - ChronoDuration::minutes(1)).await;
        premium_account(&store, "edge@x.com", now).await;
        premium_account(&store, "future@x.com", now + ChronoDuration::days(3)).await;

        let sweeper = SubscriptionSweeper::new(store.clone(), Arc::new(FixedClock(now)));
        assert_eq!(sweeper.run_once().await.unwrap(), 2);

        let past = store.find_by_email("past@x.com").await.unwrap().unwrap();
        assert!(!past.is_premium);
        assert!(past.subscription_plan.is_none());
        assert!(past.premium_expiry.is_none());

        let future = store.find_by_email("future@x.com").await.unwrap().unwrap();
        assert!(future.is_premium);
        assert_eq!(future.subscription_plan.as_deref(), Some("monthly"));

        // Second pass has nothing left to do
        assert_eq!(sweeper.run_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn spawned_sweeper_runs_and_stops() {
        let store = Arc::new(MemoryStore::new());
        premium_account(&store, "past@x.com", Utc::now() - ChronoDuration::hours(1)).await;

        let handle = SubscriptionSweeper::new(store.clone(), Arc::new(SystemClock))
            .spawn(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(80)).await;
        handle.stop().await.unwrap();

        let account = store.find_by_email("past@x.com").await.unwrap().unwrap();
        assert!(!account.is_premium);
    }
}
