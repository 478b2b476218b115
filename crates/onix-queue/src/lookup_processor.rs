//! `DefaultLookupProcessor`: resolves a `LOOKUP` task's matching subscriber
//! set via `RegistryClient::lookup`, signs the original body once as the
//! gateway, shuffles the match order, then re-submits one `PROXY` task per
//! match onto the owning queue — capped at `max_proxy_tasks` when set
//! (§4.L).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use onix_api::ports::RegistryClient;
use onix_auth::AuthGen;
use onix_types::subscriber::Role;
use onix_types::subscription::{Subscription, SubscriptionFilter};
use onix_types::task::AsyncTask;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::QueueError;
use crate::queue::{ChannelTaskQueue, LookupProcessor};

const GATEWAY_AUTH_HEADER: &str = "X-Gateway-Authorization";

/// Injectable so tests can pin the fan-out order instead of depending on
/// `OsRng`.
pub trait FanoutShuffle: Send + Sync {
    fn shuffle(&self, items: &mut [Subscription]);
}

pub struct OsShuffle;

impl FanoutShuffle for OsShuffle {
    fn shuffle(&self, items: &mut [Subscription]) {
        items.shuffle(&mut rand::rngs::OsRng);
    }
}

/// Deterministic shuffle seeded for reproducible tests.
pub struct SeededShuffle(Mutex<StdRng>);

impl SeededShuffle {
    pub fn new(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }
}

impl FanoutShuffle for SeededShuffle {
    fn shuffle(&self, items: &mut [Subscription]) {
        items.shuffle(&mut *self.0.lock().expect("seeded shuffle rng poisoned"));
    }
}

pub struct DefaultLookupProcessor {
    registry_client: Arc<dyn RegistryClient>,
    auth_gen: Arc<AuthGen>,
    gateway_subscriber_id: String,
    queue: Arc<ChannelTaskQueue>,
    shuffle: Arc<dyn FanoutShuffle>,
    /// `0` means unbounded.
    max_proxy_tasks: usize,
}

impl DefaultLookupProcessor {
    pub fn new(
        registry_client: Arc<dyn RegistryClient>,
        auth_gen: Arc<AuthGen>,
        gateway_subscriber_id: impl Into<String>,
        queue: Arc<ChannelTaskQueue>,
        shuffle: Arc<dyn FanoutShuffle>,
        max_proxy_tasks: usize,
    ) -> Self {
        Self {
            registry_client,
            auth_gen,
            gateway_subscriber_id: gateway_subscriber_id.into(),
            queue,
            shuffle,
            max_proxy_tasks,
        }
    }
}

#[async_trait]
impl LookupProcessor for DefaultLookupProcessor {
    async fn process(&self, task: AsyncTask) -> Result<(), QueueError> {
        let filter = SubscriptionFilter {
            subscriber_id: task.context.bpp_id.clone(),
            domain: Some(task.context.domain.clone()),
            role: Some(Role::Bpp),
            location: task.context.location.clone(),
        };

        let mut matches = self.registry_client.lookup(&filter).await?;
        if matches.is_empty() {
            return Ok(());
        }

        let body = serde_json::to_vec(&task.payload)
            .map_err(|e| QueueError::BadRequest(format!("lookup task payload is not serializable: {e}")))?;
        let gateway_auth = self.auth_gen.auth_header(&body, &self.gateway_subscriber_id).await?;

        let mut headers = task.headers.clone();
        headers.insert(GATEWAY_AUTH_HEADER.to_string(), gateway_auth);

        self.shuffle.shuffle(&mut matches);

        let mut first_err = None;
        let mut submitted = 0usize;
        for matched in matches {
            if matched.url.is_empty() {
                continue;
            }
            if self.max_proxy_tasks > 0 && submitted >= self.max_proxy_tasks {
                break;
            }

            let mut context = task.context.clone();
            context.bpp_id = Some(matched.subscriber_id.clone());
            context.bpp_uri = Some(matched.url.clone());

            match self.queue.queue_txn(context, task.payload.clone(), headers.clone()).await {
                Ok(()) => submitted += 1,
                Err(e) => {
                    tracing::warn!(subscriber_id = %matched.subscriber_id, error = %e, "failed to enqueue proxy task for matched subscriber");
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use onix_api::ports::KeyManager;
    use onix_testing::ScriptedRegistryClient;
    use onix_types::subscriber::Role;
    use onix_types::subscription::{Subscription, SubscriptionStatus};
    use onix_types::task::BecknContext;
    use time::OffsetDateTime;

    use super::*;
    use crate::queue::ProxyProcessor;

    fn ctx() -> BecknContext {
        BecknContext {
            domain: "ONDC:RET10".into(),
            action: "search".into(),
            message_id: "m1".into(),
            transaction_id: None,
            bap_id: "bap.example".into(),
            bap_uri: "https://bap.example".into(),
            bpp_id: None,
            bpp_uri: None,
            location: None,
        }
    }

    fn subscription(subscriber_id: &str, url: &str) -> Subscription {
        let now = OffsetDateTime::now_utc();
        Subscription::new(
            subscriber_id,
            "ONDC:RET10",
            Role::Bpp,
            format!("{subscriber_id}|key1"),
            "sign-pub",
            "encr-pub",
            url,
            None,
            now,
            now + time::Duration::days(365),
            SubscriptionStatus::Subscribed,
            "nonce",
            now,
        )
        .unwrap()
    }

    struct RecordingProxy {
        urls: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProxyProcessor for RecordingProxy {
        async fn process(&self, task: AsyncTask) -> Result<(), QueueError> {
            self.urls.lock().unwrap().push(task.target_url.unwrap_or_default());
            Ok(())
        }
    }

    async fn gateway_auth_gen() -> Arc<AuthGen> {
        let keys = Arc::new(onix_testing::InMemoryKeyManager::new());
        keys.generate_keyset("gateway.onix").await.unwrap();
        let signer = Arc::new(onix_testing::FakeSigner::new(keys.clone()));
        Arc::new(AuthGen::new(keys, signer))
    }

    #[tokio::test]
    async fn empty_matches_is_a_noop_success() {
        let client = Arc::new(ScriptedRegistryClient::new().with_lookup_results(Vec::new()));

        let proxy = Arc::new(RecordingProxy {
            urls: std::sync::Mutex::new(Vec::new()),
        });
        let queue = ChannelTaskQueue::new(1, 8, proxy.clone());
        queue.start();

        let processor = DefaultLookupProcessor::new(
            client,
            gateway_auth_gen().await,
            "gateway.onix".into(),
            queue.clone(),
            Arc::new(SeededShuffle::new(1)),
            0,
        );

        let task = AsyncTask::lookup("t1".into(), ctx(), serde_json::json!({}), HashMap::new());
        processor.process(task).await.unwrap();
        queue.shutdown().await;
        assert!(proxy.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fans_out_one_proxy_task_per_match_capped_by_max_proxy_tasks() {
        let client = Arc::new(ScriptedRegistryClient::new().with_lookup_results(vec![
            subscription("bpp-1", "https://bpp-1.example"),
            subscription("bpp-2", "https://bpp-2.example"),
            subscription("bpp-3", "https://bpp-3.example"),
        ]));

        let proxy = Arc::new(RecordingProxy {
            urls: std::sync::Mutex::new(Vec::new()),
        });
        let queue = ChannelTaskQueue::new(2, 8, proxy.clone());
        queue.start();

        let processor = DefaultLookupProcessor::new(
            client,
            gateway_auth_gen().await,
            "gateway.onix".into(),
            queue.clone(),
            Arc::new(SeededShuffle::new(7)),
            2,
        );

        let task = AsyncTask::lookup("t2".into(), ctx(), serde_json::json!({}), HashMap::new());
        processor.process(task).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        queue.shutdown().await;
        assert_eq!(proxy.urls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn matches_with_empty_url_are_skipped() {
        let client = Arc::new(ScriptedRegistryClient::new().with_lookup_results(vec![subscription("bpp-1", "")]));

        let proxy = Arc::new(RecordingProxy {
            urls: std::sync::Mutex::new(Vec::new()),
        });
        let queue = ChannelTaskQueue::new(1, 8, proxy.clone());
        queue.start();

        let processor = DefaultLookupProcessor::new(
            client,
            gateway_auth_gen().await,
            "gateway.onix".into(),
            queue.clone(),
            Arc::new(SeededShuffle::new(3)),
            0,
        );

        let task = AsyncTask::lookup("t3".into(), ctx(), serde_json::json!({}), HashMap::new());
        processor.process(task).await.unwrap();
        queue.shutdown().await;
        assert!(proxy.urls.lock().unwrap().is_empty());
    }
}
