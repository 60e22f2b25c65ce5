//! The five atomic operations (§4.2-§4.6), plus metrics, health, and
//! admin queue-clear, implemented over the generic [`Store`] abstraction.
//!
//! `Engine` itself holds no mutable state — it validates, stamps a
//! timestamp from its [`Clock`], delegates to the store, and translates the
//! store's raw result into the typed outcomes from `sharq_model::responses`.
//! All the actual atomicity lives in the `Store` implementation (§5).

use std::collections::BTreeMap;
use std::sync::Arc;

use sharq_model::{
    ClearOutcome, DequeueOutcome, EnqueueAck, EngineConfig, FinishOutcome, GlobalMetrics,
    Identifier, IntervalOutcome, PayloadValue, QueueMetrics, QueueTypeMetrics, SharqError,
};

use crate::clock::Clock;
use crate::codec;
use crate::store::{DequeueArgs, EnqueueArgs, FinishArgs, IntervalArgs, Store};
use crate::validation;

/// The SharQ queueing engine, generic over its backend [`Store`] and its
/// [`Clock`] (a real clock in production, a [`crate::clock::test_util::FakeClock`] in tests).
///
/// `Clone` and `Debug` are implemented by hand below: both only need
/// `Arc<S>`/`Arc<C>` to be cloned/printed, not `S`/`C` themselves, so they
/// don't require the derive macro's (overly strict) `S: Clone + Debug`.
pub struct Engine<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
    config: EngineConfig,
}

impl<S, C> Clone for Engine<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<S, C> std::fmt::Debug for Engine<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<S, C> Engine<S, C>
where
    S: Store,
    C: Clock,
{
    pub fn new(store: S, clock: C, config: EngineConfig) -> Self {
        Self { store: Arc::new(store), clock: Arc::new(clock), config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A shared handle to this engine's clock, useful in tests that need to
    /// advance a [`crate::clock::test_util::FakeClock`] after construction.
    pub fn clock(&self) -> Arc<C> {
        Arc::clone(&self.clock)
    }

    /// §4.2: admit a job onto `(queue_type, queue_id)`'s queue.
    ///
    /// `requeue_limit` falls back to [`EngineConfig::default_job_requeue_limit`]
    /// when not supplied by the caller.
    pub async fn enqueue(
        &self,
        queue_type: &str,
        queue_id: &str,
        job_id: &str,
        payload: &PayloadValue,
        interval_ms: i64,
        requeue_limit: Option<i64>,
    ) -> Result<EnqueueAck, SharqError> {
        validation::identifier(queue_type)?;
        validation::identifier(queue_id)?;
        validation::identifier(job_id)?;
        let interval = validation::interval_ms(interval_ms)?;
        let requeue_limit = match requeue_limit {
            Some(value) => validation::requeue_limit(value)?,
            None => self.config.default_job_requeue_limit,
        };

        let encoded = codec::encode(payload);
        let now_ms = self.clock.now_ms();

        self.store
            .enqueue(EnqueueArgs {
                queue_type,
                queue_id,
                job_id,
                payload: &encoded,
                interval_ms: interval.get(),
                requeue_limit,
                now_ms,
            })
            .await?;

        tracing::debug!(queue_type, queue_id, job_id, "enqueued job");
        Ok(EnqueueAck::default())
    }

    /// §4.3: claim the next eligible job from `queue_type`, if any.
    pub async fn dequeue(&self, queue_type: &str) -> Result<DequeueOutcome, SharqError> {
        validation::identifier(queue_type)?;
        let now_ms = self.clock.now_ms();

        let dequeued = self
            .store
            .dequeue(DequeueArgs {
                queue_type,
                now_ms,
                job_expire_interval_ms: self.config.job_expire_interval_ms,
            })
            .await?;

        Ok(match dequeued {
            Some(job) => {
                tracing::debug!(queue_type, queue_id = %job.queue_id, job_id = %job.job_id, "dequeued job");
                DequeueOutcome::Success {
                    queue_id: parse_store_identifier(job.queue_id),
                    job_id: parse_store_identifier(job.job_id),
                    payload: job.payload,
                    requeues_remaining: job.requeues_remaining,
                }
            }
            None => DequeueOutcome::Empty,
        })
    }

    /// §4.4: mark `job_id` complete, releasing its in-flight lease.
    pub async fn finish(
        &self,
        queue_type: &str,
        queue_id: &str,
        job_id: &str,
    ) -> Result<FinishOutcome, SharqError> {
        validation::identifier(queue_type)?;
        validation::identifier(queue_id)?;
        validation::identifier(job_id)?;

        let found = self.store.finish(FinishArgs { queue_type, queue_id, job_id }).await?;
        if found {
            tracing::debug!(queue_type, queue_id, job_id, "finished job");
            Ok(FinishOutcome::Success)
        } else {
            Ok(FinishOutcome::NotFound)
        }
    }

    /// §4.5: update the rate-limit interval for an existing queue.
    pub async fn interval(
        &self,
        queue_type: &str,
        queue_id: &str,
        interval_ms: i64,
    ) -> Result<IntervalOutcome, SharqError> {
        validation::identifier(queue_type)?;
        validation::identifier(queue_id)?;
        let interval = validation::interval_ms(interval_ms)?;

        let updated = self
            .store
            .set_interval(IntervalArgs { queue_type, queue_id, interval_ms: interval.get() })
            .await?;

        Ok(if updated { IntervalOutcome::Success } else { IntervalOutcome::NotFound })
    }

    /// §4.9 / §6: admin queue-clear, used by the HTTP admin surface.
    pub async fn clear_queue(
        &self,
        queue_type: &str,
        queue_id: &str,
        purge_all: bool,
    ) -> Result<ClearOutcome, SharqError> {
        validation::identifier(queue_type)?;
        validation::identifier(queue_id)?;

        let cleared = self.store.clear_queue(queue_type, queue_id, purge_all).await?;
        Ok(if cleared { ClearOutcome::Cleared } else { ClearOutcome::NothingQueued })
    }

    /// §6: a cheap round-trip to the backend, used by readiness probes.
    pub async fn health(&self) -> Result<(), SharqError> {
        self.store.health().await?;
        Ok(())
    }

    /// §4.7: global queue_type listing + trailing-10-minute counters.
    pub async fn metrics_global(&self) -> Result<GlobalMetrics, SharqError> {
        let now_ms = self.clock.now_ms();
        let (queue_types, counters) = self.store.metrics_global(now_ms).await?;
        Ok(GlobalMetrics {
            queue_types: queue_types.into_iter().map(parse_store_identifier).collect(),
            enqueue_counts: to_counts(counters.enqueue_counts),
            dequeue_counts: to_counts(counters.dequeue_counts),
        })
    }

    /// §4.7: queue_id listing for one queue_type.
    pub async fn metrics_queue_type(&self, queue_type: &str) -> Result<QueueTypeMetrics, SharqError> {
        validation::identifier(queue_type)?;
        let queue_ids = self.store.metrics_queue_type(queue_type).await?;
        Ok(QueueTypeMetrics { queue_ids: queue_ids.into_iter().map(parse_store_identifier).collect() })
    }

    /// §4.7: queue length + counters for one queue.
    pub async fn metrics_queue(&self, queue_type: &str, queue_id: &str) -> Result<QueueMetrics, SharqError> {
        validation::identifier(queue_type)?;
        validation::identifier(queue_id)?;
        let now_ms = self.clock.now_ms();
        let raw = self.store.metrics_queue(queue_type, queue_id, now_ms).await?;
        Ok(QueueMetrics {
            queue_length: raw.queue_length,
            enqueue_counts: to_counts(raw.counters.enqueue_counts),
            dequeue_counts: to_counts(raw.counters.dequeue_counts),
        })
    }

    /// Used by [`crate::sweeper::Sweeper`]: the list of queue_types with at
    /// least one in-flight job, i.e. the set worth sweeping.
    pub(crate) async fn active_queue_types(&self) -> Result<Vec<String>, SharqError> {
        Ok(self.store.active_queue_types().await?)
    }

    /// Used by [`crate::sweeper::Sweeper`]: run one requeue sweep over
    /// `queue_type` at the current time.
    pub(crate) async fn requeue_sweep(
        &self,
        queue_type: &str,
    ) -> Result<crate::store::RequeueSweep, SharqError> {
        let now_ms = self.clock.now_ms();
        Ok(self.store.requeue(queue_type, now_ms).await?)
    }
}

fn parse_store_identifier(value: String) -> Identifier {
    Identifier::parse(value).expect("store returned a previously-validated identifier")
}

fn to_counts(pairs: Vec<(i64, u64)>) -> BTreeMap<i64, u64> {
    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_util::FakeClock;
    use crate::store::memory::MemoryStore;
    use sharq_model::RequeueLimit;

    fn engine(now_ms: i64) -> Engine<MemoryStore, FakeClock> {
        Engine::new(MemoryStore::new(), FakeClock::new(now_ms), EngineConfig::default())
    }

    #[tokio::test]
    async fn enqueue_then_dequeue_round_trips_the_payload() {
        let engine = engine(0);
        let payload = PayloadValue::from("hello");
        engine.enqueue("sms", "acme", "job-1", &payload, 1_000, None).await.unwrap();

        match engine.dequeue("sms").await.unwrap() {
            DequeueOutcome::Success { queue_id, job_id, payload: encoded, requeues_remaining } => {
                assert_eq!(queue_id.as_str(), "acme");
                assert_eq!(job_id.as_str(), "job-1");
                assert_eq!(codec::decode(&encoded).unwrap(), payload);
                assert_eq!(requeues_remaining, RequeueLimit::UNBOUNDED);
            }
            DequeueOutcome::Empty => panic!("expected a job"),
        }
    }

    #[tokio::test]
    async fn dequeue_on_empty_queue_type_is_empty() {
        let engine = engine(0);
        assert_eq!(engine.dequeue("sms").await.unwrap(), DequeueOutcome::Empty);
    }

    #[tokio::test]
    async fn finish_on_unknown_job_is_not_found() {
        let engine = engine(0);
        assert_eq!(
            engine.finish("sms", "acme", "ghost").await.unwrap(),
            FinishOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn rate_limit_blocks_second_dequeue_until_interval_elapses() {
        let engine = engine(0);
        let payload = PayloadValue::from("x");
        engine.enqueue("sms", "acme", "job-1", &payload, 5_000, None).await.unwrap();
        engine.enqueue("sms", "acme", "job-2", &payload, 5_000, None).await.unwrap();

        let first = engine.dequeue("sms").await.unwrap();
        assert!(matches!(first, DequeueOutcome::Success { .. }));
        assert_eq!(engine.dequeue("sms").await.unwrap(), DequeueOutcome::Empty);
    }

    #[tokio::test]
    async fn interval_on_unknown_queue_is_not_found() {
        let engine = engine(0);
        assert_eq!(
            engine.interval("sms", "acme", 1_000).await.unwrap(),
            IntervalOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn rejects_bad_identifier_before_touching_the_store() {
        let engine = engine(0);
        let err = engine
            .enqueue("sms", "bad id!", "job-1", &PayloadValue::Null, 1_000, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SharqError::BadArgument(_)));
    }
}
