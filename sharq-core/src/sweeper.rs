//! The requeue sweeper (§4.6): a background driver that periodically
//! walks every active `queue_type`, restores lease-expired jobs that still
//! have requeue budget, and finishes the ones that don't.
//!
//! This mirrors the original SharQ daemon's `requeue` loop — a thin driver
//! around the same atomic `requeue` operation the HTTP surface could also
//! call on demand.

use std::time::Duration;

use sharq_model::SharqError;

use crate::clock::Clock;
use crate::engine::Engine;
use crate::store::Store;

/// Totals from one [`Sweeper::run_once`] pass, for logging/metrics at the
/// call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub queue_types_swept: u64,
    pub jobs_discarded: u64,
}

/// Drives [`Engine::active_queue_types`] + [`Engine::requeue_sweep`] on a
/// timer.
pub struct Sweeper<S, C> {
    engine: Engine<S, C>,
}

impl<S, C> Clone for Sweeper<S, C> {
    fn clone(&self) -> Self {
        Self { engine: self.engine.clone() }
    }
}

impl<S, C> std::fmt::Debug for Sweeper<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper").finish_non_exhaustive()
    }
}

impl<S, C> Sweeper<S, C>
where
    S: Store,
    C: Clock,
{
    pub fn new(engine: Engine<S, C>) -> Self {
        Self { engine }
    }

    /// Sweep every currently-active queue_type once.
    pub async fn run_once(&self) -> Result<SweepSummary, SharqError> {
        let queue_types = self.engine.active_queue_types().await?;
        let mut summary = SweepSummary::default();

        for queue_type in queue_types {
            let sweep = self.engine.requeue_sweep(&queue_type).await?;
            summary.queue_types_swept += 1;

            for job in sweep.discarded {
                tracing::info!(
                    queue_type = %queue_type,
                    queue_id = %job.queue_id,
                    job_id = %job.job_id,
                    "discarding job: requeue limit exhausted"
                );
                self.engine.finish(&queue_type, &job.queue_id, &job.job_id).await?;
                summary.jobs_discarded += 1;
            }
        }

        Ok(summary)
    }

    /// Run [`Self::run_once`] on a fixed cadence until the process exits.
    /// A failed pass is logged and does not stop the loop — the next tick
    /// gets another chance (§4.6: the sweeper is best-effort and
    /// self-healing, not a single point of failure for the queue).
    pub async fn run_forever(&self, interval: Duration) -> ! {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match self.run_once().await {
                Ok(summary) if summary.jobs_discarded > 0 || summary.queue_types_swept > 0 => {
                    tracing::debug!(?summary, "requeue sweep complete");
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "requeue sweep failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_util::FakeClock;
    use crate::store::memory::MemoryStore;
    use sharq_model::{DequeueOutcome, EngineConfig, PayloadValue};

    fn engine(now_ms: i64) -> Engine<MemoryStore, FakeClock> {
        Engine::new(MemoryStore::new(), FakeClock::new(now_ms), EngineConfig::default())
    }

    #[tokio::test]
    async fn expired_lease_with_budget_is_restored_to_the_ready_queue() {
        let engine = engine(0);
        let clock = engine.clock();
        let sweeper = Sweeper::new(engine.clone());

        let payload = PayloadValue::from("x");
        engine.enqueue("sms", "acme", "job-1", &payload, 1_000, Some(2)).await.unwrap();
        assert!(matches!(engine.dequeue("sms").await.unwrap(), DequeueOutcome::Success { .. }));

        clock.advance(engine.config().job_expire_interval_ms as i64);
        let summary = sweeper.run_once().await.unwrap();
        assert_eq!(summary.jobs_discarded, 0);

        // the job was pushed back onto the ready list and is dequeueable again
        assert!(matches!(engine.dequeue("sms").await.unwrap(), DequeueOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn sweep_discards_jobs_whose_requeue_budget_is_exhausted() {
        let engine = engine(0);
        let clock = engine.clock();
        let sweeper = Sweeper::new(engine.clone());

        let payload = PayloadValue::from("x");
        engine.enqueue("sms", "acme", "job-1", &payload, 1_000, Some(0)).await.unwrap();
        assert!(matches!(engine.dequeue("sms").await.unwrap(), DequeueOutcome::Success { .. }));

        clock.advance(engine.config().job_expire_interval_ms as i64);
        let summary = sweeper.run_once().await.unwrap();
        assert_eq!(summary.jobs_discarded, 1);

        assert_eq!(
            engine.finish("sms", "acme", "job-1").await.unwrap(),
            sharq_model::FinishOutcome::NotFound,
            "sweeper already finished the discarded job"
        );
    }

    #[tokio::test]
    async fn run_once_only_calls_finish_for_jobs_the_sweep_discarded() {
        use crate::store::{FinishArgs, MockStore, RequeueSweep, RequeuedJobRef};

        let mut store = MockStore::new();
        store.expect_active_queue_types().times(1).returning(|| Ok(vec!["sms".to_string()]));
        store.expect_requeue().times(1).returning(|_, _| {
            Ok(RequeueSweep {
                discarded: vec![RequeuedJobRef { queue_id: "acme".to_string(), job_id: "job-1".to_string() }],
            })
        });
        store
            .expect_finish()
            .times(1)
            .withf(|args: &FinishArgs<'_>| {
                args.queue_type == "sms" && args.queue_id == "acme" && args.job_id == "job-1"
            })
            .returning(|_| Ok(true));

        let engine = Engine::new(store, FakeClock::new(0), EngineConfig::default());
        let sweeper = Sweeper::new(engine);

        let summary = sweeper.run_once().await.unwrap();
        assert_eq!(summary.queue_types_swept, 1);
        assert_eq!(summary.jobs_discarded, 1);
    }
}
