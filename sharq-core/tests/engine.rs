//! End-to-end scenarios exercising [`sharq_core::Engine`] against the
//! in-memory store fake, without any Redis dependency.

use anyhow::Result;
use sharq_core::clock::test_util::FakeClock;
use sharq_core::store::memory::MemoryStore;
use sharq_core::{Engine, Sweeper};
use sharq_model::{DequeueOutcome, EngineConfig, FinishOutcome, PayloadValue};

fn engine(now_ms: i64) -> Engine<MemoryStore, FakeClock> {
    Engine::new(MemoryStore::new(), FakeClock::new(now_ms), EngineConfig::default())
}

#[tokio::test]
async fn basic_fifo_within_a_single_queue() -> Result<()> {
    let engine = engine(0);
    let payload = PayloadValue::from("a");
    engine.enqueue("sms", "acme", "job-1", &payload, 1, None).await?;
    engine.enqueue("sms", "acme", "job-2", &payload, 1, None).await?;
    engine.enqueue("sms", "acme", "job-3", &payload, 1, None).await?;

    for job in ["job-1", "job-2", "job-3"] {
        engine.clock().advance(1);
        match engine.dequeue("sms").await? {
            DequeueOutcome::Success { job_id, .. } => assert_eq!(job_id.as_str(), job),
            DequeueOutcome::Empty => anyhow::bail!("expected {job}"),
        }
    }
    Ok(())
}

#[tokio::test]
async fn rate_limit_is_scoped_per_queue_id_not_per_queue_type() -> Result<()> {
    let engine = engine(0);
    let payload = PayloadValue::from("a");
    engine.enqueue("sms", "acme", "job-1", &payload, 10_000, None).await?;
    engine.enqueue("sms", "other", "job-2", &payload, 10_000, None).await?;

    // both queue_ids are eligible immediately even though they share a queue_type
    let first = engine.dequeue("sms").await?;
    let second = engine.dequeue("sms").await?;
    let queue_ids: Vec<String> = [first, second]
        .into_iter()
        .map(|outcome| match outcome {
            DequeueOutcome::Success { queue_id, .. } => Ok(queue_id.into_inner()),
            DequeueOutcome::Empty => anyhow::bail!("expected a job"),
        })
        .collect::<Result<_>>()?;
    assert!(queue_ids.contains(&"acme".to_string()));
    assert!(queue_ids.contains(&"other".to_string()));

    // a third dequeue finds nothing: both queues are now rate-limited
    assert_eq!(engine.dequeue("sms").await?, DequeueOutcome::Empty);
    Ok(())
}

#[tokio::test]
async fn requeue_with_a_bounded_limit_eventually_discards_the_job() -> Result<()> {
    let engine = engine(0);
    let sweeper = Sweeper::new(engine.clone());
    let payload = PayloadValue::from("a");
    engine.enqueue("sms", "acme", "job-1", &payload, 100, Some(1)).await?;

    // attempt 1: dequeue, let the lease expire, sweeper restores it (1 requeue left -> 0)
    assert!(matches!(engine.dequeue("sms").await?, DequeueOutcome::Success { .. }));
    engine.clock().advance(engine.config().job_expire_interval_ms as i64);
    let summary = sweeper.run_once().await?;
    assert_eq!(summary.jobs_discarded, 0);

    // attempt 2: dequeue again, let the lease expire again, now it's exhausted
    engine.clock().advance(200);
    assert!(matches!(engine.dequeue("sms").await?, DequeueOutcome::Success { .. }));
    engine.clock().advance(engine.config().job_expire_interval_ms as i64);
    let summary = sweeper.run_once().await?;
    assert_eq!(summary.jobs_discarded, 1);

    assert_eq!(
        engine.finish("sms", "acme", "job-1").await?,
        FinishOutcome::NotFound,
        "the sweeper already finished the discarded job"
    );
    Ok(())
}

#[tokio::test]
async fn unbounded_requeue_limit_survives_many_sweeps() -> Result<()> {
    let engine = engine(0);
    let sweeper = Sweeper::new(engine.clone());
    let payload = PayloadValue::from("a");
    engine.enqueue("sms", "acme", "job-1", &payload, 100, None).await?;

    for _ in 0..25 {
        assert!(matches!(engine.dequeue("sms").await?, DequeueOutcome::Success { .. }));
        engine.clock().advance(engine.config().job_expire_interval_ms as i64);
        let summary = sweeper.run_once().await?;
        assert_eq!(summary.jobs_discarded, 0, "an unbounded job is never discarded");
        engine.clock().advance(200);
    }
    Ok(())
}

#[tokio::test]
async fn finish_is_idempotent_by_absence() -> Result<()> {
    let engine = engine(0);
    let payload = PayloadValue::from("a");
    engine.enqueue("sms", "acme", "job-1", &payload, 1, None).await?;
    engine.clock().advance(1);
    assert!(matches!(engine.dequeue("sms").await?, DequeueOutcome::Success { .. }));

    assert_eq!(engine.finish("sms", "acme", "job-1").await?, FinishOutcome::Success);
    assert_eq!(engine.finish("sms", "acme", "job-1").await?, FinishOutcome::NotFound);
    Ok(())
}

#[tokio::test]
async fn metrics_report_queue_types_queue_ids_and_windowed_counters() -> Result<()> {
    let engine = engine(0);
    let payload = PayloadValue::from("a");
    engine.enqueue("sms", "acme", "job-1", &payload, 1, None).await?;
    engine.clock().advance(1);
    assert!(matches!(engine.dequeue("sms").await?, DequeueOutcome::Success { .. }));

    let global = engine.metrics_global().await?;
    assert!(global.queue_types.iter().any(|qt| qt.as_str() == "sms"));
    assert_eq!(global.enqueue_counts.values().sum::<u64>(), 1);
    assert_eq!(global.dequeue_counts.values().sum::<u64>(), 1);

    let by_type = engine.metrics_queue_type("sms").await?;
    assert!(by_type.queue_ids.iter().any(|qid| qid.as_str() == "acme"));

    let by_queue = engine.metrics_queue("sms", "acme").await?;
    assert_eq!(by_queue.queue_length, 0, "the only job was dequeued");
    Ok(())
}

#[tokio::test]
async fn health_check_succeeds_against_the_memory_store() -> Result<()> {
    let engine = engine(0);
    engine.health().await?;
    Ok(())
}

#[tokio::test]
async fn clear_queue_removes_an_untouched_queue_id() -> Result<()> {
    let engine = engine(0);
    let payload = PayloadValue::from("a");
    engine.enqueue("sms", "acme", "job-1", &payload, 1_000, None).await?;

    let outcome = engine.clear_queue("sms", "acme", true).await?;
    assert_eq!(outcome, sharq_model::ClearOutcome::Cleared);
    assert_eq!(engine.dequeue("sms").await?, DequeueOutcome::Empty);
    Ok(())
}

#[tokio::test]
async fn run_once_is_safe_to_call_repeatedly_on_an_idle_queue() -> Result<()> {
    let engine = engine(0);
    let sweeper = Sweeper::new(engine);
    for _ in 0..3 {
        let summary = sweeper.run_once().await?;
        assert_eq!(summary, sharq_core::SweepSummary::default());
    }
    Ok(())
}
