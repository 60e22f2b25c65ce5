//! The transactional key–value store abstraction (§2 item 3, §3).
//!
//! `Engine` is generic over [`Store`]; [`sharq_redis::RedisStore`] is the
//! reference implementation (Redis + server-side Lua scripts), and
//! [`memory::MemoryStore`] is an in-process fake used by tests so the
//! engine's logic can be exercised without a running Redis instance.
//!
//! Each method here corresponds to exactly one of the five atomic engine
//! operations (plus metrics/health/admin) — the trait does not expose raw
//! list/hash/sorted-set primitives, because composing those into one
//! operation is only atomic if a single backend call does it server-side
//! (§5, §9: "ship scripts to the backend").

use async_trait::async_trait;
use sharq_model::{Payload, RequeueLimit, StoreError};

/// Arguments for [`Store::enqueue`].
#[derive(Debug, Clone)]
pub struct EnqueueArgs<'a> {
    pub queue_type: &'a str,
    pub queue_id: &'a str,
    pub job_id: &'a str,
    pub payload: &'a Payload,
    pub interval_ms: u64,
    pub requeue_limit: RequeueLimit,
    pub now_ms: i64,
}

/// Successful result of [`Store::dequeue`].
#[derive(Debug, Clone)]
pub struct Dequeued {
    pub queue_id: String,
    pub job_id: String,
    pub payload: Payload,
    pub requeues_remaining: RequeueLimit,
}

/// Arguments for [`Store::dequeue`].
#[derive(Debug, Clone)]
pub struct DequeueArgs<'a> {
    pub queue_type: &'a str,
    pub now_ms: i64,
    pub job_expire_interval_ms: u64,
}

/// Arguments for [`Store::finish`].
#[derive(Debug, Clone)]
pub struct FinishArgs<'a> {
    pub queue_type: &'a str,
    pub queue_id: &'a str,
    pub job_id: &'a str,
}

/// Arguments for [`Store::set_interval`].
#[derive(Debug, Clone)]
pub struct IntervalArgs<'a> {
    pub queue_type: &'a str,
    pub queue_id: &'a str,
    pub interval_ms: u64,
}

/// One job restored-or-discarded by a [`Store::requeue`] sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequeuedJobRef {
    pub queue_id: String,
    pub job_id: String,
}

/// Result of one [`Store::requeue`] sweep over a queue_type: jobs whose
/// retry budget is exhausted are reported back for the caller to `finish`
/// explicitly (§4.6 — discard stays outside the atomic step).
#[derive(Debug, Clone, Default)]
pub struct RequeueSweep {
    pub discarded: Vec<RequeuedJobRef>,
}

/// Minute→count pairs as returned by the backend, already restricted to the
/// trailing 10-minute window by the caller (§4.7).
#[derive(Debug, Clone, Default)]
pub struct CounterWindow {
    pub enqueue_counts: Vec<(i64, u64)>,
    pub dequeue_counts: Vec<(i64, u64)>,
}

/// Result of [`Store::metrics_queue`].
#[derive(Debug, Clone, Default)]
pub struct QueueMetricsRaw {
    pub queue_length: u64,
    pub counters: CounterWindow,
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Atomically apply §4.2's enqueue effect.
    async fn enqueue(&self, args: EnqueueArgs<'_>) -> Result<(), StoreError>;

    /// Atomically apply §4.3's dequeue effect. `Ok(None)` is the
    /// "nothing eligible" failure case — not a store error.
    async fn dequeue(&self, args: DequeueArgs<'_>) -> Result<Option<Dequeued>, StoreError>;

    /// Atomically apply §4.4's finish effect. `Ok(false)` means no
    /// such in-flight job was present.
    async fn finish(&self, args: FinishArgs<'_>) -> Result<bool, StoreError>;

    /// Atomically apply §4.5's interval-update effect. `Ok(false)`
    /// means the queue has no interval entry to update.
    async fn set_interval(&self, args: IntervalArgs<'_>) -> Result<bool, StoreError>;

    /// Snapshot of queue_types currently holding >=1 in-flight job; the
    /// sweeper driver loop reads this to know which queue_types to sweep.
    async fn active_queue_types(&self) -> Result<Vec<String>, StoreError>;

    /// Atomically requeue or mark-for-discard every lease-expired job in
    /// one queue_type (§4.6).
    async fn requeue(
        &self,
        queue_type: &str,
        now_ms: i64,
    ) -> Result<RequeueSweep, StoreError>;

    /// Global queue_type union + 10-minute counters (§4.7, no args).
    async fn metrics_global(&self, now_ms: i64) -> Result<(Vec<String>, CounterWindow), StoreError>;

    /// Queue_ids for one queue_type (§4.7, queue_type only).
    async fn metrics_queue_type(&self, queue_type: &str) -> Result<Vec<String>, StoreError>;

    /// Queue length + counters for one queue (§4.7, queue_type + queue_id).
    async fn metrics_queue(
        &self,
        queue_type: &str,
        queue_id: &str,
        now_ms: i64,
    ) -> Result<QueueMetricsRaw, StoreError>;

    /// Write a health-probe sentinel key (§6).
    async fn health(&self) -> Result<(), StoreError>;

    /// Admin queue-clear (§4.9/§6). `Ok(true)` means the queue_id was
    /// present in the ready heap and was removed.
    async fn clear_queue(
        &self,
        queue_type: &str,
        queue_id: &str,
        purge_all: bool,
    ) -> Result<bool, StoreError>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
