use std::collections::{BTreeMap, BTreeSet};

use crate::ids::Identifier;
use crate::payload::Payload;
use crate::requeue::RequeueLimit;

/// `enqueue` always succeeds once validation passes (§4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueAck {
    pub status: &'static str,
}

impl Default for EnqueueAck {
    fn default() -> Self {
        Self { status: "queued" }
    }
}

/// Result of `dequeue` (§4.3).
#[derive(Debug, Clone, PartialEq)]
pub enum DequeueOutcome {
    Success {
        queue_id: Identifier,
        job_id: Identifier,
        payload: Payload,
        requeues_remaining: RequeueLimit,
    },
    /// No queue of this type is currently eligible (empty ready heap, or
    /// the minimum-score queue isn't due yet).
    Empty,
}

/// Result of `finish` (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    Success,
    /// No such in-flight job; nothing was mutated.
    NotFound,
}

/// Result of `interval` (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalOutcome {
    Success,
    /// The `(queue_type, queue_id)` has no interval entry to update.
    NotFound,
}

/// Result of the admin `clear_queue` operation (§4.9 / §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The queue_id was a member of the ready heap and was removed (and,
    /// if `purge_all` was requested, fully purged).
    Cleared,
    /// The queue_id wasn't present in the ready heap; the job list key is
    /// still deleted unconditionally (mirrors `SharQ.clear_queue`).
    NothingQueued,
}

/// Minute-bucketed counts, oldest first, covering the trailing 10 minutes.
pub type MinuteCounts = BTreeMap<i64, u64>;

/// `metrics()` with no arguments (§4.7).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlobalMetrics {
    pub queue_types: BTreeSet<Identifier>,
    pub enqueue_counts: BTreeMap<i64, u64>,
    pub dequeue_counts: BTreeMap<i64, u64>,
}

/// `metrics(queue_type)` (§4.7).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueTypeMetrics {
    pub queue_ids: BTreeSet<Identifier>,
}

/// `metrics(queue_type, queue_id)` (§4.7).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueMetrics {
    pub queue_length: u64,
    pub enqueue_counts: BTreeMap<i64, u64>,
    pub dequeue_counts: BTreeMap<i64, u64>,
}
