//! An in-process [`Store`] fake used by `sharq-core`'s own tests and by
//! downstream crates under the `test-util` feature. It implements the
//! exact state-transition semantics of §4 directly over Rust
//! collections, guarded by one mutex per instance — "atomic" here because
//! the whole operation runs while the lock is held, the same guarantee
//! `sharq-redis::RedisStore` gets from a single Lua script.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use sharq_model::{Payload, RequeueLimit, StoreError};

use crate::clock::trailing_minute_buckets;
use super::{
    CounterWindow, DequeueArgs, Dequeued, EnqueueArgs, FinishArgs, IntervalArgs, QueueMetricsRaw,
    RequeueSweep, RequeuedJobRef, Store,
};

type QueueRef = (String, String);
type JobRef = (String, String, String);

#[derive(Default)]
struct Inner {
    lists: HashMap<QueueRef, VecDeque<String>>,
    payload: HashMap<JobRef, Vec<u8>>,
    interval_ms: HashMap<QueueRef, u64>,
    requeues_remaining: HashMap<QueueRef, HashMap<String, RequeueLimit>>,
    /// per queue_type: queue_id -> next-eligible score
    ready: HashMap<String, BTreeMap<String, i64>>,
    /// per queue_type: "queue_id:job_id" -> lease-expiry score
    active: HashMap<String, BTreeMap<String, i64>>,
    ready_queue_types: HashSet<String>,
    active_queue_types: HashSet<String>,
    /// (queue_type, queue_id) -> lease expiry epoch ms
    lease_expiry: HashMap<QueueRef, i64>,
    enqueue_counters: HashMap<i64, u64>,
    dequeue_counters: HashMap<i64, u64>,
    queue_enqueue_counters: HashMap<QueueRef, HashMap<i64, u64>>,
    queue_dequeue_counters: HashMap<QueueRef, HashMap<i64, u64>>,
}

/// In-memory [`Store`] used for tests. Never use this in production — it
/// has no persistence and no cross-process visibility.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn window(counters: &HashMap<i64, u64>, now_ms: i64) -> Vec<(i64, u64)> {
    trailing_minute_buckets(now_ms)
        .into_iter()
        .map(|bucket| (bucket, counters.get(&bucket).copied().unwrap_or(0)))
        .collect()
}

fn pick_min_score(ready: &BTreeMap<String, i64>) -> Option<(String, i64)> {
    ready
        .iter()
        .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(qid, score)| (qid.clone(), *score))
}

#[async_trait]
impl Store for MemoryStore {
    async fn enqueue(&self, args: EnqueueArgs<'_>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let qt = args.queue_type.to_string();
        let qid = args.queue_id.to_string();
        let jid = args.job_id.to_string();

        let ttl_ms = inner
            .lease_expiry
            .get(&(qt.clone(), qid.clone()))
            .copied()
            .map(|expiry| (expiry - args.now_ms).max(0))
            .unwrap_or(0);
        let score = args.now_ms + ttl_ms;

        let in_ready = inner.ready.get(&qt).is_some_and(|m| m.contains_key(&qid));
        let in_active = inner
            .active
            .get(&qt)
            .is_some_and(|m| m.keys().any(|member| member.starts_with(&format!("{qid}:"))));
        if !in_ready && !in_active {
            inner.ready.entry(qt.clone()).or_default().insert(qid.clone(), score);
        }

        inner
            .lists
            .entry((qt.clone(), qid.clone()))
            .or_default()
            .push_back(jid.clone());
        inner
            .payload
            .insert((qt.clone(), qid.clone(), jid.clone()), args.payload.as_bytes().to_vec());
        inner.interval_ms.insert((qt.clone(), qid.clone()), args.interval_ms);
        inner
            .requeues_remaining
            .entry((qt.clone(), qid.clone()))
            .or_default()
            .insert(jid, args.requeue_limit);
        inner.ready_queue_types.insert(qt.clone());

        let bucket = trailing_minute_buckets(args.now_ms)[9];
        *inner.enqueue_counters.entry(bucket).or_insert(0) += 1;
        *inner
            .queue_enqueue_counters
            .entry((qt, qid))
            .or_default()
            .entry(bucket)
            .or_insert(0) += 1;

        Ok(())
    }

    async fn dequeue(&self, args: DequeueArgs<'_>) -> Result<Option<Dequeued>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let qt = args.queue_type.to_string();

        let Some(ready) = inner.ready.get(&qt) else {
            inner.ready_queue_types.remove(&qt);
            return Ok(None);
        };
        if ready.is_empty() {
            inner.ready_queue_types.remove(&qt);
            return Ok(None);
        }
        let (qid, score) = pick_min_score(ready).expect("non-empty checked above");
        if score > args.now_ms {
            return Ok(None);
        }

        let ready_map = inner.ready.get_mut(&qt).unwrap();
        ready_map.remove(&qid);
        if ready_map.is_empty() {
            inner.ready_queue_types.remove(&qt);
        }

        let list = inner.lists.get_mut(&(qt.clone(), qid.clone())).expect("ready implies a job list");
        let job_id = list.pop_front().expect("ready implies a non-empty list");
        let list_now_empty = list.is_empty();

        let payload = inner
            .payload
            .get(&(qt.clone(), qid.clone(), job_id.clone()))
            .cloned()
            .unwrap_or_default();
        let requeues_remaining = inner
            .requeues_remaining
            .get(&(qt.clone(), qid.clone()))
            .and_then(|m| m.get(&job_id))
            .copied()
            .unwrap_or(RequeueLimit::UNBOUNDED);

        let interval_ms = inner
            .interval_ms
            .get(&(qt.clone(), qid.clone()))
            .copied()
            .unwrap_or(args.job_expire_interval_ms);
        inner
            .lease_expiry
            .insert((qt.clone(), qid.clone()), args.now_ms + interval_ms as i64);

        inner
            .active
            .entry(qt.clone())
            .or_default()
            .insert(format!("{qid}:{job_id}"), args.now_ms + args.job_expire_interval_ms as i64);
        inner.active_queue_types.insert(qt.clone());

        if !list_now_empty {
            inner
                .ready
                .entry(qt.clone())
                .or_default()
                .insert(qid.clone(), args.now_ms + interval_ms as i64);
            inner.ready_queue_types.insert(qt.clone());
        }

        let bucket = trailing_minute_buckets(args.now_ms)[9];
        *inner.dequeue_counters.entry(bucket).or_insert(0) += 1;
        *inner
            .queue_dequeue_counters
            .entry((qt, qid.clone()))
            .or_default()
            .entry(bucket)
            .or_insert(0) += 1;

        Ok(Some(Dequeued {
            queue_id: qid,
            job_id,
            payload: Payload::from_encoded(payload),
            requeues_remaining,
        }))
    }

    async fn finish(&self, args: FinishArgs<'_>) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let qt = args.queue_type.to_string();
        let qid = args.queue_id.to_string();
        let jid = args.job_id.to_string();
        let member = format!("{qid}:{jid}");

        let removed = inner
            .active
            .get_mut(&qt)
            .map(|m| m.remove(&member).is_some())
            .unwrap_or(false);
        if !removed {
            return Ok(false);
        }

        inner.payload.remove(&(qt.clone(), qid.clone(), jid.clone()));
        if let Some(remaining) = inner.requeues_remaining.get_mut(&(qt.clone(), qid.clone())) {
            remaining.remove(&jid);
            if remaining.is_empty() {
                inner.requeues_remaining.remove(&(qt.clone(), qid.clone()));
            }
        }

        let still_active = inner
            .active
            .get(&qt)
            .is_some_and(|m| m.keys().any(|k| k.starts_with(&format!("{qid}:"))));
        let list_empty = inner
            .lists
            .get(&(qt.clone(), qid.clone()))
            .is_none_or(|l| l.is_empty());
        if !still_active && list_empty {
            inner.interval_ms.remove(&(qt.clone(), qid.clone()));
        }

        if inner.active.get(&qt).is_some_and(|m| m.is_empty()) {
            inner.active_queue_types.remove(&qt);
        }

        Ok(true)
    }

    async fn set_interval(&self, args: IntervalArgs<'_>) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (args.queue_type.to_string(), args.queue_id.to_string());
        if let Some(existing) = inner.interval_ms.get_mut(&key) {
            *existing = args.interval_ms;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn active_queue_types(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.active_queue_types.iter().cloned().collect())
    }

    async fn requeue(&self, queue_type: &str, now_ms: i64) -> Result<RequeueSweep, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let qt = queue_type.to_string();

        let expired: Vec<(String, String)> = inner
            .active
            .get(&qt)
            .map(|members| {
                members
                    .iter()
                    .filter(|(_, score)| **score <= now_ms)
                    .map(|(member, _)| {
                        let (qid, jid) = member.split_once(':').expect("member is qid:jid");
                        (qid.to_string(), jid.to_string())
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut sweep = RequeueSweep::default();
        for (qid, jid) in expired {
            let remaining = inner
                .requeues_remaining
                .get(&(qt.clone(), qid.clone()))
                .and_then(|m| m.get(&jid))
                .copied()
                .unwrap_or(RequeueLimit::UNBOUNDED);

            if remaining.is_exhausted() {
                sweep.discarded.push(RequeuedJobRef { queue_id: qid, job_id: jid });
                continue;
            }

            if let Some(next) = remaining.after_requeue() {
                inner
                    .requeues_remaining
                    .entry((qt.clone(), qid.clone()))
                    .or_default()
                    .insert(jid.clone(), next);
            }

            inner
                .lists
                .entry((qt.clone(), qid.clone()))
                .or_default()
                .push_front(jid.clone());

            if let Some(active) = inner.active.get_mut(&qt) {
                active.remove(&format!("{qid}:{jid}"));
            }

            let ready = inner.ready.entry(qt.clone()).or_default();
            let score = ready.get(&qid).copied().map(|s| s.min(now_ms)).unwrap_or(now_ms);
            ready.insert(qid, score);
            inner.ready_queue_types.insert(qt.clone());
        }

        if inner.active.get(&qt).is_some_and(|m| m.is_empty()) {
            inner.active_queue_types.remove(&qt);
        }

        Ok(sweep)
    }

    async fn metrics_global(&self, now_ms: i64) -> Result<(Vec<String>, CounterWindow), StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut queue_types: HashSet<String> = inner.ready_queue_types.clone();
        queue_types.extend(inner.active_queue_types.iter().cloned());
        Ok((
            queue_types.into_iter().collect(),
            CounterWindow {
                enqueue_counts: window(&inner.enqueue_counters, now_ms),
                dequeue_counts: window(&inner.dequeue_counters, now_ms),
            },
        ))
    }

    async fn metrics_queue_type(&self, queue_type: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut ids: HashSet<String> = inner
            .ready
            .get(queue_type)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        if let Some(active) = inner.active.get(queue_type) {
            for member in active.keys() {
                if let Some((qid, _)) = member.split_once(':') {
                    ids.insert(qid.to_string());
                }
            }
        }
        Ok(ids.into_iter().collect())
    }

    async fn metrics_queue(
        &self,
        queue_type: &str,
        queue_id: &str,
        now_ms: i64,
    ) -> Result<QueueMetricsRaw, StoreError> {
        let inner = self.inner.lock().unwrap();
        let key = (queue_type.to_string(), queue_id.to_string());
        let queue_length = inner.lists.get(&key).map(|l| l.len() as u64).unwrap_or(0);
        let enqueue_counts = inner
            .queue_enqueue_counters
            .get(&key)
            .map(|c| window(c, now_ms))
            .unwrap_or_else(|| window(&HashMap::new(), now_ms));
        let dequeue_counts = inner
            .queue_dequeue_counters
            .get(&key)
            .map(|c| window(c, now_ms))
            .unwrap_or_else(|| window(&HashMap::new(), now_ms));
        Ok(QueueMetricsRaw {
            queue_length,
            counters: CounterWindow { enqueue_counts, dequeue_counts },
        })
    }

    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn clear_queue(
        &self,
        queue_type: &str,
        queue_id: &str,
        purge_all: bool,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let qt = queue_type.to_string();
        let qid = queue_id.to_string();

        let removed = inner
            .ready
            .get_mut(&qt)
            .map(|m| m.remove(&qid).is_some())
            .unwrap_or(false);
        if removed && inner.ready.get(&qt).is_some_and(|m| m.is_empty()) {
            inner.ready_queue_types.remove(&qt);
        }

        if removed && purge_all {
            if let Some(jobs) = inner.lists.get(&(qt.clone(), qid.clone())).cloned() {
                for jid in jobs {
                    inner.payload.remove(&(qt.clone(), qid.clone(), jid));
                }
            }
            inner.interval_ms.remove(&(qt.clone(), qid.clone()));
            inner.requeues_remaining.remove(&(qt.clone(), qid.clone()));
        }
        inner.lists.remove(&(qt, qid));

        Ok(removed)
    }
}
