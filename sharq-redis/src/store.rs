//! [`sharq_core::store::Store`] implemented against Redis.
//!
//! Every method backing one of the five atomic operations ships its
//! `redis::Script` once per call (EVALSHA, falling back to SCRIPT LOAD
//! + EVALSHA on a cache miss, handled internally by the `redis` crate's
//! `Script::invoke_async`) over a pooled [`ConnectionManager`], cloned
//! cheaply per call the same way a shared rate-limiter middleware would
//! hold onto one.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{RedisError, Value};

use sharq_core::store::{
    CounterWindow, DequeueArgs, Dequeued, EnqueueArgs, FinishArgs, IntervalArgs, QueueMetricsRaw,
    RequeueSweep, RequeuedJobRef, Store,
};
use sharq_model::{Payload, RequeueLimit, StoreError};

use crate::{keys, scripts};

fn map_err(err: RedisError) -> StoreError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Protocol(err.to_string())
    }
}

/// The reference `Store` backend: one shared [`ConnectionManager`] per
/// `RedisStore`, cloned (cheaply — it's itself a handle) for every call.
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").field("prefix", &self.prefix).finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Open a connection manager against `redis_url` and wrap it with the
    /// given key-namespacing prefix.
    pub async fn connect(redis_url: &str, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let prefix = prefix.into();
        let client = redis::Client::open(redis_url).map_err(map_err)?;
        let conn = ConnectionManager::new(client).await.map_err(map_err)?;
        tracing::info!(key_prefix = %prefix, "connected to redis");
        Ok(Self { conn, prefix })
    }

    /// Wrap an already-constructed connection manager (e.g. one shared with
    /// other subsystems of a host application).
    pub fn from_connection_manager(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self { conn, prefix: prefix.into() }
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

fn value_to_i64(value: &Value) -> i64 {
    match value {
        Value::Int(i) => *i,
        Value::BulkString(bytes) => std::str::from_utf8(bytes).ok().and_then(|s| s.parse().ok()).unwrap_or(0),
        Value::Nil => 0,
        _ => 0,
    }
}

fn value_to_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::BulkString(bytes) => bytes.clone(),
        _ => Vec::new(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::BulkString(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::SimpleString(s) => s.clone(),
        _ => String::new(),
    }
}

fn parse_counter_pairs(values: &[Value]) -> Vec<(i64, u64)> {
    values
        .chunks_exact(2)
        .map(|pair| (value_to_i64(&pair[0]), value_to_i64(&pair[1]).max(0) as u64))
        .collect()
}

#[async_trait]
impl Store for RedisStore {
    async fn enqueue(&self, args: EnqueueArgs<'_>) -> Result<(), StoreError> {
        let mut conn = self.conn();
        scripts::enqueue()
            .key(&self.prefix)
            .key(args.queue_type)
            .arg(args.now_ms)
            .arg(args.queue_id)
            .arg(args.job_id)
            .arg(args.payload.as_bytes())
            .arg(args.interval_ms)
            .arg(args.requeue_limit.get())
            .invoke_async::<()>(&mut conn)
            .await
            .map_err(map_err)
    }

    async fn dequeue(&self, args: DequeueArgs<'_>) -> Result<Option<Dequeued>, StoreError> {
        let mut conn = self.conn();
        let value: Value = scripts::dequeue()
            .key(&self.prefix)
            .key(args.queue_type)
            .arg(args.now_ms)
            .arg(args.job_expire_interval_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(map_err)?;

        let Value::Array(items) = value else {
            return Ok(None);
        };
        if items.len() < 4 {
            return Ok(None);
        }

        let queue_id = value_to_string(&items[0]);
        let job_id = value_to_string(&items[1]);
        let payload = value_to_bytes(&items[2]);
        let requeues_remaining = RequeueLimit::new(value_to_i64(&items[3]))
            .unwrap_or(RequeueLimit::UNBOUNDED);

        Ok(Some(Dequeued {
            queue_id,
            job_id,
            payload: Payload::from_encoded(payload),
            requeues_remaining,
        }))
    }

    async fn finish(&self, args: FinishArgs<'_>) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        let removed: i64 = scripts::finish()
            .key(&self.prefix)
            .key(args.queue_type)
            .arg(args.queue_id)
            .arg(args.job_id)
            .invoke_async(&mut conn)
            .await
            .map_err(map_err)?;
        Ok(removed == 1)
    }

    async fn set_interval(&self, args: IntervalArgs<'_>) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        let updated: i64 = scripts::interval()
            .key(&self.prefix)
            .arg(args.queue_type)
            .arg(args.queue_id)
            .arg(args.interval_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(map_err)?;
        Ok(updated == 1)
    }

    async fn active_queue_types(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn();
        redis::cmd("SMEMBERS")
            .arg(keys::active_queue_type_set(&self.prefix))
            .query_async(&mut conn)
            .await
            .map_err(map_err)
    }

    async fn requeue(&self, queue_type: &str, now_ms: i64) -> Result<RequeueSweep, StoreError> {
        let mut conn = self.conn();
        let discarded: Vec<String> = scripts::requeue()
            .key(&self.prefix)
            .key(queue_type)
            .arg(now_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(map_err)?;

        let discarded = discarded
            .into_iter()
            .filter_map(|member| {
                member.split_once(':').map(|(qid, jid)| RequeuedJobRef {
                    queue_id: qid.to_string(),
                    job_id: jid.to_string(),
                })
            })
            .collect();

        Ok(RequeueSweep { discarded })
    }

    async fn metrics_global(&self, now_ms: i64) -> Result<(Vec<String>, CounterWindow), StoreError> {
        let mut conn = self.conn();

        let ready: Vec<String> = redis::cmd("SMEMBERS")
            .arg(keys::ready_queue_type_set(&self.prefix))
            .query_async(&mut conn)
            .await
            .map_err(map_err)?;
        let active: Vec<String> = redis::cmd("SMEMBERS")
            .arg(keys::active_queue_type_set(&self.prefix))
            .query_async(&mut conn)
            .await
            .map_err(map_err)?;

        let mut queue_types = ready;
        for qt in active {
            if !queue_types.contains(&qt) {
                queue_types.push(qt);
            }
        }

        let counters = self.counter_window(keys::global_counter_base(&self.prefix), now_ms).await?;
        Ok((queue_types, counters))
    }

    async fn metrics_queue_type(&self, queue_type: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn();

        let ready: Vec<String> = redis::cmd("ZRANGE")
            .arg(keys::ready_zset(&self.prefix, queue_type))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .map_err(map_err)?;

        let active_members: Vec<String> = redis::cmd("ZRANGE")
            .arg(keys::active_zset(&self.prefix, queue_type))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .map_err(map_err)?;

        let mut queue_ids = ready;
        for member in active_members {
            if let Some((qid, _)) = member.split_once(':') {
                if !queue_ids.iter().any(|existing| existing == qid) {
                    queue_ids.push(qid.to_string());
                }
            }
        }

        Ok(queue_ids)
    }

    async fn metrics_queue(
        &self,
        queue_type: &str,
        queue_id: &str,
        now_ms: i64,
    ) -> Result<QueueMetricsRaw, StoreError> {
        let mut conn = self.conn();
        let queue_length: u64 = redis::cmd("LLEN")
            .arg(keys::job_list(&self.prefix, queue_type, queue_id))
            .query_async(&mut conn)
            .await
            .map_err(map_err)?;

        let counters =
            self.counter_window(keys::queue_counter_base(&self.prefix, queue_type, queue_id), now_ms).await?;

        Ok(QueueMetricsRaw { queue_length, counters })
    }

    async fn health(&self) -> Result<(), StoreError> {
        let mut conn = self.conn();
        redis::cmd("SET")
            .arg(keys::health_key(&self.prefix))
            .arg("sharq_deep_status")
            .query_async::<()>(&mut conn)
            .await
            .map_err(map_err)
    }

    async fn clear_queue(
        &self,
        queue_type: &str,
        queue_id: &str,
        purge_all: bool,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        let removed: i64 = scripts::clear_queue()
            .key(&self.prefix)
            .key(queue_type)
            .arg(queue_id)
            .arg(if purge_all { "1" } else { "0" })
            .invoke_async(&mut conn)
            .await
            .map_err(map_err)?;
        Ok(removed == 1)
    }
}

impl RedisStore {
    async fn counter_window(&self, base: String, now_ms: i64) -> Result<CounterWindow, StoreError> {
        let mut conn = self.conn();
        let value: Value =
            scripts::metrics_counts().key(base).arg(now_ms).invoke_async(&mut conn).await.map_err(map_err)?;

        let Value::Array(pair) = value else {
            return Ok(CounterWindow::default());
        };
        if pair.len() != 2 {
            return Ok(CounterWindow::default());
        }

        let enqueue_counts = match &pair[0] {
            Value::Array(items) => parse_counter_pairs(items),
            _ => Vec::new(),
        };
        let dequeue_counts = match &pair[1] {
            Value::Array(items) => parse_counter_pairs(items),
            _ => Vec::new(),
        };

        Ok(CounterWindow { enqueue_counts, dequeue_counts })
    }
}
