//! Constructs the store-level key names. This is the single site that
//! knows how `(queue_type, queue_id, job_id)` maps onto Redis key/field
//! strings; `sharq-core::engine::Engine` never sees these, only
//! `queue_type`/`queue_id`/`job_id` — the same way a repository trait
//! keeps its SQL table names from leaking to callers.

/// `P:{qt}` — the ready sorted set (next-eligible score per queue_id).
pub fn ready_zset(prefix: &str, queue_type: &str) -> String {
    format!("{prefix}:{queue_type}")
}

/// `P:{qt}:active` — the in-flight sorted set (lease-expiry score per
/// `{qid}:{jid}` member).
pub fn active_zset(prefix: &str, queue_type: &str) -> String {
    format!("{prefix}:{queue_type}:active")
}

/// `P:{qt}:{qid}` — the job list (FIFO).
pub fn job_list(prefix: &str, queue_type: &str, queue_id: &str) -> String {
    format!("{prefix}:{queue_type}:{queue_id}")
}

/// `P:payload` — hash of `{qt}:{qid}:{jid}` -> serialized payload.
pub fn payload_hash(prefix: &str) -> String {
    format!("{prefix}:payload")
}

pub fn payload_field(queue_type: &str, queue_id: &str, job_id: &str) -> String {
    format!("{queue_type}:{queue_id}:{job_id}")
}

/// `P:interval` — hash of `{qt}:{qid}` -> interval ms.
pub fn interval_hash(prefix: &str) -> String {
    format!("{prefix}:interval")
}

pub fn interval_field(queue_type: &str, queue_id: &str) -> String {
    format!("{queue_type}:{queue_id}")
}

/// `P:{qt}:{qid}:requeues_remaining` — hash of `{jid}` -> remaining count.
pub fn requeues_hash(prefix: &str, queue_type: &str, queue_id: &str) -> String {
    format!("{prefix}:{queue_type}:{queue_id}:requeues_remaining")
}

/// `P:ready:queue_type` / `P:active:queue_type`.
pub fn ready_queue_type_set(prefix: &str) -> String {
    format!("{prefix}:ready:queue_type")
}

pub fn active_queue_type_set(prefix: &str) -> String {
    format!("{prefix}:active:queue_type")
}

/// `P:{qt}:{qid}:time` — the TTL'd rate-limit lease sentinel.
pub fn lease_key(prefix: &str, queue_type: &str, queue_id: &str) -> String {
    format!("{prefix}:{queue_type}:{queue_id}:time")
}

/// Base for the global minute counters: `P:enqueue_counter:{minute}` /
/// `P:dequeue_counter:{minute}`.
pub fn global_counter_base(prefix: &str) -> String {
    prefix.to_string()
}

/// Base for the per-queue minute counters:
/// `P:{qt}:{qid}:enqueue_counter:{minute}` / `...:dequeue_counter:{minute}`.
pub fn queue_counter_base(prefix: &str, queue_type: &str, queue_id: &str) -> String {
    format!("{prefix}:{queue_type}:{queue_id}")
}

/// `P:deep_status` — the health-probe sentinel key (§6).
pub fn health_key(prefix: &str) -> String {
    format!("{prefix}:deep_status")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_match_the_naming_table() {
        assert_eq!(job_list("sharq", "sms", "u"), "sharq:sms:u");
        assert_eq!(ready_zset("sharq", "sms"), "sharq:sms");
        assert_eq!(active_zset("sharq", "sms"), "sharq:sms:active");
        assert_eq!(payload_hash("sharq"), "sharq:payload");
        assert_eq!(payload_field("sms", "u", "j"), "sms:u:j");
        assert_eq!(interval_hash("sharq"), "sharq:interval");
        assert_eq!(interval_field("sms", "u"), "sms:u");
        assert_eq!(requeues_hash("sharq", "sms", "u"), "sharq:sms:u:requeues_remaining");
        assert_eq!(ready_queue_type_set("sharq"), "sharq:ready:queue_type");
        assert_eq!(active_queue_type_set("sharq"), "sharq:active:queue_type");
        assert_eq!(lease_key("sharq", "sms", "u"), "sharq:sms:u:time");
    }
}
