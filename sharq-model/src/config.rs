use crate::requeue::RequeueLimit;

/// Engine-level configuration consumed by `sharq_core::engine::Engine`.
///
/// Loading this from a file/environment is `sharq-config`'s job; this type
/// is deliberately plain data so `sharq-core` doesn't need to depend on the
/// loader crate.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Namespacing prefix `P` applied to every store key (§3).
    pub key_prefix: String,
    /// Lease expiry for in-flight jobs, in milliseconds.
    pub job_expire_interval_ms: u64,
    /// Requeue limit applied when `enqueue` doesn't specify one.
    pub default_job_requeue_limit: RequeueLimit,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_prefix: "sharq".to_string(),
            job_expire_interval_ms: 1_000,
            default_job_requeue_limit: RequeueLimit::UNBOUNDED,
        }
    }
}
