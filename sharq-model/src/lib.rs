//! Shared data models for the SharQ queueing engine.
//!
//! This crate has no knowledge of Redis, Lua, or any particular backend —
//! it only defines the validated identifiers, the payload's natural-kinds
//! model, and the typed request/response surface that `sharq-core` and
//! `sharq-config` build on.

pub mod config;
pub mod error;
pub mod ids;
pub mod interval;
pub mod payload;
pub mod requeue;
pub mod responses;

pub use config::EngineConfig;
pub use error::{SharqError, StoreError};
pub use ids::{Identifier, IdentifierError, QueueKey};
pub use interval::{IntervalError, IntervalMs};
pub use payload::{Payload, PayloadValue};
pub use requeue::{RequeueLimit, RequeueLimitError};
pub use responses::{
    ClearOutcome, DequeueOutcome, EnqueueAck, FinishOutcome, GlobalMetrics, IntervalOutcome,
    MinuteCounts, QueueMetrics, QueueTypeMetrics,
};
