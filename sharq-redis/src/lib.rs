//! The reference Redis backend for the SharQ queueing engine.
//!
//! [`RedisStore`] implements [`sharq_core::store::Store`] with the five
//! atomic operations (§4.2-§4.6) plus metrics/health/admin shipped as
//! server-side Lua scripts (`src/lua/*.lua`), giving the linearizable
//! per-operation semantics §5 requires without any client-side
//! locking.

pub mod keys;
pub mod scripts;
pub mod store;

pub use store::RedisStore;
