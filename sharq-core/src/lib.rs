//! The SharQ queueing engine.
//!
//! This crate is pure logic: validation (§4.1), the MessagePack
//! payload codec (§6.1), the [`store::Store`] abstraction a concrete
//! backend implements, the [`engine::Engine`] that composes the five atomic
//! operations on top of it, and the [`sweeper::Sweeper`] background driver.
//! Nothing in here knows about Redis, Lua, HTTP, or a config file — that's
//! `sharq-redis` and `sharq-config`'s job.

pub mod clock;
pub mod codec;
pub mod engine;
pub mod store;
pub mod sweeper;
pub mod validation;

pub use clock::{Clock, SystemClock};
pub use engine::Engine;
pub use store::Store;
pub use sweeper::{SweepSummary, Sweeper};
