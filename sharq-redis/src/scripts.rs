//! The five atomic operations (plus metrics counters and admin clear),
//! each shipped to Redis as one `redis::Script`, loaded via
//! `redis::Script::new` over a `const`-embedded Lua body. Scripts are
//! loaded once (SCRIPT LOAD, then EVALSHA on every call) by the `redis`
//! crate's `Script::invoke_async`.

use redis::Script;

pub fn enqueue() -> Script {
    Script::new(include_str!("lua/enqueue.lua"))
}

pub fn dequeue() -> Script {
    Script::new(include_str!("lua/dequeue.lua"))
}

pub fn finish() -> Script {
    Script::new(include_str!("lua/finish.lua"))
}

pub fn interval() -> Script {
    Script::new(include_str!("lua/interval.lua"))
}

pub fn requeue() -> Script {
    Script::new(include_str!("lua/requeue.lua"))
}

pub fn metrics_counts() -> Script {
    Script::new(include_str!("lua/metrics_counts.lua"))
}

pub fn clear_queue() -> Script {
    Script::new(include_str!("lua/clear_queue.lua"))
}
