//! MessagePack payload codec (§6.1).
//!
//! Payloads travel as [`sharq_model::PayloadValue`], whose hand-written
//! `Serialize`/`Deserialize` impls map each variant onto its native
//! MessagePack wire type. `rmp_serde` drives the actual byte-level
//! encoding, same role `serde_json` plays for JSON elsewhere in the
//! teacher workspace.

use sharq_model::{Payload, PayloadValue, SharqError};

/// Bytes wrapped in a leading/trailing ASCII `"` (`0x22`) are legacy
/// double-encoded payloads from before SharQ's Python 3 migration —
/// ported verbatim from `sharq.utils.deserialize_payload`.
const LEGACY_QUOTE: u8 = b'"';

fn strip_legacy_wrapper(bytes: &[u8]) -> &[u8] {
    if bytes.len() >= 2 && bytes[0] == LEGACY_QUOTE && bytes[bytes.len() - 1] == LEGACY_QUOTE {
        &bytes[1..bytes.len() - 1]
    } else {
        bytes
    }
}

/// Serialize a [`PayloadValue`] to its on-the-wire MessagePack bytes.
pub fn encode(value: &PayloadValue) -> Payload {
    let bytes = rmp_serde::to_vec(value).expect("encoding a PayloadValue to MessagePack is infallible");
    Payload::from_encoded(bytes)
}

/// Deserialize stored bytes back into a [`PayloadValue`], transparently
/// unwrapping the legacy double-encoding.
pub fn decode(payload: &Payload) -> Result<PayloadValue, SharqError> {
    let bytes = strip_legacy_wrapper(payload.as_bytes());
    rmp_serde::from_slice(bytes)
        .map_err(|e| SharqError::BadArgument(format!("invalid MessagePack payload: {e}")))
}

/// Validate that raw, caller-supplied bytes are a well-formed MessagePack
/// document (the `enqueue_raw` entry point; §6.1).
pub fn validate_raw(bytes: &[u8]) -> Result<(), SharqError> {
    let stripped = strip_legacy_wrapper(bytes);
    rmp_serde::from_slice::<PayloadValue>(stripped)
        .map(|_| ())
        .map_err(|e| SharqError::BadArgument(format!("invalid MessagePack payload: {e}")))
}
