use std::collections::BTreeMap;
use std::fmt;

/// A codec-neutral representation of the "natural kinds" a job payload may
/// be built from: null, bool, integer, float, string, bytes, sequence, map.
///
/// Every value constructible here is, by construction, encodable by the
/// MessagePack codec in `sharq_core::codec` — there is no rejected case on
/// the `PayloadValue` entry point, only on the raw-bytes entry point where a
/// caller hands over an already-serialized blob that turns out not to be
/// valid MessagePack.
///
/// `Serialize`/`Deserialize` are implemented by hand (rather than derived)
/// so each variant maps onto its native MessagePack wire type — `Bytes`
/// becomes `bin`, not an array of small integers — with no tagging
/// overhead and no ambiguity for a self-describing format like msgpack.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Seq(Vec<PayloadValue>),
    Map(BTreeMap<String, PayloadValue>),
}

impl serde::Serialize for PayloadValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        use serde::ser::SerializeSeq;

        match self {
            PayloadValue::Null => serializer.serialize_unit(),
            PayloadValue::Bool(b) => serializer.serialize_bool(*b),
            PayloadValue::Int(i) => serializer.serialize_i64(*i),
            PayloadValue::Float(f) => serializer.serialize_f64(*f),
            PayloadValue::String(s) => serializer.serialize_str(s),
            PayloadValue::Bytes(b) => serializer.serialize_bytes(b),
            PayloadValue::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            PayloadValue::Map(map) => {
                let mut ser_map = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    ser_map.serialize_entry(k, v)?;
                }
                ser_map.end()
            }
        }
    }
}

impl<'de> serde::Deserialize<'de> for PayloadValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PayloadValueVisitor;

        impl<'de> serde::de::Visitor<'de> for PayloadValueVisitor {
            type Value = PayloadValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a MessagePack-representable value")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(PayloadValue::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(PayloadValue::Null)
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
                Ok(PayloadValue::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
                Ok(PayloadValue::Int(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
                Ok(PayloadValue::Int(v as i64))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
                Ok(PayloadValue::Float(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
                Ok(PayloadValue::String(v.to_owned()))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
                Ok(PayloadValue::String(v))
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(PayloadValue::Bytes(v.to_vec()))
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(PayloadValue::Bytes(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(PayloadValue::Seq(items))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut out = BTreeMap::new();
                while let Some((k, v)) = map.next_entry::<String, PayloadValue>()? {
                    out.insert(k, v);
                }
                Ok(PayloadValue::Map(out))
            }
        }

        deserializer.deserialize_any(PayloadValueVisitor)
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::String(value.to_owned())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::String(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        PayloadValue::Int(value)
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        PayloadValue::Bool(value)
    }
}

/// An already-encoded job payload, as stored in `P:payload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn from_encoded(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}
