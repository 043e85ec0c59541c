//! Serde representation of raw bodies.
//!
//! UTF-8 bodies serialize as plain strings. Anything else serializes as
//! `{"base64": "..."}` so binary payloads survive a JSON round trip.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BodyRepr {
    Text(String),
    Encoded { base64: String },
}

pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    let repr = match std::str::from_utf8(body) {
        Ok(text) => BodyRepr::Text(text.to_string()),
        Err(_) => BodyRepr::Encoded {
            base64: STANDARD.encode(body),
        },
    };
    repr.serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
    match Option::<BodyRepr>::deserialize(deserializer)? {
        None => Ok(Bytes::new()),
        Some(BodyRepr::Text(text)) => Ok(Bytes::from(text)),
        Some(BodyRepr::Encoded { base64 }) => STANDARD
            .decode(base64.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom),
    }
}
