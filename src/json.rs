//! JSON loading without serde_json's nesting limit.
//!
//! Editor state nests every `next` block inside its predecessor, so a long
//! statement chain is as deep as it is long. Parsing grows the stack on demand
//! instead of failing at a fixed depth.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) fn from_str<T: DeserializeOwned>(json: &str) -> serde_json::Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let value =
        <T as Deserialize>::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

pub(crate) fn from_value<T: DeserializeOwned>(value: Value) -> serde_json::Result<T> {
    <T as Deserialize>::deserialize(serde_stacker::Deserializer::new(value))
}
