//! JSON interop.
//!
//! JSON objects become maps with string keys in document order; arrays
//! become sequences. Going back, every key is written as its display text,
//! so distinct keys can meet on the same text (`Int(1)` and `Str("1")`,
//! `Null` and `Str("")`). [`Tree::to_json`] and the `Serialize` impls
//! resolve that the same way: one entry per text, at the position of the
//! first key, holding the value of the last.

use ahash::AHashMap;
use anyhow::{Context, Result};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Number, Value};
use std::sync::Arc;
use tracing::debug;

use crate::key_map::KeyMap;
use crate::model::{Key, Scalar, Tree};
use crate::policy::KeyPolicy;
use crate::rewrite::Rewriter;

impl From<Value> for Tree {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Tree::Leaf(Scalar::Null),
            Value::Bool(b) => Tree::Leaf(Scalar::Bool(b)),
            Value::Number(n) => Tree::Leaf(number_to_scalar(&n)),
            Value::String(s) => Tree::Leaf(Scalar::Str(Arc::from(s))),
            Value::Array(items) => Tree::Seq(items.into_iter().map(Tree::from).collect()),
            Value::Object(obj) => Tree::Map(
                obj.into_iter()
                    .map(|(key, val)| (Key::Str(key), Tree::from(val)))
                    .collect(),
            ),
        }
    }
}

fn number_to_scalar(n: &Number) -> Scalar {
    match n.as_i64() {
        Some(i) => Scalar::Int(i),
        // u64 above i64::MAX and floats
        None => Scalar::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

impl Tree {
    /// Convert to a `serde_json::Value`. Non-finite floats become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Tree::Map(map) => Value::Object(map_to_json(map)),
            Tree::Seq(items) => Value::Array(items.iter().map(Tree::to_json).collect()),
            Tree::Leaf(scalar) => scalar_to_json(scalar),
        }
    }
}

/// Object entries for `map`, one per key text: first position, last value.
fn json_entries(map: &KeyMap) -> Vec<(String, &Tree)> {
    let mut entries: Vec<(String, &Tree)> = Vec::with_capacity(map.len());
    let mut slots: AHashMap<String, usize> = AHashMap::with_capacity(map.len());
    for (key, value) in map.iter() {
        let text = key.to_string();
        match slots.get(&text) {
            Some(&slot) => {
                debug!(key = ?key, text = %text, "keys share JSON text; later value wins");
                entries[slot].1 = value;
            }
            None => {
                slots.insert(text.clone(), entries.len());
                entries.push((text, value));
            }
        }
    }
    entries
}

fn map_to_json(map: &KeyMap) -> Map<String, Value> {
    json_entries(map)
        .into_iter()
        .map(|(text, value)| (text, value.to_json()))
        .collect()
}

fn scalar_to_json(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Int(i) => Value::from(*i),
        Scalar::Float(x) => Number::from_f64(*x).map(Value::Number).unwrap_or(Value::Null),
        Scalar::Str(s) => Value::String(s.to_string()),
        Scalar::Sym(sym) => Value::String(sym.as_str().to_string()),
    }
}

impl Serialize for Tree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Tree::Map(map) => map.serialize(serializer),
            Tree::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Tree::Leaf(scalar) => scalar.serialize(serializer),
        }
    }
}

impl Serialize for KeyMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries = json_entries(self);
        let mut out = serializer.serialize_map(Some(entries.len()))?;
        for (text, value) in &entries {
            out.serialize_entry(text, value)?;
        }
        out.end()
    }
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::Float(x) if x.is_finite() => serializer.serialize_f64(*x),
            Scalar::Float(_) => serializer.serialize_unit(),
            Scalar::Str(s) => serializer.serialize_str(s),
            Scalar::Sym(sym) => sym.serialize(serializer),
        }
    }
}

/// Parse JSON text into a [`Tree`].
pub fn parse_json(text: &str) -> Result<Tree> {
    let value: Value = serde_json::from_str(text).context("failed to parse JSON payload")?;
    Ok(Tree::from(value))
}

/// Parse `text`, rewrite its keys under `policy`, and return JSON.
///
/// Symbol keys have no JSON form of their own, so symbol policies come back
/// as string keys with the symbol's text.
pub fn normalize_json_keys(text: &str, policy: KeyPolicy) -> Result<Value> {
    let tree = parse_json(text)?;
    let rewritten = Rewriter::new(policy)
        .rewrite_owned(tree)
        .with_context(|| format!("failed to rewrite keys with the {policy} policy"))?;
    Ok(rewritten.to_json())
}
