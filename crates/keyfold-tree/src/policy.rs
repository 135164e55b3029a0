//! Key policies: the named key transforms a rewrite can apply.

use keyfold_ident::{normalize_lower, to_symbol_interned, Symbol, SymbolInterner};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::Key;

/// A key transform could not be applied to a key; the key is kept as it was.
///
/// This is a policy outcome, not a failure: rewrites log it and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{policy} cannot convert a {kind} key")]
pub struct KeySkipped {
    pub kind: &'static str,
    pub policy: &'static str,
}

impl KeySkipped {
    pub fn new(key: &Key, policy: &'static str) -> Self {
        Self {
            kind: key.kind(),
            policy,
        }
    }
}

/// The three built-in key conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicy {
    /// String keys become symbols verbatim; no case or separator changes.
    Symbol,
    /// String and symbol keys become normalized symbols.
    NormalizedSymbol,
    /// String and symbol keys become normalized strings.
    NormalizedString,
}

impl KeyPolicy {
    pub const ALL: [KeyPolicy; 3] = [
        KeyPolicy::Symbol,
        KeyPolicy::NormalizedSymbol,
        KeyPolicy::NormalizedString,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KeyPolicy::Symbol => "symbol",
            KeyPolicy::NormalizedSymbol => "normalized-symbol",
            KeyPolicy::NormalizedString => "normalized-string",
        }
    }

    /// Transform one key. Only string and symbol keys are convertible.
    pub fn apply(self, key: &Key, interner: &SymbolInterner) -> Result<Key, KeySkipped> {
        match (self, key) {
            (KeyPolicy::Symbol, Key::Str(text)) => Ok(Key::Sym(interner.intern(text))),
            (KeyPolicy::Symbol, Key::Sym(sym)) => Ok(Key::Sym(interner.intern_symbol(sym))),
            (KeyPolicy::NormalizedSymbol, Key::Str(text)) => {
                Ok(Key::Sym(to_symbol_interned(text, interner)))
            }
            (KeyPolicy::NormalizedSymbol, Key::Sym(sym)) => {
                Ok(Key::Sym(to_symbol_interned(sym.as_str(), interner)))
            }
            (KeyPolicy::NormalizedString, Key::Str(text)) => Ok(Key::Str(normalize_lower(text))),
            (KeyPolicy::NormalizedString, Key::Sym(sym)) => Ok(Key::Str(sym.normalize_lower())),
            (policy, other) => Err(KeySkipped::new(other, policy.name())),
        }
    }

    /// Transform one key without sharing symbol storage.
    pub fn apply_uninterned(self, key: &Key) -> Result<Key, KeySkipped> {
        match (self, key) {
            (KeyPolicy::Symbol, Key::Str(text)) => Ok(Key::Sym(Symbol::from(text.as_str()))),
            (KeyPolicy::Symbol, Key::Sym(sym)) => Ok(Key::Sym(sym.clone())),
            (KeyPolicy::NormalizedSymbol, Key::Str(text)) => Ok(Key::Sym(keyfold_ident::to_symbol(text))),
            (KeyPolicy::NormalizedSymbol, Key::Sym(sym)) => Ok(Key::Sym(sym.normalized())),
            (KeyPolicy::NormalizedString, Key::Str(text)) => Ok(Key::Str(normalize_lower(text))),
            (KeyPolicy::NormalizedString, Key::Sym(sym)) => Ok(Key::Str(sym.normalize_lower())),
            (policy, other) => Err(KeySkipped::new(other, policy.name())),
        }
    }
}

impl fmt::Display for KeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key policy `{0}` (expected symbol, normalized-symbol or normalized-string)")]
pub struct UnknownKeyPolicy(pub String);

impl FromStr for KeyPolicy {
    type Err = UnknownKeyPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyPolicy::ALL
            .into_iter()
            .find(|policy| policy.name() == s)
            .ok_or_else(|| UnknownKeyPolicy(s.to_string()))
    }
}
