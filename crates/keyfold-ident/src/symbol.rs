//! Symbolic identifiers and their interner.
//!
//! A [`Symbol`] is a distinct key type from a plain string: `"a"` as a
//! string key and `a` as a symbol key never compare equal. Symbols accept
//! any text (spaces and punctuation included); normalization is a separate,
//! explicit step.

use dashmap::DashMap;
use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use crate::normalize_lower;

// ============================================================================
// Symbol
// ============================================================================

/// Immutable symbolic identifier. Cloning shares the underlying text.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Convert text to a symbol verbatim (no normalization).
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// Alias of [`Symbol::new`] for call sites that want to stress "no normalization".
    pub fn from_raw(text: &str) -> Self {
        Self(Arc::from(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased, underscored text of this symbol.
    pub fn normalize_lower(&self) -> String {
        normalize_lower(&self.0)
    }

    /// The normalized symbol. Idempotent; returns a clone when already normalized.
    pub fn normalized(&self) -> Symbol {
        if crate::is_normalized(&self.0) {
            return self.clone();
        }
        Symbol::new(self.normalize_lower())
    }

    /// True when both symbols point at the same interned text.
    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{:?}", &*self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(text: &str) -> Self {
        Symbol::from_raw(text)
    }
}

impl From<String> for Symbol {
    fn from(text: String) -> Self {
        Symbol::new(text)
    }
}

impl Serialize for Symbol {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

// ============================================================================
// Symbol Interning
// ============================================================================

/// Interning table: every interning of the same text returns a symbol that
/// shares one allocation, including when several threads intern at once.
///
/// There is no process-wide instance; owners (usually a rewriter) keep
/// their own table and drop or [`clear`](SymbolInterner::clear) it.
#[derive(Debug, Default)]
pub struct SymbolInterner {
    symbols: DashMap<Arc<str>, (), ahash::RandomState>,
}

impl SymbolInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning its shared symbol.
    pub fn intern(&self, text: &str) -> Symbol {
        if let Some(existing) = self.get(text) {
            return existing;
        }
        self.adopt(Arc::from(text))
    }

    /// Intern an existing symbol, reusing the table's copy when present.
    pub fn intern_symbol(&self, symbol: &Symbol) -> Symbol {
        if let Some(existing) = self.get(symbol.as_str()) {
            return existing;
        }
        self.adopt(Arc::clone(&symbol.0))
    }

    /// Insert `text` unless another caller got there first; the entry lock
    /// makes the winner's allocation the one everybody shares.
    fn adopt(&self, text: Arc<str>) -> Symbol {
        let entry = self.symbols.entry(text).or_insert(());
        Symbol(Arc::clone(entry.key()))
    }

    /// Look up an interned symbol without inserting.
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.symbols
            .get(text)
            .map(|existing| Symbol(Arc::clone(existing.key())))
    }

    /// Drop every interned entry. Symbols already handed out stay valid;
    /// later interning starts new allocations.
    pub fn clear(&self) {
        self.symbols.clear();
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
