//! Identifier normalization for keyfold
//!
//! Keys that arrive from HTTP payloads and config files come with every
//! flavour of casing and punctuation (`"Effective Date"`, `"Recursive-Item"`,
//! `"one two"`). This crate turns them into one convention:
//!
//! - `normalize_separators`: whitespace and `-` become `_`
//! - `normalize_lower`: separators, then ASCII lower-casing
//! - `to_symbol`: the lower-cased form as a [`Symbol`]
//!
//! The three steps are kept apart so callers can pick string output or
//! symbol output without re-implementing the substitution.

pub mod symbol;

pub use symbol::{Symbol, SymbolInterner};

// ============================================================================
// Separator Normalization
// ============================================================================

/// The replacement written for every separator character.
pub const SEPARATOR_REPLACEMENT: char = '_';

/// Whether `c` is rewritten by [`normalize_separators`].
///
/// Whitespace is the ASCII class: space, `\t`, `\n`, `\r`, form feed and
/// vertical tab. Unicode spaces pass through untouched.
#[inline]
pub fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C' | '-')
}

/// Replace each whitespace character and each `-` with `_`.
///
/// Replacement is per character, so `"a  b"` becomes `"a__b"`.
pub fn normalize_separators(text: &str) -> String {
    text.chars()
        .map(|c| {
            if is_separator(c) {
                SEPARATOR_REPLACEMENT
            } else {
                c
            }
        })
        .collect()
}

/// [`normalize_separators`] followed by ASCII lower-casing.
pub fn normalize_lower(text: &str) -> String {
    let mut out = normalize_separators(text);
    out.make_ascii_lowercase();
    out
}

/// True when `text` is already in `normalize_lower` form.
pub fn is_normalized(text: &str) -> bool {
    !text
        .chars()
        .any(|c| is_separator(c) || c.is_ascii_uppercase())
}

// ============================================================================
// Symbol Conversion
// ============================================================================

/// Normalize `text` and convert it to a [`Symbol`].
///
/// This is the canonical "normalized symbolic identifier" form.
pub fn to_symbol(text: &str) -> Symbol {
    Symbol::new(normalize_lower(text))
}

/// Like [`to_symbol`], but shares storage through `interner`.
pub fn to_symbol_interned(text: &str, interner: &SymbolInterner) -> Symbol {
    if is_normalized(text) {
        return interner.intern(text);
    }
    interner.intern(&normalize_lower(text))
}
