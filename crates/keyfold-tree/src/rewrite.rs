//! Recursive key rewriting.
//!
//! One algorithm, parameterized by a key transform `f`:
//! - mapping: every key goes through `f`, every value is rewritten
//! - sequence: every element is rewritten, order kept
//! - leaf: returned as is
//!
//! Keys `f` cannot convert are kept unchanged (see [`KeySkipped`]). When two
//! keys rewrite to the same key, the later entry's value wins and the entry
//! stays at the earlier position.

use keyfold_ident::SymbolInterner;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::key_map::KeyMap;
use crate::model::{Key, Tree};
use crate::policy::{KeyPolicy, KeySkipped};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// In-place rewriting needs a top-level mapping or sequence.
    #[error("cannot rewrite a {found} in place: expected a map or sequence")]
    InvalidMutationTarget { found: &'static str },

    /// The tree nests deeper than the configured limit.
    #[error("tree depth {depth} exceeds the configured limit of {limit}")]
    UnsupportedStructure { depth: usize, limit: usize },
}

// ============================================================================
// Generic Rewrite
// ============================================================================

/// Apply `f` to `key`, or report the skip and return `None`.
fn convert_key<F>(key: &Key, f: &F) -> Option<Key>
where
    F: Fn(&Key) -> Result<Key, KeySkipped> + ?Sized,
{
    match f(key) {
        Ok(converted) => Some(converted),
        Err(skipped) => {
            trace!(key = ?key, reason = %skipped, "key left unchanged");
            None
        }
    }
}

fn insert_rewritten(out: &mut KeyMap, key: Key, value: Tree) {
    if out.contains_key(&key) {
        debug!(key = ?key, "rewritten key collides with an earlier entry; later value wins");
    }
    out.insert(key, value);
}

/// Copy-returning rewrite: builds new containers, shares leaf text.
pub fn rewrite_keys<F>(value: &Tree, f: &F) -> Tree
where
    F: Fn(&Key) -> Result<Key, KeySkipped> + ?Sized,
{
    match value {
        Tree::Map(map) => {
            let mut out = KeyMap::with_capacity(map.len());
            for (key, child) in map.iter() {
                let new_key = convert_key(key, f).unwrap_or_else(|| key.clone());
                insert_rewritten(&mut out, new_key, rewrite_keys(child, f));
            }
            Tree::Map(out)
        }
        Tree::Seq(items) => Tree::Seq(items.iter().map(|child| rewrite_keys(child, f)).collect()),
        Tree::Leaf(scalar) => Tree::Leaf(scalar.clone()),
    }
}

/// Consuming rewrite: reuses the input's keys and leaves.
pub fn rewrite_keys_owned<F>(value: Tree, f: &F) -> Tree
where
    F: Fn(&Key) -> Result<Key, KeySkipped> + ?Sized,
{
    match value {
        Tree::Map(map) => {
            let mut out = KeyMap::with_capacity(map.len());
            for (key, child) in map {
                let new_key = convert_key(&key, f).unwrap_or(key);
                insert_rewritten(&mut out, new_key, rewrite_keys_owned(child, f));
            }
            Tree::Map(out)
        }
        Tree::Seq(items) => Tree::Seq(
            items
                .into_iter()
                .map(|child| rewrite_keys_owned(child, f))
                .collect(),
        ),
        leaf @ Tree::Leaf(_) => leaf,
    }
}

/// Rewrite the caller's container. Fails without touching `value` when it is a leaf.
///
/// Only the top-level container keeps its identity; nested containers are
/// rebuilt exactly as in [`rewrite_keys`].
pub fn rewrite_keys_in_place<F>(value: &mut Tree, f: &F) -> Result<(), RewriteError>
where
    F: Fn(&Key) -> Result<Key, KeySkipped> + ?Sized,
{
    ensure_container(value)?;
    let owned = std::mem::take(value);
    *value = rewrite_keys_owned(owned, f);
    Ok(())
}

fn ensure_container(value: &Tree) -> Result<(), RewriteError> {
    if value.is_leaf() {
        return Err(RewriteError::InvalidMutationTarget {
            found: value.kind(),
        });
    }
    Ok(())
}

// ============================================================================
// Policy Entry Points
// ============================================================================

fn rewrite_with_policy(tree: &Tree, policy: KeyPolicy) -> Tree {
    let interner = SymbolInterner::new();
    rewrite_keys(tree, &|key: &Key| policy.apply(key, &interner))
}

fn rewrite_in_place_with_policy(tree: &mut Tree, policy: KeyPolicy) -> Result<(), RewriteError> {
    let interner = SymbolInterner::new();
    rewrite_keys_in_place(tree, &|key: &Key| policy.apply(key, &interner))
}

/// String keys become symbols verbatim.
pub fn rewrite_keys_to_symbol(tree: &Tree) -> Tree {
    rewrite_with_policy(tree, KeyPolicy::Symbol)
}

pub fn rewrite_keys_to_symbol_in_place(tree: &mut Tree) -> Result<(), RewriteError> {
    rewrite_in_place_with_policy(tree, KeyPolicy::Symbol)
}

/// String and symbol keys become normalized symbols (`"Effective Date"` -> `effective_date`).
pub fn rewrite_keys_to_normalized_symbol(tree: &Tree) -> Tree {
    rewrite_with_policy(tree, KeyPolicy::NormalizedSymbol)
}

pub fn rewrite_keys_to_normalized_symbol_in_place(tree: &mut Tree) -> Result<(), RewriteError> {
    rewrite_in_place_with_policy(tree, KeyPolicy::NormalizedSymbol)
}

/// String and symbol keys become normalized strings (`"Effective Date"` -> `"effective_date"`).
pub fn rewrite_keys_to_normalized_string(tree: &Tree) -> Tree {
    rewrite_with_policy(tree, KeyPolicy::NormalizedString)
}

pub fn rewrite_keys_to_normalized_string_in_place(tree: &mut Tree) -> Result<(), RewriteError> {
    rewrite_in_place_with_policy(tree, KeyPolicy::NormalizedString)
}

// ============================================================================
// Configured Rewriter
// ============================================================================

/// Configuration for a [`Rewriter`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Key convention to apply
    pub policy: KeyPolicy,
    /// Reject trees nested deeper than this
    pub max_depth: Option<usize>,
    /// Share symbol storage across every key this rewriter produces
    pub intern_symbols: bool,
    /// Stop adding to the interning table once it holds this many symbols;
    /// keys past the bound get their own allocation
    pub max_interned: Option<usize>,
}

/// Default bound on a rewriter's interning table.
pub const DEFAULT_MAX_INTERNED: usize = 4096;

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            policy: KeyPolicy::NormalizedSymbol,
            max_depth: None,
            intern_symbols: true,
            max_interned: Some(DEFAULT_MAX_INTERNED),
        }
    }
}

/// A reusable rewriter for one policy.
///
/// Symbols produced across calls share one interning table, so a stream of
/// payloads with the same keys allocates each key once. The table is bounded
/// by `RewriteConfig::max_interned` and can be emptied with
/// [`Rewriter::clear_interned`].
#[derive(Debug, Default)]
pub struct Rewriter {
    config: RewriteConfig,
    interner: SymbolInterner,
}

impl Rewriter {
    pub fn new(policy: KeyPolicy) -> Self {
        Self::with_config(RewriteConfig {
            policy,
            ..RewriteConfig::default()
        })
    }

    pub fn with_config(config: RewriteConfig) -> Self {
        Self {
            config,
            interner: SymbolInterner::new(),
        }
    }

    pub fn policy(&self) -> KeyPolicy {
        self.config.policy
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    pub fn interner(&self) -> &SymbolInterner {
        &self.interner
    }

    /// Forget every interned symbol. Trees already produced are unaffected.
    pub fn clear_interned(&self) {
        self.interner.clear();
    }

    fn interner_full(&self) -> bool {
        self.config
            .max_interned
            .is_some_and(|bound| self.interner.len() >= bound)
    }

    fn convert(&self, key: &Key) -> Result<Key, KeySkipped> {
        let policy = self.config.policy;
        if !self.config.intern_symbols {
            return policy.apply_uninterned(key);
        }
        if !self.interner_full() {
            return policy.apply(key, &self.interner);
        }
        // Full table: reuse what is already there, never add.
        policy.apply_uninterned(key).map(|converted| match converted {
            Key::Sym(sym) => Key::Sym(self.interner.get(sym.as_str()).unwrap_or(sym)),
            other => other,
        })
    }

    fn check_depth(&self, tree: &Tree) -> Result<(), RewriteError> {
        let Some(limit) = self.config.max_depth else {
            return Ok(());
        };
        let depth = tree.depth();
        if depth > limit {
            warn!(depth, limit, policy = %self.config.policy, "rejecting tree above depth limit");
            return Err(RewriteError::UnsupportedStructure { depth, limit });
        }
        Ok(())
    }

    /// Copy-returning rewrite.
    pub fn rewrite(&self, tree: &Tree) -> Result<Tree, RewriteError> {
        self.check_depth(tree)?;
        debug!(policy = %self.config.policy, nodes = tree.node_count(), "rewriting keys");
        Ok(rewrite_keys(tree, &|key: &Key| self.convert(key)))
    }

    /// Consuming rewrite. On error the tree is dropped; use
    /// [`Rewriter::rewrite_in_place`] to keep it.
    pub fn rewrite_owned(&self, tree: Tree) -> Result<Tree, RewriteError> {
        self.check_depth(&tree)?;
        debug!(policy = %self.config.policy, nodes = tree.node_count(), "rewriting keys");
        Ok(rewrite_keys_owned(tree, &|key: &Key| self.convert(key)))
    }

    /// In-place rewrite. Every check runs before `tree` is touched.
    pub fn rewrite_in_place(&self, tree: &mut Tree) -> Result<(), RewriteError> {
        ensure_container(tree)?;
        self.check_depth(tree)?;
        debug!(policy = %self.config.policy, nodes = tree.node_count(), "rewriting keys in place");
        rewrite_keys_in_place(tree, &|key: &Key| self.convert(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scalar;

    fn map<const N: usize>(entries: [(Key, Tree); N]) -> Tree {
        Tree::Map(KeyMap::from(entries))
    }

    fn seq<const N: usize>(items: [Tree; N]) -> Tree {
        Tree::Seq(items.into())
    }

    fn payload() -> Tree {
        map([
            (Key::from("Effective Date"), Tree::from("4/8/2016")),
            (Key::from("Amount"), Tree::from("20.00")),
            (
                Key::from("Recursive-Item"),
                map([
                    (Key::from("one two"), seq([Tree::from(1), Tree::from(2)])),
                    (Key::from("Boolean-here"), Tree::from(true)),
                ]),
            ),
        ])
    }

    #[test]
    fn symbol_policy_keeps_key_text() {
        let expected = map([
            (Key::sym("Effective Date"), Tree::from("4/8/2016")),
            (Key::sym("Amount"), Tree::from("20.00")),
            (
                Key::sym("Recursive-Item"),
                map([
                    (Key::sym("one two"), seq([Tree::from(1), Tree::from(2)])),
                    (Key::sym("Boolean-here"), Tree::from(true)),
                ]),
            ),
        ]);
        assert_eq!(rewrite_keys_to_symbol(&payload()), expected);
    }

    #[test]
    fn normalized_symbol_policy() {
        let expected = map([
            (Key::sym("effective_date"), Tree::from("4/8/2016")),
            (Key::sym("amount"), Tree::from("20.00")),
            (
                Key::sym("recursive_item"),
                map([
                    (Key::sym("one_two"), seq([Tree::from(1), Tree::from(2)])),
                    (Key::sym("boolean_here"), Tree::from(true)),
                ]),
            ),
        ]);
        assert_eq!(rewrite_keys_to_normalized_symbol(&payload()), expected);
    }

    #[test]
    fn normalized_string_policy() {
        let expected = map([
            (Key::from("effective_date"), Tree::from("4/8/2016")),
            (Key::from("amount"), Tree::from("20.00")),
            (
                Key::from("recursive_item"),
                map([
                    (Key::from("one_two"), seq([Tree::from(1), Tree::from(2)])),
                    (Key::from("boolean_here"), Tree::from(true)),
                ]),
            ),
        ]);
        assert_eq!(rewrite_keys_to_normalized_string(&payload()), expected);
    }

    #[test]
    fn mixed_string_and_symbol_keys_in_sequences() {
        let input = seq([map([
            (Key::from("a"), seq([Tree::from("a1"), Tree::from("a2")])),
            (
                Key::from("b"),
                seq([map([
                    (Key::from("c"), seq([Tree::from("c1"), Tree::from("c2")])),
                    (Key::sym("d"), seq([Tree::empty_map()])),
                ])]),
            ),
        ])]);
        let expected = seq([map([
            (Key::sym("a"), seq([Tree::from("a1"), Tree::from("a2")])),
            (
                Key::sym("b"),
                seq([map([
                    (Key::sym("c"), seq([Tree::from("c1"), Tree::from("c2")])),
                    (Key::sym("d"), seq([Tree::empty_map()])),
                ])]),
            ),
        ])]);
        assert_eq!(rewrite_keys_to_symbol(&input), expected);

        let to_strings = rewrite_keys_to_normalized_string(&expected);
        assert_eq!(
            to_strings.as_seq().unwrap()[0].as_map().unwrap().keys().collect::<Vec<_>>(),
            vec![&Key::from("a"), &Key::from("b")]
        );
    }

    #[test]
    fn empty_containers_survive() {
        for tree in [Tree::empty_map(), seq([]), seq([Tree::empty_map()]), seq([Tree::null()])] {
            for policy in KeyPolicy::ALL {
                assert_eq!(rewrite_with_policy(&tree, policy), tree);
            }
        }
    }

    #[test]
    fn leaves_pass_through() {
        for leaf in [Tree::null(), Tree::from(1.5), Tree::from("text"), Tree::from(false)] {
            assert_eq!(rewrite_keys_to_normalized_symbol(&leaf), leaf);
        }
    }

    #[test]
    fn incompatible_keys_are_kept() {
        let input = map([
            (Key::Bool(true), Tree::from("yes")),
            (Key::from("Some Key"), Tree::from(1)),
            (Key::Int(3), map([(Key::from("Inner-Key"), Tree::null())])),
            (Key::Null, Tree::from(2)),
        ]);
        let expected = map([
            (Key::Bool(true), Tree::from("yes")),
            (Key::from("some_key"), Tree::from(1)),
            (Key::Int(3), map([(Key::from("inner_key"), Tree::null())])),
            (Key::Null, Tree::from(2)),
        ]);
        assert_eq!(rewrite_keys_to_normalized_string(&input), expected);
    }

    #[test]
    fn colliding_keys_keep_first_slot_and_last_value() {
        let input = map([
            (Key::from("Total Amount"), Tree::from(1)),
            (Key::from("other"), Tree::from(2)),
            (Key::from("total-amount"), Tree::from(3)),
        ]);
        let expected = map([
            (Key::from("total_amount"), Tree::from(3)),
            (Key::from("other"), Tree::from(2)),
        ]);
        assert_eq!(rewrite_keys_to_normalized_string(&input), expected);
    }

    #[test]
    fn copy_leaves_input_untouched_and_shares_leaf_text() {
        let input = payload();
        let snapshot = input.clone();
        let output = rewrite_keys_to_normalized_symbol(&input);
        assert_eq!(input, snapshot);

        let before = input.as_map().unwrap().get(&Key::from("Amount")).unwrap();
        let after = output.as_map().unwrap().get(&Key::sym("amount")).unwrap();
        match (before, after) {
            (Tree::Leaf(Scalar::Str(a)), Tree::Leaf(Scalar::Str(b))) => {
                assert!(std::sync::Arc::ptr_eq(a, b))
            }
            other => panic!("unexpected leaves: {other:?}"),
        }
    }

    #[test]
    fn in_place_matches_copy() {
        let original = payload();
        let mut tree = original.clone();
        rewrite_keys_to_normalized_string_in_place(&mut tree).unwrap();
        assert_eq!(tree, rewrite_keys_to_normalized_string(&original));
        assert_ne!(tree, original);

        let mut list = seq([payload(), payload()]);
        rewrite_keys_to_normalized_symbol_in_place(&mut list).unwrap();
        assert_eq!(list, rewrite_keys_to_normalized_symbol(&seq([payload(), payload()])));

        let mut symbols = payload();
        rewrite_keys_to_symbol_in_place(&mut symbols).unwrap();
        assert_eq!(symbols, rewrite_keys_to_symbol(&payload()));
    }

    #[test]
    fn in_place_rejects_leaves_without_mutation() {
        let mut leaf = Tree::from("Not A Container");
        let err = rewrite_keys_to_symbol_in_place(&mut leaf).unwrap_err();
        assert_eq!(err, RewriteError::InvalidMutationTarget { found: "leaf" });
        assert_eq!(leaf, Tree::from("Not A Container"));
    }

    #[test]
    fn custom_transform_threads_through_recursion() {
        let upper = |key: &Key| match key {
            Key::Str(s) => Ok(Key::Str(s.to_uppercase())),
            other => Err(KeySkipped::new(other, "upper")),
        };
        let input = seq([map([(Key::from("a"), map([(Key::from("b"), Tree::null())]))])]);
        let expected = seq([map([(Key::from("A"), map([(Key::from("B"), Tree::null())]))])]);
        assert_eq!(rewrite_keys(&input, &upper), expected);
        assert_eq!(rewrite_keys_owned(input, &upper), expected);
    }

    #[test]
    fn rewriter_interns_symbols_across_calls() {
        let rewriter = Rewriter::new(KeyPolicy::NormalizedSymbol);
        let first = rewriter.rewrite(&payload()).unwrap();
        let second = rewriter.rewrite_owned(payload()).unwrap();
        assert_eq!(first, second);

        let key_of = |tree: &Tree| match tree.as_map().unwrap().keys().next() {
            Some(Key::Sym(sym)) => sym.clone(),
            other => panic!("expected symbol key, got {other:?}"),
        };
        assert!(key_of(&first).ptr_eq(&key_of(&second)));
        assert_eq!(rewriter.interner().len(), 5);
    }

    #[test]
    fn rewriter_without_interning_still_matches() {
        let rewriter = Rewriter::with_config(RewriteConfig {
            intern_symbols: false,
            ..RewriteConfig::default()
        });
        assert_eq!(
            rewriter.rewrite(&payload()).unwrap(),
            rewrite_keys_to_normalized_symbol(&payload())
        );
        assert!(rewriter.interner().is_empty());
    }

    #[test]
    fn rewriter_enforces_depth_limit() {
        let rewriter = Rewriter::with_config(RewriteConfig {
            policy: KeyPolicy::NormalizedString,
            max_depth: Some(1),
            ..RewriteConfig::default()
        });
        let mut tree = payload();
        let err = rewriter.rewrite_in_place(&mut tree).unwrap_err();
        assert_eq!(err, RewriteError::UnsupportedStructure { depth: 3, limit: 1 });
        assert_eq!(tree, payload());

        let flat = map([(Key::from("A B"), Tree::from(1))]);
        assert_eq!(
            rewriter.rewrite(&flat).unwrap(),
            map([(Key::from("a_b"), Tree::from(1))])
        );
    }

    #[test]
    fn rewriter_in_place_checks_target_first() {
        let rewriter = Rewriter::new(KeyPolicy::Symbol);
        let mut leaf = Tree::from(4);
        assert_eq!(
            rewriter.rewrite_in_place(&mut leaf),
            Err(RewriteError::InvalidMutationTarget { found: "leaf" })
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: RewriteConfig = serde_json::from_str(r#"{"max_depth": 64}"#).unwrap();
        assert_eq!(config.max_depth, Some(64));
        assert_eq!(config.policy, KeyPolicy::NormalizedSymbol);
        assert!(config.intern_symbols);

        let config: RewriteConfig =
            serde_json::from_str(r#"{"policy": "normalized-string"}"#).unwrap();
        assert_eq!(config.policy, KeyPolicy::NormalizedString);
    }

    #[test]
    fn interning_stops_at_configured_bound() {
        let rewriter = Rewriter::with_config(RewriteConfig {
            policy: KeyPolicy::NormalizedSymbol,
            max_interned: Some(3),
            ..RewriteConfig::default()
        });
        for i in 0..10 {
            let input = map([(Key::from(format!("Key {i}")), Tree::from(i))]);
            let out = rewriter.rewrite(&input).unwrap();
            assert_eq!(out, map([(Key::sym(&format!("key_{i}")), Tree::from(i))]));
        }
        assert_eq!(rewriter.interner().len(), 3);

        // Symbols interned before the bound are still shared.
        let again = rewriter.rewrite(&map([(Key::from("KEY 0"), Tree::null())])).unwrap();
        match again.as_map().unwrap().keys().next() {
            Some(Key::Sym(sym)) => {
                assert!(sym.ptr_eq(&rewriter.interner().get("key_0").unwrap()))
            }
            other => panic!("expected symbol key, got {other:?}"),
        };
    }

    #[test]
    fn default_config_bounds_the_table() {
        let rewriter = Rewriter::new(KeyPolicy::Symbol);
        for i in 0..(DEFAULT_MAX_INTERNED + 100) {
            let input = map([(Key::from(format!("k{i}")), Tree::null())]);
            rewriter.rewrite_owned(input).unwrap();
        }
        assert_eq!(rewriter.interner().len(), DEFAULT_MAX_INTERNED);
    }

    #[test]
    fn clear_interned_resets_the_table() {
        let rewriter = Rewriter::new(KeyPolicy::NormalizedSymbol);
        let first = rewriter.rewrite(&payload()).unwrap();
        assert_eq!(rewriter.interner().len(), 5);

        rewriter.clear_interned();
        assert!(rewriter.interner().is_empty());

        let second = rewriter.rewrite(&payload()).unwrap();
        assert_eq!(first, second);
        assert_eq!(rewriter.interner().len(), 5);
    }
}
