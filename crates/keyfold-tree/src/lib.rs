//! Recursive key rewriting for keyfold
//!
//! Rewrites the keys of nested map/sequence trees into one naming
//! convention while leaving shape and leaf values alone:
//! - `Tree`: mapping (`KeyMap`, insertion ordered), sequence, or leaf
//! - `KeyPolicy`: symbol, normalized symbol, or normalized string keys
//! - copy-returning, consuming, and in-place rewrites for each policy
//! - `Rewriter`: configured rewriting with symbol interning and a depth limit
//!
//! ```
//! use keyfold_tree::{parse_json, rewrite_keys_to_normalized_string};
//!
//! let tree = parse_json(r#"{"Effective Date": "4/8/2016"}"#).unwrap();
//! let out = rewrite_keys_to_normalized_string(&tree);
//! assert_eq!(out.to_json(), serde_json::json!({"effective_date": "4/8/2016"}));
//! ```

pub mod json;
pub mod key_map;
pub mod model;
pub mod policy;
pub mod rewrite;

pub use json::{normalize_json_keys, parse_json};
pub use key_map::KeyMap;
pub use keyfold_ident::{Symbol, SymbolInterner};
pub use model::{Key, Scalar, Tree};
pub use policy::{KeyPolicy, KeySkipped, UnknownKeyPolicy};
pub use rewrite::{
    rewrite_keys, rewrite_keys_in_place, rewrite_keys_owned, rewrite_keys_to_normalized_string,
    rewrite_keys_to_normalized_string_in_place, rewrite_keys_to_normalized_symbol,
    rewrite_keys_to_normalized_symbol_in_place, rewrite_keys_to_symbol,
    rewrite_keys_to_symbol_in_place, RewriteConfig, RewriteError, Rewriter, DEFAULT_MAX_INTERNED,
};
