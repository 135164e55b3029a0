//! Tree data model: mappings, sequences, and leaves.

use keyfold_ident::Symbol;
use std::fmt;
use std::sync::Arc;

use crate::key_map::KeyMap;

// ============================================================================
// Keys
// ============================================================================

/// A mapping key.
///
/// String and symbol keys are distinct: `Key::Str("a")` and `Key::Sym(a)`
/// can live side by side in the same map.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Sym(Symbol),
}

impl Key {
    /// Symbol key, verbatim.
    pub fn sym(text: &str) -> Self {
        Key::Sym(Symbol::from(text))
    }

    /// Variant name, used in logs and skip reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Key::Null => "null",
            Key::Bool(_) => "bool",
            Key::Int(_) => "int",
            Key::Str(_) => "string",
            Key::Sym(_) => "symbol",
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Null => f.write_str("null"),
            Key::Bool(b) => write!(f, "{b}"),
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => write!(f, "{s:?}"),
            Key::Sym(s) => write!(f, "{s:?}"),
        }
    }
}

/// String form used when a key has to become text (JSON object keys).
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Null => Ok(()),
            Key::Bool(b) => write!(f, "{b}"),
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => f.write_str(s),
            Key::Sym(s) => f.write_str(s.as_str()),
        }
    }
}

impl From<&str> for Key {
    fn from(text: &str) -> Self {
        Key::Str(text.to_string())
    }
}

impl From<String> for Key {
    fn from(text: String) -> Self {
        Key::Str(text)
    }
}

impl From<Symbol> for Key {
    fn from(sym: Symbol) -> Self {
        Key::Sym(sym)
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

// ============================================================================
// Leaves
// ============================================================================

/// A leaf value. Cloning never copies text.
#[derive(Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Sym(Symbol),
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x:?}"),
            Scalar::Str(s) => write!(f, "{:?}", &**s),
            Scalar::Sym(s) => write!(f, "{s:?}"),
        }
    }
}

// ============================================================================
// Tree
// ============================================================================

/// A nested value: mapping, sequence, or leaf.
#[derive(Clone, PartialEq)]
pub enum Tree {
    Map(KeyMap),
    Seq(Vec<Tree>),
    Leaf(Scalar),
}

impl Tree {
    pub fn null() -> Self {
        Tree::Leaf(Scalar::Null)
    }

    pub fn empty_map() -> Self {
        Tree::Map(KeyMap::new())
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Tree::Map(_))
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, Tree::Seq(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    pub fn as_map(&self) -> Option<&KeyMap> {
        match self {
            Tree::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Tree]> {
        match self {
            Tree::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// "map", "seq" or "leaf".
    pub fn kind(&self) -> &'static str {
        match self {
            Tree::Map(_) => "map",
            Tree::Seq(_) => "seq",
            Tree::Leaf(_) => "leaf",
        }
    }

    /// Nesting depth: a leaf is 0, an empty container is 1.
    ///
    /// Walks with an explicit stack so arbitrarily deep input can be measured
    /// before anything recursive touches it.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Tree, usize)> = vec![(self, 0)];
        while let Some((node, level)) = stack.pop() {
            match node {
                Tree::Map(map) => {
                    deepest = deepest.max(level + 1);
                    stack.extend(map.values().map(|child| (child, level + 1)));
                }
                Tree::Seq(items) => {
                    deepest = deepest.max(level + 1);
                    stack.extend(items.iter().map(|child| (child, level + 1)));
                }
                Tree::Leaf(_) => deepest = deepest.max(level),
            }
        }
        deepest
    }

    /// Total number of nodes (containers and leaves).
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            match node {
                Tree::Map(map) => stack.extend(map.values()),
                Tree::Seq(items) => stack.extend(items.iter()),
                Tree::Leaf(_) => {}
            }
        }
        count
    }
}

impl Default for Tree {
    fn default() -> Self {
        Tree::null()
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Map(map) => fmt::Debug::fmt(map, f),
            Tree::Seq(items) => f.debug_list().entries(items).finish(),
            Tree::Leaf(scalar) => fmt::Debug::fmt(scalar, f),
        }
    }
}

impl From<Scalar> for Tree {
    fn from(scalar: Scalar) -> Self {
        Tree::Leaf(scalar)
    }
}

impl From<KeyMap> for Tree {
    fn from(map: KeyMap) -> Self {
        Tree::Map(map)
    }
}

impl From<Vec<Tree>> for Tree {
    fn from(items: Vec<Tree>) -> Self {
        Tree::Seq(items)
    }
}

impl From<bool> for Tree {
    fn from(b: bool) -> Self {
        Tree::Leaf(Scalar::Bool(b))
    }
}

impl From<i32> for Tree {
    fn from(i: i32) -> Self {
        Tree::Leaf(Scalar::Int(i64::from(i)))
    }
}

impl From<i64> for Tree {
    fn from(i: i64) -> Self {
        Tree::Leaf(Scalar::Int(i))
    }
}

impl From<f64> for Tree {
    fn from(x: f64) -> Self {
        Tree::Leaf(Scalar::Float(x))
    }
}

impl From<&str> for Tree {
    fn from(text: &str) -> Self {
        Tree::Leaf(Scalar::Str(Arc::from(text)))
    }
}

impl From<String> for Tree {
    fn from(text: String) -> Self {
        Tree::Leaf(Scalar::Str(Arc::from(text)))
    }
}

impl From<Symbol> for Tree {
    fn from(sym: Symbol) -> Self {
        Tree::Leaf(Scalar::Sym(sym))
    }
}
