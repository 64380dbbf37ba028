//! Operands of field tests and the comparison rules between JSON values.

use crate::error::{CoreError, CoreResult};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A JSON value used as the right-hand side of a test.
///
/// Unlike [`Value`], operands are hashable so predicates can key the result
/// cache. Objects hash independently of key order, matching how they compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand(pub Value);

impl Operand {
    /// Returns the wrapped value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl<T: Into<Value>> From<T> for Operand {
    fn from(value: T) -> Self {
        Self(value.into())
    }
}

impl Hash for Operand {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0u8.hash(state),
        Value::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::Number(n) => {
            2u8.hash(state);
            if n.is_f64() {
                // 0.0 == -0.0, so both must hash alike.
                let f = n.as_f64().unwrap_or_default();
                let f = if f == 0.0 { 0.0 } else { f };
                (2u8, f.to_bits()).hash(state);
            } else if let Some(u) = n.as_u64() {
                (0u8, u).hash(state);
            } else if let Some(i) = n.as_i64() {
                (1u8, i).hash(state);
            }
        }
        Value::String(s) => {
            3u8.hash(state);
            s.hash(state);
        }
        Value::Array(items) => {
            4u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(map) => {
            5u8.hash(state);
            map.len().hash(state);
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                key.hash(state);
                hash_value(&map[key], state);
            }
        }
    }
}

/// Comparison operator of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

impl CompareOp {
    /// Applies the operator to a field value and an operand.
    ///
    /// Values of incompatible types are never ordered: every ordering
    /// operator yields `false`, `Eq` yields `false` and `Ne` yields `true`.
    #[must_use]
    pub fn apply(self, field: &Value, operand: &Value) -> bool {
        match self {
            Self::Eq => loose_eq(field, operand),
            Self::Ne => !loose_eq(field, operand),
            Self::Lt => compare(field, operand) == Some(Ordering::Less),
            Self::Le => matches!(
                compare(field, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::Gt => compare(field, operand) == Some(Ordering::Greater),
            Self::Ge => matches!(
                compare(field, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Equality that treats integers and floats as numbers, recursively.
pub(crate) fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare(a, b) == Some(Ordering::Equal),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| loose_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Orders two values of compatible types; `None` when they are incompatible.
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                Some(x.cmp(&y))
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                Some(x.cmp(&y))
            } else {
                x.as_f64()?.partial_cmp(&y.as_f64()?)
            }
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Array(xs), Value::Array(ys)) => {
            for (x, y) in xs.iter().zip(ys) {
                match compare(x, y)? {
                    Ordering::Equal => continue,
                    unequal => return Some(unequal),
                }
            }
            Some(xs.len().cmp(&ys.len()))
        }
        _ => None,
    }
}

/// A compiled regular expression used by `matches` and `search` tests.
///
/// Two patterns are equal when their source, anchoring and case handling
/// are equal.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    anchored: bool,
    ignore_case: bool,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source`.
    ///
    /// An anchored pattern only matches at the start of the text; an
    /// unanchored one matches anywhere.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `source` is not a valid expression.
    pub fn new(source: &str, anchored: bool, ignore_case: bool) -> CoreResult<Self> {
        let expr = if anchored {
            format!("^(?:{source})")
        } else {
            source.to_string()
        };
        let regex = RegexBuilder::new(&expr)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| CoreError::validation(format!("invalid pattern '{source}': {e}")))?;

        Ok(Self {
            source: source.to_string(),
            anchored,
            ignore_case,
            regex,
        })
    }

    /// Returns the expression as written by the caller.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns whether the pattern ignores case.
    #[must_use]
    pub fn ignores_case(&self) -> bool {
        self.ignore_case
    }

    /// Returns whether `text` matches.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.anchored == other.anchored
            && self.ignore_case == other.ignore_case
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.anchored.hash(state);
        self.ignore_case.hash(state);
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source)?;
        if self.ignore_case {
            f.write_str("i")?;
        }
        Ok(())
    }
}

/// The container of an `any` or `all` test.
///
/// A list holds values compared for equality. Text holds a string whose
/// membership test is substring containment and whose elements are its
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    /// A list of values.
    Values(Vec<Operand>),
    /// A string.
    Text(String),
}

impl Collection {
    /// Returns whether `item` is a member of this collection.
    pub(crate) fn contains(&self, item: &Value) -> bool {
        match self {
            Self::Values(values) => values.iter().any(|v| loose_eq(&v.0, item)),
            Self::Text(text) => item.as_str().is_some_and(|s| text.contains(s)),
        }
    }

    /// Returns the characters of every string in the collection.
    ///
    /// `None` if the collection holds a value that is not a string.
    pub(crate) fn chars(&self) -> Option<Vec<char>> {
        match self {
            Self::Text(text) => Some(text.chars().collect()),
            Self::Values(values) => values.iter().try_fold(Vec::new(), |mut chars, v| {
                chars.extend(v.0.as_str()?.chars());
                Some(chars)
            }),
        }
    }

    /// Returns the collection's elements.
    pub(crate) fn elements(&self) -> Vec<Value> {
        match self {
            Self::Values(values) => values.iter().map(|v| v.0.clone()).collect(),
            Self::Text(text) => text.chars().map(|c| Value::String(c.into())).collect(),
        }
    }
}

impl From<&str> for Collection {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Collection {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Collection {
    fn from(values: Vec<T>) -> Self {
        Self::Values(values.into_iter().map(Operand::from).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Collection {
    fn from(values: [T; N]) -> Self {
        Self::Values(values.into_iter().map(Operand::from).collect())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Values(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Returns the elements of a sequence-like field value.
///
/// Arrays yield their items and strings their characters; anything else is
/// not a sequence.
pub(crate) fn sequence_elements(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::String(text) => Some(text.chars().map(|c| Value::String(c.into())).collect()),
        _ => None,
    }
}
