//! Predicate queries.
//!
//! A [`Predicate`] is a tree of field tests combined with `&`, `|` and `!`.
//! Predicates are built with [`Query`] and have structural equality and
//! hashing, so two independently built but identical predicates share one
//! entry in a table's result cache.
//!
//! ```rust
//! use flata_core::query::field;
//!
//! let adults = field("age").ge(18) & !field("name").eq("root");
//! let again = field("age").ge(18) & !field("name").eq("root");
//! assert_eq!(adults, again);
//! ```

mod builder;
mod value;

pub use builder::{field, Query};
pub use value::{Collection, CompareOp, Operand, Pattern};

use crate::document::Fields;
use serde_json::Value;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use value::{loose_eq, sequence_elements};

/// Path from a document's root to a nested field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Creates a path from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns the path's segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Resolves the path against a document.
    ///
    /// Returns `None` if any segment is missing or an intermediate value is
    /// not an object. An empty path resolves to nothing.
    #[must_use]
    pub fn resolve<'a>(&self, doc: &'a Fields) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        rest.iter()
            .try_fold(doc.get(first)?, |value, segment| value.as_object()?.get(segment))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A test applied to the value found at a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Test {
    /// Compares the value with an operand.
    Compare(CompareOp, Operand),
    /// Passes whenever the path resolves.
    Exists,
    /// Regular expression over a string value.
    Regex(Pattern),
    /// Some element of the value is a member of the collection.
    Any(Collection),
    /// Every element of the collection is in the value. On a string value,
    /// every character of the collection must occur in the string.
    All(Collection),
}

impl Test {
    fn passes(&self, value: &Value) -> bool {
        match self {
            Self::Compare(op, operand) => op.apply(value, operand.value()),
            Self::Exists => true,
            Self::Regex(pattern) => value.as_str().is_some_and(|s| pattern.is_match(s)),
            Self::Any(collection) => sequence_elements(value)
                .is_some_and(|items| items.iter().any(|item| collection.contains(item))),
            Self::All(collection) => match value {
                Value::Array(items) => collection
                    .elements()
                    .iter()
                    .all(|item| items.iter().any(|x| loose_eq(x, item))),
                Value::String(text) => collection
                    .chars()
                    .is_some_and(|chars| chars.iter().all(|c| text.contains(*c))),
                _ => false,
            },
        }
    }
}

/// A boolean condition over a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// A test on one field. False whenever the path does not resolve.
    Field {
        /// Where the tested value lives.
        path: FieldPath,
        /// What is checked.
        test: Test,
    },
    /// Both sides hold.
    And(Box<Predicate>, Box<Predicate>),
    /// Either side holds.
    Or(Box<Predicate>, Box<Predicate>),
    /// The inner predicate does not hold.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Evaluates the predicate against a document's fields.
    #[must_use]
    pub fn evaluate(&self, doc: &Fields) -> bool {
        match self {
            Self::Field { path, test } => path.resolve(doc).is_some_and(|value| test.passes(value)),
            Self::And(lhs, rhs) => lhs.evaluate(doc) && rhs.evaluate(doc),
            Self::Or(lhs, rhs) => lhs.evaluate(doc) || rhs.evaluate(doc),
            Self::Not(inner) => !inner.evaluate(doc),
        }
    }

    /// Returns a predicate that holds when both `self` and `other` hold.
    #[must_use]
    pub fn and(self, other: Predicate) -> Predicate {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Returns a predicate that holds when `self` or `other` holds.
    #[must_use]
    pub fn or(self, other: Predicate) -> Predicate {
        Self::Or(Box::new(self), Box::new(other))
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        self.and(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        self.or(rhs)
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Self::Not(Box::new(self))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { path, test } => match test {
                Test::Compare(op, operand) => write!(f, "{path} {op} {operand}"),
                Test::Exists => write!(f, "exists({path})"),
                Test::Regex(pattern) => write!(f, "{path} ~ {pattern}"),
                Test::Any(collection) => write!(f, "any({path}, {collection})"),
                Test::All(collection) => write!(f, "all({path}, {collection})"),
            },
            Self::And(lhs, rhs) => write!(f, "({lhs} & {rhs})"),
            Self::Or(lhs, rhs) => write!(f, "({lhs} | {rhs})"),
            Self::Not(inner) => write!(f, "!({inner})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn path_resolution() {
        let d = doc(json!({"a": {"b": {"c": 1}}, "x": 2}));
        assert_eq!(FieldPath::new(["a", "b", "c"]).resolve(&d), Some(&json!(1)));
        assert_eq!(FieldPath::new(["x", "y"]).resolve(&d), None);
        assert_eq!(FieldPath::new(["missing"]).resolve(&d), None);
        assert_eq!(FieldPath::new(Vec::<String>::new()).resolve(&d), None);
    }

    #[test]
    fn missing_path_fails_every_test() {
        let d = doc(json!({"other": 1}));
        assert!(!field("val").eq(1).evaluate(&d));
        assert!(!field("val").ne(1).evaluate(&d));
        assert!(!field("val").exists().evaluate(&d));
        assert!(!field("val").all(Vec::<i32>::new()).evaluate(&d));
        assert!((!field("val").eq(1)).evaluate(&d));
    }

    #[test]
    fn combinators() {
        let d = doc(json!({"val1": 1, "val2": 2}));
        let one = field("val1").eq(1);
        let two = field("val2").eq(2);
        let wrong = field("val2").eq(3);

        assert!((one.clone() & two.clone()).evaluate(&d));
        assert!(!(one.clone() & wrong.clone()).evaluate(&d));
        assert!((wrong.clone() | one.clone()).evaluate(&d));
        assert!(!(!one.clone()).evaluate(&d));
        assert!(one.clone().and(two).or(wrong).evaluate(&d));
    }

    #[test]
    fn any_on_lists_and_strings() {
        let q = field("followers").any(["don", "greg"]);
        assert!(q.evaluate(&doc(json!({"followers": ["don", "john"]}))));
        assert!(!q.evaluate(&doc(json!({"followers": ["annie"]}))));
        assert!(!q.evaluate(&doc(json!({"followers": 1}))));

        let chars = field("name").any("xyz");
        assert!(chars.evaluate(&doc(json!({"name": "zed"}))));
        assert!(!chars.evaluate(&doc(json!({"name": "abc"}))));
    }

    #[test]
    fn all_on_lists_and_strings() {
        let q = field("followers").all(["don", "john"]);
        assert!(q.evaluate(&doc(json!({"followers": ["don", "john", "greg"]}))));
        assert!(!q.evaluate(&doc(json!({"followers": ["don", "greg"]}))));

        let chars = field("name").all("ab");
        assert!(chars.evaluate(&doc(json!({"name": "bat"}))));
        assert!(!chars.evaluate(&doc(json!({"name": "cat"}))));

        // Character coverage, not substring containment.
        let words = field("name").all(["ab", "t"]);
        assert!(words.evaluate(&doc(json!({"name": "bta"}))));
        assert!(!field("name").all([1]).evaluate(&doc(json!({"name": "1"}))));
    }

    #[test]
    fn all_with_empty_collection_holds_for_sequences() {
        let q = field("list").all(Vec::<i32>::new());
        assert!(q.evaluate(&doc(json!({"list": []}))));
        assert!(!q.evaluate(&doc(json!({"list": 4}))));
    }

    #[test]
    fn regex_only_applies_to_strings() {
        let q = field("val").search("1").unwrap();
        assert!(q.evaluate(&doc(json!({"val": "a1"}))));
        assert!(!q.evaluate(&doc(json!({"val": 1}))));
    }

    #[test]
    fn nested_paths() {
        let q = Query::new().field("a").field("b").eq("x");
        assert!(q.evaluate(&doc(json!({"a": {"b": "x"}}))));
        assert!(!q.evaluate(&doc(json!({"a": "b"}))));
    }

    #[test]
    fn display_is_readable() {
        let q = field("a").eq(1) & !field("b").exists();
        assert_eq!(q.to_string(), "(a == 1 & !(exists(b)))");
    }
}
