use super::value::{Collection, CompareOp, Operand, Pattern};
use super::{FieldPath, Predicate, Test};
use crate::error::CoreResult;
use serde_json::Value;

/// Builder that names a field path and turns it into a [`Predicate`].
///
/// ```rust
/// use flata_core::query::{field, Query};
///
/// let by_name = field("name").eq("John");
/// let nested = Query::new().field("address").field("city").eq("Oslo");
/// let prefix = field("name").matches("J").unwrap();
/// # let _ = (by_name, nested, prefix);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    path: Vec<String>,
}

/// Starts a query on the top-level field `name`.
#[must_use]
pub fn field(name: impl Into<String>) -> Query {
    Query::new().field(name)
}

impl Query {
    /// Creates a query with an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query from a full path.
    #[must_use]
    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Descends into the field `name`.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.path.push(name.into());
        self
    }

    /// Builds a predicate applying `test` at this path.
    #[must_use]
    pub fn test(self, test: Test) -> Predicate {
        Predicate::Field {
            path: FieldPath(self.path),
            test,
        }
    }

    fn compare(self, op: CompareOp, operand: impl Into<Value>) -> Predicate {
        self.test(Test::Compare(op, Operand(operand.into())))
    }

    /// Field equals `operand`.
    #[must_use]
    pub fn eq(self, operand: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Eq, operand)
    }

    /// Field exists and differs from `operand`.
    #[must_use]
    pub fn ne(self, operand: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ne, operand)
    }

    /// Field is less than `operand`.
    #[must_use]
    pub fn lt(self, operand: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Lt, operand)
    }

    /// Field is less than or equal to `operand`.
    #[must_use]
    pub fn le(self, operand: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Le, operand)
    }

    /// Field is greater than `operand`.
    #[must_use]
    pub fn gt(self, operand: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Gt, operand)
    }

    /// Field is greater than or equal to `operand`.
    #[must_use]
    pub fn ge(self, operand: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ge, operand)
    }

    /// Field is present, whatever its value.
    #[must_use]
    pub fn exists(self) -> Predicate {
        self.test(Test::Exists)
    }

    /// Field is a string matching `pattern` at its start.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `pattern` does not compile.
    pub fn matches(self, pattern: &str) -> CoreResult<Predicate> {
        Ok(self.test(Test::Regex(Pattern::new(pattern, true, false)?)))
    }

    /// Like [`Query::matches`], ignoring case.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `pattern` does not compile.
    pub fn matches_ignore_case(self, pattern: &str) -> CoreResult<Predicate> {
        Ok(self.test(Test::Regex(Pattern::new(pattern, true, true)?)))
    }

    /// Field is a string containing a match of `pattern` anywhere.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `pattern` does not compile.
    pub fn search(self, pattern: &str) -> CoreResult<Predicate> {
        Ok(self.test(Test::Regex(Pattern::new(pattern, false, false)?)))
    }

    /// Like [`Query::search`], ignoring case.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `pattern` does not compile.
    pub fn search_ignore_case(self, pattern: &str) -> CoreResult<Predicate> {
        Ok(self.test(Test::Regex(Pattern::new(pattern, false, true)?)))
    }

    /// Some element of the field (list item or character) is in `collection`.
    #[must_use]
    pub fn any(self, collection: impl Into<Collection>) -> Predicate {
        self.test(Test::Any(collection.into()))
    }

    /// Every element of `collection` is contained in the field.
    #[must_use]
    pub fn all(self, collection: impl Into<Collection>) -> Predicate {
        self.test(Test::All(collection.into()))
    }
}
