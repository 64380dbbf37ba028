//! Table configuration.

/// Name of the identity field when none is configured.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Number of cached query results when none is configured.
pub const DEFAULT_CACHE_SIZE: usize = 10;

/// Options honored when a table is first created.
///
/// Options passed for a name that is already open are ignored: the first
/// call wins for the lifetime of the database handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Field that holds each document's identity.
    pub id_field: String,

    /// Maximum number of query results kept in the table's cache.
    pub cache_size: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl TableOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the identity field name.
    #[must_use]
    pub fn id_field(mut self, name: impl Into<String>) -> Self {
        self.id_field = name.into();
        self
    }

    /// Sets the query cache capacity.
    #[must_use]
    pub const fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }
}
