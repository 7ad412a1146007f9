//! Error types shared by the query builder, the stores, and the sub commands.

/// Errors raised while building, running, or post-processing variant queries.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The variant store rejected or failed to execute a query.
    #[error("query failed: {query}: {message}")]
    Query { query: String, message: String },
    /// A formatted record could not be turned into a sort key.
    #[error("invalid record format: {0}")]
    Format(String),
    /// Caller-provided settings are not usable, e.g., invalid column names.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Per-sample genotype data in the store could not be decoded.
    #[error("could not decode genotype column {column}: {message}")]
    Decode { column: String, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shortcut for wrapping a store-level failure for the query rendered as `query`.
    pub fn query<E: std::fmt::Display>(query: &str, err: E) -> Self {
        Error::Query {
            query: query.to_string(),
            message: err.to_string(),
        }
    }
}
