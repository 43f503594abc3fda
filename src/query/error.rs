use thiserror::Error;

/// Errors raised while interpreting a query specification.
///
/// Well-typed queries cannot fail; these only occur when a query is parsed
/// from loosely typed input such as command-line flags or JSON.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unknown sort option: {0}")]
    UnknownSortOption(String),

    #[error("Unknown date filter: {0}")]
    UnknownDateFilter(String),

    #[error("Unknown search scope: {0}")]
    UnknownSearchScope(String),

    #[error("Unknown aggregation: {0}")]
    UnknownAggregation(String),

    #[error("Unknown weekday: {0}")]
    UnknownWeekday(String),
}
