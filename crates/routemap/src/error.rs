//! Error types for template compilation, route registration and URL generation.
//!
//! Matching never produces an error: an unrecognized path is a plain `None`.

use thiserror::Error;

/// Defects found while compiling a path template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `{` without its `}` (or the reverse), reported at the byte offset
    #[error("unbalanced braces at byte {0}")]
    UnbalancedBraces(usize),

    /// Two variables with no literal text between them cannot be bounded
    #[error("variables `{first}` and `{second}` are adjacent with no literal separator")]
    AmbiguousAdjacentVariables { first: String, second: String },

    #[error("variable `{0}` appears more than once")]
    DuplicateVariable(String),

    #[error("`{0}` is not a valid variable name")]
    InvalidVariableName(String),

    #[error("constraint `{constraint}` on `{name}` is not a valid pattern: {reason}")]
    InvalidConstraint {
        name: String,
        constraint: String,
        reason: String,
    },

    /// `{.format}` may only close the template
    #[error("format suffix `{0}` must be the last element of the template")]
    MisplacedFormat(String),

    #[error("compiled matcher rejected: {0}")]
    Regex(String),
}

/// Errors surfaced by [`Mapper`](crate::Mapper) and [`SubMapper`](crate::SubMapper)
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("failed to compile template `{template}`")]
    PatternCompile {
        template: String,
        #[source]
        source: PatternError,
    },

    #[error("a route named `{0}` is already registered")]
    DuplicateRouteName(String),

    #[error("no route found for {0}")]
    NoRouteFound(String),

    #[error("template `{template}` requires parameter `{parameter}`")]
    MissingParameter { template: String, parameter: String },

    #[error("value `{value}` for `{parameter}` does not satisfy its constraint in `{template}`")]
    InvalidParameter {
        template: String,
        parameter: String,
        value: String,
    },

    #[error("unknown resource action `{0}`")]
    UnknownAction(String),
}

pub type Result<T> = std::result::Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_pattern_compile_keeps_source() {
        let err = RouteError::PatternCompile {
            template: "/a/{b".to_string(),
            source: PatternError::UnbalancedBraces(3),
        };
        assert_eq!(err.to_string(), "failed to compile template `/a/{b`");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("unbalanced braces at byte 3".to_string())
        );
    }

    #[test]
    fn test_missing_parameter_message() {
        let err = RouteError::MissingParameter {
            template: "/users/{id}".to_string(),
            parameter: "id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "template `/users/{id}` requires parameter `id`"
        );
    }
}
