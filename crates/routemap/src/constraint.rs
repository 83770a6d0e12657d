//! Constraints attached to template variables
//!
//! A constraint is the sub-pattern a variable's text must match. Common
//! shapes have short names (`{id:int}`); anything else is taken verbatim as a
//! regular expression fragment (`{year:\d{4}}`).

use regex::{Regex, RegexBuilder};

/// Sub-pattern used when a variable declares no constraint
pub const DEFAULT_SEGMENT: &str = "[^/]+";

/// Default sub-pattern for a variable that can end up right before a format
/// suffix
pub const DEFAULT_SEGMENT_BEFORE_FORMAT: &str = "[^/.]+";

/// Sub-pattern used for a format suffix without a constraint
pub const DEFAULT_FORMAT: &str = "[^/.]+";

const UUID_PATTERN: &str =
    "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

/// Validation rule for a variable segment
///
/// # Examples
///
/// ```
/// use routemap::ParameterConstraint;
///
/// assert_eq!(ParameterConstraint::parse("int"), ParameterConstraint::Int);
/// assert_eq!(ParameterConstraint::parse("*"), ParameterConstraint::Path);
/// assert_eq!(
///     ParameterConstraint::parse(r"\d{4}"),
///     ParameterConstraint::Pattern(r"\d{4}".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterConstraint {
    /// `int`: one or more ASCII digits
    Int,
    /// `alpha`: ASCII letters
    Alpha,
    /// `alphanum`: ASCII letters and digits
    AlphaNum,
    /// `slug`: lowercase words joined by single dashes
    Slug,
    /// `uuid`: canonical hyphenated form
    Uuid,
    /// `path` or `*`: the rest of the path, slashes included
    Path,
    /// Raw regular-expression fragment
    Pattern(String),
}

impl ParameterConstraint {
    /// Parses the text after the `:` of a variable
    pub fn parse(raw: &str) -> Self {
        match raw {
            "int" => Self::Int,
            "alpha" => Self::Alpha,
            "alphanum" => Self::AlphaNum,
            "slug" => Self::Slug,
            "uuid" => Self::Uuid,
            "path" | "*" => Self::Path,
            other => Self::Pattern(other.to_string()),
        }
    }

    /// The regex fragment this constraint expands to
    pub fn regex(&self) -> &str {
        match self {
            Self::Int => r"\d+",
            Self::Alpha => "[A-Za-z]+",
            Self::AlphaNum => "[A-Za-z0-9]+",
            Self::Slug => "[a-z0-9]+(?:-[a-z0-9]+)*",
            Self::Uuid => UUID_PATTERN,
            Self::Path => ".+",
            Self::Pattern(raw) => raw,
        }
    }

    /// Compiles the fragment anchored on both ends, for validating whole values
    pub fn compile_anchored(&self) -> Result<Regex, regex::Error> {
        self.compile_anchored_with(false)
    }

    /// Same as [`compile_anchored`](Self::compile_anchored), optionally
    /// ignoring case like a case-insensitive matcher does
    pub fn compile_anchored_with(&self, case_insensitive: bool) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&format!("^(?:{})$", self.regex()))
            .case_insensitive(case_insensitive)
            .build()
    }
}
