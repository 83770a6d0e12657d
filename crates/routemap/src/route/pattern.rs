//! Placeholder classification for path templates
//!
//! Pure parsing of the text between `{` and `}` into typed segments.
//! All functions are **pure**: same input → same output, no side effects.

use crate::{ParameterConstraint, PatternError};

/// One element of a compiled template
///
/// Functional sum type for matching and generating paths. An ordered
/// `Vec<Segment>` is the parsed form of a template.
///
/// # Examples
///
/// ```
/// use routemap::route::pattern::{classify_placeholder, Segment};
///
/// // Required variable
/// let seg = classify_placeholder("id").unwrap();
/// assert!(matches!(seg, Segment::Variable { optional: false, .. }));
///
/// // Optional variable with constraint
/// let seg = classify_placeholder("page?:int").unwrap();
/// assert!(matches!(seg, Segment::Variable { optional: true, constraint: Some(_), .. }));
///
/// // Format suffix
/// let seg = classify_placeholder(".format").unwrap();
/// assert!(matches!(seg, Segment::FormatSuffix { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text matched verbatim
    Literal(String),
    /// `{name}`, `{name:constraint}`, `{name?}` or `{name?:constraint}`
    Variable {
        name: String,
        constraint: Option<ParameterConstraint>,
        optional: bool,
    },
    /// `{.format}` or `{.format:constraint}`; always optional, always last
    FormatSuffix {
        name: String,
        constraint: Option<ParameterConstraint>,
    },
}

impl Segment {
    /// Variable name carried by this segment, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Variable { name, .. } | Segment::FormatSuffix { name, .. } => Some(name),
        }
    }

    pub fn constraint(&self) -> Option<&ParameterConstraint> {
        match self {
            Segment::Literal(_) => None,
            Segment::Variable { constraint, .. } | Segment::FormatSuffix { constraint, .. } => {
                constraint.as_ref()
            }
        }
    }

    /// Whether generation may leave this segment out
    pub fn is_optional(&self) -> bool {
        match self {
            Segment::Literal(_) => false,
            Segment::Variable { optional, .. } => *optional,
            Segment::FormatSuffix { .. } => true,
        }
    }
}

/// Classifies the inside of a `{...}` placeholder (pure function)
///
/// # Parsing Rules (evaluated in order)
///
/// 1. **Format suffix**: `.name` or `.name:constraint`
/// 2. **Optional variable**: `name?` or `name?:constraint`
/// 3. **Required variable**: `name` or `name:constraint`
///
/// Only the first `:` separates name from constraint, so constraints may
/// contain colons and nested braces.
pub fn classify_placeholder(inner: &str) -> Result<Segment, PatternError> {
    if let Some(format_part) = inner.strip_prefix('.') {
        let (name, constraint) = parse_param_with_constraint(format_part)?;
        return Ok(Segment::FormatSuffix { name, constraint });
    }

    let (head, constraint) = split_constraint(inner);
    let (raw_name, optional) = match head.strip_suffix('?') {
        Some(name) => (name, true),
        None => (head, false),
    };
    let name = validate_name(raw_name)?;
    let constraint = constraint
        .map(|raw| parse_constraint(&name, raw))
        .transpose()?;

    Ok(Segment::Variable {
        name,
        constraint,
        optional,
    })
}

/// Parses parameter name and optional constraint (pure function)
///
/// Maps `"name"` or `"name:constraint"` → `(name, Option<Constraint>)`.
///
/// # Examples
///
/// ```
/// use routemap::route::pattern::parse_param_with_constraint;
/// use routemap::ParameterConstraint;
///
/// let (name, constraint) = parse_param_with_constraint("id").unwrap();
/// assert_eq!(name, "id");
/// assert_eq!(constraint, None);
///
/// let (name, constraint) = parse_param_with_constraint("id:int").unwrap();
/// assert_eq!(name, "id");
/// assert_eq!(constraint, Some(ParameterConstraint::Int));
/// ```
pub fn parse_param_with_constraint(
    param: &str,
) -> Result<(String, Option<ParameterConstraint>), PatternError> {
    let (raw_name, constraint) = split_constraint(param);
    let name = validate_name(raw_name)?;
    let constraint = constraint
        .map(|raw| parse_constraint(&name, raw))
        .transpose()?;
    Ok((name, constraint))
}

/// Checks that a name can serve as a regex capture-group name
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn split_constraint(param: &str) -> (&str, Option<&str>) {
    match param.split_once(':') {
        Some((name, constraint)) => (name, Some(constraint)),
        None => (param, None),
    }
}

fn validate_name(name: &str) -> Result<String, PatternError> {
    if is_valid_name(name) {
        Ok(name.to_string())
    } else {
        Err(PatternError::InvalidVariableName(name.to_string()))
    }
}

fn parse_constraint(name: &str, raw: &str) -> Result<ParameterConstraint, PatternError> {
    if raw.is_empty() {
        return Err(PatternError::InvalidConstraint {
            name: name.to_string(),
            constraint: String::new(),
            reason: "empty constraint".to_string(),
        });
    }

    let constraint = ParameterConstraint::parse(raw);
    constraint
        .compile_anchored()
        .map_err(|e| PatternError::InvalidConstraint {
            name: name.to_string(),
            constraint: raw.to_string(),
            reason: e.to_string(),
        })?;
    Ok(constraint)
}
