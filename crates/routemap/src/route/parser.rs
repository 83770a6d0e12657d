//! Template parsing
//!
//! Splits a template into literal text and placeholders, then folds the
//! pieces into validated [`Segment`]s. All functions are **pure**.

use std::collections::HashSet;

use super::pattern::{classify_placeholder, Segment};
use crate::PatternError;

/// Raw piece of a template before classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// Splits a template into text and `{...}` placeholders
///
/// Braces nest inside a placeholder so constraints such as `\d{4}` survive.
fn tokenize(template: &str) -> Result<Vec<Token<'_>>, PatternError> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut open: Option<usize> = None;
    let mut depth = 0usize;

    for (idx, c) in template.char_indices() {
        match (c, open) {
            ('{', None) => {
                if idx > text_start {
                    tokens.push(Token::Text(&template[text_start..idx]));
                }
                open = Some(idx);
                depth = 1;
            }
            ('{', Some(_)) => depth += 1,
            ('}', None) => return Err(PatternError::UnbalancedBraces(idx)),
            ('}', Some(start)) => {
                depth -= 1;
                if depth == 0 {
                    tokens.push(Token::Placeholder(&template[start + 1..idx]));
                    open = None;
                    text_start = idx + 1;
                }
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        return Err(PatternError::UnbalancedBraces(start));
    }
    if text_start < template.len() {
        tokens.push(Token::Text(&template[text_start..]));
    }
    Ok(tokens)
}

/// Accumulator for the fold over template tokens
///
/// Each builder method consumes the state and returns the next one, or the
/// first defect found.
#[derive(Default)]
struct ParseState {
    segments: Vec<Segment>,
    names: HashSet<String>,
    format: Option<String>,
}

impl ParseState {
    fn with_literal(mut self, text: &str) -> Result<Self, PatternError> {
        self.ensure_open()?;
        self.segments.push(Segment::Literal(text.to_string()));
        Ok(self)
    }

    fn with_placeholder(self, inner: &str) -> Result<Self, PatternError> {
        match classify_placeholder(inner)? {
            variable @ Segment::Variable { .. } => self.with_variable(variable),
            format @ Segment::FormatSuffix { .. } => self.with_format(format),
            Segment::Literal(text) => self.with_literal(&text),
        }
    }

    fn with_variable(mut self, segment: Segment) -> Result<Self, PatternError> {
        self.ensure_open()?;
        let name = segment.name().unwrap_or_default().to_string();

        if let Some(Segment::Variable { name: previous, .. }) = self.segments.last() {
            return Err(PatternError::AmbiguousAdjacentVariables {
                first: previous.clone(),
                second: name,
            });
        }

        self.register_name(&name)?;
        self.segments.push(segment);
        Ok(self)
    }

    fn with_format(mut self, segment: Segment) -> Result<Self, PatternError> {
        self.ensure_open()?;
        let name = segment.name().unwrap_or_default().to_string();
        self.register_name(&name)?;
        self.format = Some(name);
        self.segments.push(segment);
        Ok(self)
    }

    /// Nothing may follow a format suffix
    fn ensure_open(&self) -> Result<(), PatternError> {
        match &self.format {
            Some(name) => Err(PatternError::MisplacedFormat(name.clone())),
            None => Ok(()),
        }
    }

    fn register_name(&mut self, name: &str) -> Result<(), PatternError> {
        if self.names.insert(name.to_string()) {
            Ok(())
        } else {
            Err(PatternError::DuplicateVariable(name.to_string()))
        }
    }
}

/// Parses a template into ordered segments (pure function)
///
/// # Examples
///
/// ```
/// use routemap::route::parser::parse_template;
/// use routemap::route::pattern::Segment;
///
/// let segments = parse_template("/users/{id}{.format}").unwrap();
/// assert_eq!(segments.len(), 3);
/// assert_eq!(segments[0], Segment::Literal("/users/".to_string()));
/// assert_eq!(segments[1].name(), Some("id"));
/// assert_eq!(segments[2].name(), Some("format"));
/// ```
///
/// # Errors
///
/// - unbalanced braces
/// - two variables with no literal between them
/// - a repeated variable name
/// - an invalid name or constraint
/// - anything after a format suffix
pub fn parse_template(template: &str) -> Result<Vec<Segment>, PatternError> {
    tokenize(template)?
        .into_iter()
        .try_fold(ParseState::default(), |state, token| match token {
            Token::Text(text) => state.with_literal(text),
            Token::Placeholder(inner) => state.with_placeholder(inner),
        })
        .map(|state| state.segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParameterConstraint;

    fn var(name: &str) -> Segment {
        Segment::Variable {
            name: name.to_string(),
            constraint: None,
            optional: false,
        }
    }

    #[test]
    fn test_parse_static() {
        let segments = parse_template("/about").unwrap();
        assert_eq!(segments, vec![Segment::Literal("/about".to_string())]);
    }

    #[test]
    fn test_parse_dynamic() {
        let segments = parse_template("/users/{id}/posts/{post_id}").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Literal("/users/".to_string()),
                var("id"),
                Segment::Literal("/posts/".to_string()),
                var("post_id"),
            ]
        );
    }

    #[test]
    fn test_parse_nested_braces_in_constraint() {
        let segments = parse_template(r"/archive/{year:\d{4}}").unwrap();
        assert_eq!(
            segments[1],
            Segment::Variable {
                name: "year".to_string(),
                constraint: Some(ParameterConstraint::Pattern(r"\d{4}".to_string())),
                optional: false,
            }
        );
    }

    #[test]
    fn test_parse_empty_template() {
        assert_eq!(parse_template("").unwrap(), Vec::<Segment>::new());
    }

    #[test]
    fn test_unbalanced_braces() {
        assert_eq!(
            parse_template("/users/{id").unwrap_err(),
            PatternError::UnbalancedBraces(7)
        );
        assert_eq!(
            parse_template("/users/id}").unwrap_err(),
            PatternError::UnbalancedBraces(9)
        );
    }

    #[test]
    fn test_adjacent_variables_rejected() {
        assert_eq!(
            parse_template("/{a}{b}").unwrap_err(),
            PatternError::AmbiguousAdjacentVariables {
                first: "a".to_string(),
                second: "b".to_string(),
            }
        );
    }

    #[test]
    fn test_variable_then_format_allowed() {
        let segments = parse_template("/{id}{.format}").unwrap();
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_duplicate_variable_rejected() {
        assert_eq!(
            parse_template("/{id}/x/{id}").unwrap_err(),
            PatternError::DuplicateVariable("id".to_string())
        );
    }

    #[test]
    fn test_format_must_be_last() {
        assert_eq!(
            parse_template("/{.format}/tail").unwrap_err(),
            PatternError::MisplacedFormat("format".to_string())
        );
        assert_eq!(
            parse_template("/a{.format}{.ext}").unwrap_err(),
            PatternError::MisplacedFormat("format".to_string())
        );
    }
}
