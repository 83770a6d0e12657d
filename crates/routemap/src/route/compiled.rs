//! Compiled templates: an anchored matcher plus the reverse generator

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use super::parser::parse_template;
use super::pattern::Segment;
use crate::constraint::{DEFAULT_FORMAT, DEFAULT_SEGMENT, DEFAULT_SEGMENT_BEFORE_FORMAT};
use crate::path::encode_value;
use crate::{ParameterConstraint, PatternError, RouteError};

/// Upper bound for the compiled matcher, in bytes
const MAX_REGEX_SIZE: usize = 1 << 20;

/// A parsed template with its matcher and generation metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    segments: Vec<Segment>,
    regex: Regex,
    /// Variable names in template order (format suffix included)
    variables: Vec<String>,
    /// Anchored validators for constrained variables
    checks: HashMap<String, Regex>,
}

impl CompiledPattern {
    /// Compiles a template with no extra requirements, case-sensitive
    ///
    /// # Examples
    ///
    /// ```
    /// use routemap::route::CompiledPattern;
    /// use std::collections::HashMap;
    ///
    /// let pattern = CompiledPattern::compile("/users/{id:int}{.format}").unwrap();
    /// let captured = pattern.captures("/users/42.json").unwrap();
    /// assert_eq!(captured, vec![("id", "42"), ("format", "json")]);
    ///
    /// let mut params = HashMap::new();
    /// params.insert("id".to_string(), "7".to_string());
    /// assert_eq!(pattern.generate(&params, &HashMap::new()).unwrap(), "/users/7");
    /// ```
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        Self::compile_with(template, &HashMap::new(), false)
    }

    /// Compiles a template
    ///
    /// `requirements` supplies constraints for variables that declare none
    /// inline; inline constraints win.
    pub fn compile_with(
        template: &str,
        requirements: &HashMap<String, String>,
        case_insensitive: bool,
    ) -> Result<Self, PatternError> {
        let segments = apply_requirements(parse_template(template)?, requirements)?;
        let source = build_regex(&segments);

        let regex = RegexBuilder::new(&source)
            .case_insensitive(case_insensitive)
            .size_limit(MAX_REGEX_SIZE)
            .build()
            .map_err(|e| PatternError::Regex(e.to_string()))?;

        let variables: Vec<String> = segments
            .iter()
            .filter_map(|s| s.name().map(str::to_string))
            .collect();

        let checks = segments
            .iter()
            .filter_map(|s| Some((s.name()?, s.constraint()?)))
            .map(|(name, constraint)| {
                constraint
                    .compile_anchored_with(case_insensitive)
                    .map(|re| (name.to_string(), re))
                    .map_err(|e| PatternError::Regex(e.to_string()))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self {
            template: template.to_string(),
            segments,
            regex,
            variables,
            checks,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Variable names in template order
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Source of the anchored matcher
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }

    /// Names of variables generation cannot do without
    pub fn required_variables(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter(|s| !s.is_optional())
            .filter_map(Segment::name)
    }

    /// Names of variables generation may omit
    pub fn optional_variables(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter(|s| s.is_optional())
            .filter_map(Segment::name)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Raw (still percent-encoded) values of the variables present in `path`
    ///
    /// Optional variables absent from the path are left out.
    pub fn captures<'s, 'p>(&'s self, path: &'p str) -> Option<Vec<(&'s str, &'p str)>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.variables
                .iter()
                .filter_map(|name| caps.name(name).map(|m| (name.as_str(), m.as_str())))
                .collect(),
        )
    }

    /// Substitutes parameters back into the template
    ///
    /// Each variable takes its value from `params`, then `defaults`. A
    /// required variable without either fails; an optional one is dropped
    /// together with the slash it absorbed.
    pub fn generate(
        &self,
        params: &HashMap<String, String>,
        defaults: &HashMap<String, String>,
    ) -> Result<String, RouteError> {
        let value_of = |name: &str| {
            params
                .get(name)
                .or_else(|| defaults.get(name))
                .map(String::as_str)
                .filter(|v| !v.is_empty())
        };

        let mut out = String::with_capacity(self.template.len());

        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => {
                    if absorbs_slash(&self.segments, idx + 1) {
                        out.push_str(&text[..text.len() - 1]);
                    } else {
                        out.push_str(text);
                    }
                }
                Segment::Variable {
                    name,
                    constraint,
                    optional,
                } => match value_of(name) {
                    Some(value) => {
                        self.check(name, value)?;
                        if absorbs_slash(&self.segments, idx) {
                            out.push('/');
                        }
                        let encoded = encode_value(value, constraint.is_some());
                        if constraint.is_none() && precedes_format(&self.segments, idx) {
                            // A bare `.` would be read back as the format separator
                            out.push_str(&encoded.replace('.', "%2E"));
                        } else {
                            out.push_str(&encoded);
                        }
                    }
                    None if *optional => {}
                    None => {
                        return Err(RouteError::MissingParameter {
                            template: self.template.clone(),
                            parameter: name.clone(),
                        })
                    }
                },
                Segment::FormatSuffix { name, .. } => {
                    if let Some(value) = value_of(name) {
                        self.check(name, value)?;
                        out.push('.');
                        out.push_str(&encode_value(value, false));
                    }
                }
            }
        }

        Ok(out)
    }

    /// Whether `value` satisfies the constraint of variable `name`
    ///
    /// Unconstrained and unknown variables accept anything.
    pub fn accepts(&self, name: &str, value: &str) -> bool {
        self.checks
            .get(name)
            .map_or(true, |check| check.is_match(value))
    }

    fn check(&self, name: &str, value: &str) -> Result<(), RouteError> {
        if self.accepts(name, value) {
            return Ok(());
        }
        Err(RouteError::InvalidParameter {
            template: self.template.clone(),
            parameter: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// Whether the optional variable at `idx` owns the trailing `/` of the
/// literal before it
///
/// A leading literal that is only `/` keeps its slash so the root still
/// matches.
fn absorbs_slash(segments: &[Segment], idx: usize) -> bool {
    let optional = matches!(
        segments.get(idx),
        Some(Segment::Variable { optional: true, .. })
    );
    let Some(prev) = idx.checked_sub(1) else {
        return false;
    };
    optional
        && matches!(
            segments.get(prev),
            Some(Segment::Literal(text)) if text.ends_with('/') && (prev > 0 || text.len() > 1)
        )
}

/// Whether the variable at `idx` can be directly followed by the format
/// suffix once optional variables after it are left out
fn precedes_format(segments: &[Segment], idx: usize) -> bool {
    for (next, segment) in segments.iter().enumerate().skip(idx + 1) {
        match segment {
            Segment::FormatSuffix { .. } => return true,
            Segment::Variable { optional: true, .. } => {}
            Segment::Literal(text) if text == "/" && absorbs_slash(segments, next + 1) => {}
            _ => return false,
        }
    }
    false
}

fn apply_requirements(
    segments: Vec<Segment>,
    requirements: &HashMap<String, String>,
) -> Result<Vec<Segment>, PatternError> {
    if requirements.is_empty() {
        return Ok(segments);
    }

    segments
        .into_iter()
        .map(|segment| match segment {
            Segment::Variable {
                name,
                constraint: None,
                optional,
            } if requirements.contains_key(&name) => {
                let constraint = required_constraint(&name, &requirements[&name])?;
                Ok(Segment::Variable {
                    name,
                    constraint: Some(constraint),
                    optional,
                })
            }
            Segment::FormatSuffix {
                name,
                constraint: None,
            } if requirements.contains_key(&name) => {
                let constraint = required_constraint(&name, &requirements[&name])?;
                Ok(Segment::FormatSuffix {
                    name,
                    constraint: Some(constraint),
                })
            }
            other => Ok(other),
        })
        .collect()
}

fn required_constraint(name: &str, raw: &str) -> Result<ParameterConstraint, PatternError> {
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

/// Builds the anchored regex source for a segment list
fn build_regex(segments: &[Segment]) -> String {
    let mut source = String::from("^");

    for (idx, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Literal(text) => {
                let text = if absorbs_slash(segments, idx + 1) {
                    &text[..text.len() - 1]
                } else {
                    text.as_str()
                };
                source.push_str(&regex::escape(text));
            }
            Segment::Variable {
                name,
                constraint,
                optional,
            } => {
                let sub = match constraint {
                    Some(c) => c.regex(),
                    None if precedes_format(segments, idx) => DEFAULT_SEGMENT_BEFORE_FORMAT,
                    None => DEFAULT_SEGMENT,
                };
                let group = format!("(?P<{name}>{sub})");
                if *optional {
                    let slash = if absorbs_slash(segments, idx) { "/" } else { "" };
                    source.push_str(&format!("(?:{slash}{group})?"));
                } else {
                    source.push_str(&group);
                }
            }
            Segment::FormatSuffix { name, constraint } => {
                let sub = constraint.as_ref().map_or(DEFAULT_FORMAT, |c| c.regex());
                source.push_str(&format!(r"(?:\.(?P<{name}>{sub}))?"));
            }
        }
    }

    source.push('$');
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_regex_source() {
        let p = CompiledPattern::compile("/users/{id}").unwrap();
        assert_eq!(p.as_regex().as_str(), "^/users/(?P<id>[^/]+)$");

        let p = CompiledPattern::compile("/users/{id}{.format}").unwrap();
        assert_eq!(
            p.as_regex().as_str(),
            r"^/users/(?P<id>[^/.]+)(?:\.(?P<format>[^/.]+))?$"
        );

        let p = CompiledPattern::compile("/archive/{year}/{month?}").unwrap();
        assert_eq!(
            p.as_regex().as_str(),
            "^/archive/(?P<year>[^/]+)(?:/(?P<month>[^/]+))?$"
        );
    }

    #[test]
    fn test_literal_is_escaped() {
        let p = CompiledPattern::compile("/a.b/{x}").unwrap();
        assert!(p.is_match("/a.b/1"));
        assert!(!p.is_match("/aXb/1"));
    }

    #[test]
    fn test_slash_never_inside_default_variable() {
        let p = CompiledPattern::compile("/files/{name}").unwrap();
        assert!(p.is_match("/files/readme"));
        assert!(!p.is_match("/files/docs/readme"));

        let p = CompiledPattern::compile("/files/{name:path}").unwrap();
        assert_eq!(
            p.captures("/files/docs/readme").unwrap(),
            vec![("name", "docs/readme")]
        );
    }

    #[test]
    fn test_optional_variable_matches_both_forms() {
        let p = CompiledPattern::compile("/archive/{year}/{month?}").unwrap();
        assert_eq!(p.captures("/archive/2024").unwrap(), vec![("year", "2024")]);
        assert_eq!(
            p.captures("/archive/2024/05").unwrap(),
            vec![("year", "2024"), ("month", "05")]
        );
        assert!(p.captures("/archive").is_none());
    }

    #[test]
    fn test_root_optional_keeps_slash() {
        let p = CompiledPattern::compile("/{page?}").unwrap();
        assert!(p.is_match("/"));
        assert!(p.is_match("/about"));
        assert_eq!(p.generate(&HashMap::new(), &HashMap::new()).unwrap(), "/");
    }

    #[test]
    fn test_generate_required_missing() {
        let p = CompiledPattern::compile("/users/{id}").unwrap();
        let err = p.generate(&HashMap::new(), &HashMap::new()).unwrap_err();
        assert!(matches!(
            err,
            RouteError::MissingParameter { ref parameter, .. } if parameter == "id"
        ));
    }

    #[test]
    fn test_generate_uses_defaults() {
        let p = CompiledPattern::compile("/users/{id}").unwrap();
        let url = p.generate(&HashMap::new(), &params(&[("id", "1")])).unwrap();
        assert_eq!(url, "/users/1");
    }

    #[test]
    fn test_generate_omits_optional_parts() {
        let p = CompiledPattern::compile("/archive/{year}/{month?}{.format}").unwrap();
        assert_eq!(
            p.generate(&params(&[("year", "2024")]), &HashMap::new()).unwrap(),
            "/archive/2024"
        );
        assert_eq!(
            p.generate(
                &params(&[("year", "2024"), ("month", "05"), ("format", "json")]),
                &HashMap::new()
            )
            .unwrap(),
            "/archive/2024/05.json"
        );
    }

    #[test]
    fn test_generate_rejects_constraint_violation() {
        let p = CompiledPattern::compile("/users/{id:int}").unwrap();
        let err = p.generate(&params(&[("id", "abc")]), &HashMap::new()).unwrap_err();
        assert!(matches!(err, RouteError::InvalidParameter { .. }));
    }

    #[test]
    fn test_generate_percent_encodes() {
        let p = CompiledPattern::compile("/search/{q}").unwrap();
        let url = p
            .generate(&params(&[("q", "rust lang/2024")]), &HashMap::new())
            .unwrap();
        assert_eq!(url, "/search/rust%20lang%2F2024");
        assert!(p.is_match(&url));
    }

    #[test]
    fn test_requirements_apply_when_no_inline_constraint() {
        let reqs = params(&[("id", "int")]);
        let p = CompiledPattern::compile_with("/users/{id}", &reqs, false).unwrap();
        assert!(p.is_match("/users/12"));
        assert!(!p.is_match("/users/ab"));

        let p = CompiledPattern::compile_with("/users/{id:alpha}", &reqs, false).unwrap();
        assert!(p.is_match("/users/ab"));
    }

    #[test]
    fn test_bad_requirement_is_compile_error() {
        let reqs = params(&[("id", "(")]);
        assert!(matches!(
            CompiledPattern::compile_with("/users/{id}", &reqs, false).unwrap_err(),
            PatternError::InvalidConstraint { .. }
        ));
    }

    #[test]
    fn test_case_insensitive() {
        let p = CompiledPattern::compile_with("/About", &HashMap::new(), true).unwrap();
        assert!(p.is_match("/about"));
        assert!(!CompiledPattern::compile("/About").unwrap().is_match("/about"));
    }

    #[test]
    fn test_case_insensitive_generation_accepts_matched_values() {
        let p = CompiledPattern::compile_with("/tags/{tag:[a-z]+}", &HashMap::new(), true)
            .unwrap();
        assert!(p.is_match("/tags/ABC"));
        assert!(p.accepts("tag", "ABC"));
        assert_eq!(
            p.generate(&params(&[("tag", "ABC")]), &HashMap::new()).unwrap(),
            "/tags/ABC"
        );

        let strict = CompiledPattern::compile("/tags/{tag:[a-z]+}").unwrap();
        assert!(!strict.accepts("tag", "ABC"));
    }

    #[test]
    fn test_format_suffix_seen_past_optional_variables() {
        let p = CompiledPattern::compile("/archive/{year}/{month?}{.format}").unwrap();
        assert_eq!(
            p.as_regex().as_str(),
            r"^/archive/(?P<year>[^/.]+)(?:/(?P<month>[^/.]+))?(?:\.(?P<format>[^/.]+))?$"
        );

        let url = p
            .generate(&params(&[("year", "2024"), ("format", "json")]), &HashMap::new())
            .unwrap();
        assert_eq!(url, "/archive/2024.json");
        assert_eq!(
            p.captures(&url).unwrap(),
            vec![("year", "2024"), ("format", "json")]
        );
    }

    #[test]
    fn test_required_literal_stops_format_lookahead() {
        let p = CompiledPattern::compile("/files/{name}/raw{.format}").unwrap();
        assert_eq!(
            p.captures("/files/a.b/raw.txt").unwrap(),
            vec![("name", "a.b"), ("format", "txt")]
        );
    }

    #[test]
    fn test_dots_encoded_before_format_suffix() {
        let p = CompiledPattern::compile("/users/{id}{.format}").unwrap();
        let url = p.generate(&params(&[("id", "a.b")]), &HashMap::new()).unwrap();
        assert_eq!(url, "/users/a%2Eb");
        assert_eq!(p.captures(&url).unwrap(), vec![("id", "a%2Eb")]);

        let url = p
            .generate(&params(&[("id", "a.b"), ("format", "json")]), &HashMap::new())
            .unwrap();
        assert_eq!(url, "/users/a%2Eb.json");
        assert_eq!(
            p.captures(&url).unwrap(),
            vec![("id", "a%2Eb"), ("format", "json")]
        );

        let plain = CompiledPattern::compile("/files/{name}").unwrap();
        assert_eq!(
            plain.generate(&params(&[("name", "a.b")]), &HashMap::new()).unwrap(),
            "/files/a.b"
        );
    }
}
