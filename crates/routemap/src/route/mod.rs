//! Routes and match results
//!
//! A [`Route`] pairs a compiled template with the metadata a match hands to
//! the dispatcher: controller, action, defaults and extras.
//!
//! - `pattern`: placeholder classification
//! - `parser`: template parsing
//! - `compiled`: matcher and generator
//! - `options`: registration options and their merge rules

pub mod compiled;
pub mod options;
pub mod parser;
pub mod pattern;

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::path::decode_value;
use crate::{Result, RouteError};

pub use compiled::CompiledPattern;
pub use options::{Conditions, RouteOptions};
pub use pattern::Segment;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap()
});

/// Target of a redirect route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Destination; `{name}` placeholders are filled from the match
    pub target: String,
    /// HTTP status code (301, 302, 307, 308)
    pub status: u16,
}

impl Redirect {
    /// Substitutes matched variables into the target
    ///
    /// ```
    /// use routemap::route::Redirect;
    /// use std::collections::HashMap;
    ///
    /// let redirect = Redirect { target: "/articles/{slug}".to_string(), status: 301 };
    /// let mut vars = HashMap::new();
    /// vars.insert("slug".to_string(), "hello".to_string());
    /// assert_eq!(redirect.target_for(&vars), "/articles/hello");
    /// ```
    pub fn target_for(&self, variables: &HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(&self.target, |caps: &Captures<'_>| match variables.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// A registered route
///
/// Immutable once built; the mapper hands out `Arc<Route>` so match results
/// can point back at the route that produced them.
#[derive(Debug, Clone)]
pub struct Route {
    /// Symbolic name for generation
    pub name: Option<String>,
    /// Template after prefixing, e.g. `/messages/{id}{.format}`
    pub template: String,
    pub conditions: Conditions,
    pub defaults: HashMap<String, String>,
    pub controller: Option<String>,
    pub action: Option<String>,
    pub extras: HashMap<String, String>,
    pub redirect: Option<Redirect>,
    compiled: CompiledPattern,
}

impl Route {
    /// Compiles `template` and attaches the metadata from `options`
    ///
    /// Prefixes in `options` are ignored here; the mapper applies them
    /// before calling.
    pub fn new(
        name: Option<String>,
        template: &str,
        options: &RouteOptions,
        case_insensitive: bool,
    ) -> Result<Self> {
        let compiled =
            CompiledPattern::compile_with(template, &options.requirements, case_insensitive)
                .map_err(|source| RouteError::PatternCompile {
                    template: template.to_string(),
                    source,
                })?;

        Ok(Self {
            name,
            template: template.to_string(),
            conditions: options.conditions.clone().unwrap_or_default(),
            defaults: options.defaults.clone(),
            controller: options.controller.clone(),
            action: options.action.clone(),
            extras: options.extras.clone(),
            redirect: None,
            compiled,
        })
    }

    /// Marks this route as a redirect
    pub fn with_redirect(mut self, target: impl Into<String>, status: u16) -> Self {
        self.redirect = Some(Redirect {
            target: target.into(),
            status,
        });
        self
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.compiled
    }

    pub fn segments(&self) -> &[Segment] {
        self.compiled.segments()
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }

    /// Matches this route against a path, decoding values
    pub fn matches(self: &Arc<Self>, path: &str, method: &Method) -> Option<MatchResult> {
        self.matches_with_options(path, method, true)
    }

    /// Matches this route against a path with options
    ///
    /// # Arguments
    ///
    /// * `path` - request path
    /// * `method` - request method, checked against the conditions first
    /// * `decode` - percent-decode matched values
    ///
    /// A value that does not decode to UTF-8 makes the route not match.
    pub fn matches_with_options(
        self: &Arc<Self>,
        path: &str,
        method: &Method,
        decode: bool,
    ) -> Option<MatchResult> {
        if !self.conditions.allows(method) {
            return None;
        }

        let captured = self.compiled.captures(path)?;

        let mut variables = HashMap::new();
        if let Some(controller) = &self.controller {
            variables.insert("controller".to_string(), controller.clone());
        }
        if let Some(action) = &self.action {
            variables.insert("action".to_string(), action.clone());
        }
        variables.extend(self.extras.iter().map(|(k, v)| (k.clone(), v.clone())));
        variables.extend(self.defaults.iter().map(|(k, v)| (k.clone(), v.clone())));

        for (name, raw) in captured {
            let value = if decode {
                decode_value(raw)?.into_owned()
            } else {
                raw.to_string()
            };
            variables.insert(name.to_string(), value);
        }

        Some(MatchResult {
            variables,
            route: Arc::clone(self),
        })
    }

    /// Builds a path from `params`, falling back to this route's defaults
    pub fn generate(&self, params: &HashMap<String, String>) -> Result<String> {
        self.compiled.generate(params, &self.defaults)
    }

    /// How well this route fits a controller/action generation request
    ///
    /// `None` when the route cannot serve `params`; otherwise the number of
    /// optional variables left unsupplied (lower is better).
    pub(crate) fn generation_score(&self, params: &HashMap<String, String>) -> Option<usize> {
        let supplied = |key: &str| params.get(key).map(String::as_str);

        if self.controller.as_deref() != supplied("controller")
            || self.action.as_deref() != supplied("action")
        {
            return None;
        }

        let variables = self.compiled.variables();
        let fixed_ok = self
            .defaults
            .iter()
            .chain(self.extras.iter())
            .filter(|(key, _)| !variables.iter().any(|v| v == *key))
            .filter(|(key, _)| key.as_str() != "controller" && key.as_str() != "action")
            .all(|(key, value)| supplied(key).map_or(true, |given| given == value.as_str()));
        if !fixed_ok {
            return None;
        }

        let satisfiable = self.compiled.required_variables().all(|name| {
            supplied(name).map_or(false, |v| !v.is_empty()) || self.defaults.contains_key(name)
        });
        if !satisfiable {
            return None;
        }

        let accepted = variables.iter().all(|name| {
            supplied(name)
                .filter(|v| !v.is_empty())
                .or_else(|| self.defaults.get(name.as_str()).map(String::as_str))
                .map_or(true, |value| self.compiled.accepts(name, value))
        });
        if !accepted {
            return None;
        }

        Some(
            self.compiled
                .optional_variables()
                .filter(|name| supplied(name).is_none())
                .count(),
        )
    }
}

/// Result of matching a route against a path
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Controller, action, extras, defaults and path values, later layers
    /// overriding earlier ones
    pub variables: HashMap<String, String>,
    /// The matched route
    pub route: Arc<Route>,
}

impl MatchResult {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    pub fn into_parts(self) -> (HashMap<String, String>, Arc<Route>) {
        (self.variables, self.route)
    }

    pub fn is_redirect(&self) -> bool {
        self.route.is_redirect()
    }

    /// Redirect destination with matched variables substituted
    ///
    /// Returns None if this is not a redirect route.
    pub fn redirect_target(&self) -> Option<String> {
        self.route
            .redirect
            .as_ref()
            .map(|r| r.target_for(&self.variables))
    }

    pub fn redirect_status(&self) -> Option<u16> {
        self.route.redirect.as_ref().map(|r| r.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn route(template: &str, options: RouteOptions) -> Arc<Route> {
        Arc::new(Route::new(None, template, &options, false).unwrap())
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_match_layers_variables() {
        let r = route(
            "/users/{id}",
            RouteOptions::new()
                .with_controller("users")
                .with_action("show")
                .with_extra("id", "extra")
                .with_default("page", "1"),
        );
        let m = r.matches("/users/7", &Method::GET).unwrap();
        assert_eq!(
            m.variables,
            params(&[
                ("controller", "users"),
                ("action", "show"),
                ("id", "7"),
                ("page", "1"),
            ])
        );
    }

    #[test]
    fn test_method_condition() {
        let r = route("/items", RouteOptions::new().with_method(Method::POST));
        assert!(r.matches("/items", &Method::GET).is_none());
        assert!(r.matches("/items", &Method::POST).is_some());
    }

    #[test]
    fn test_match_decodes_values() {
        let r = route("/search/{q}", RouteOptions::new());
        let m = r.matches("/search/a%20b", &Method::GET).unwrap();
        assert_eq!(m.get("q"), Some("a b"));

        let raw = r
            .matches_with_options("/search/a%20b", &Method::GET, false)
            .unwrap();
        assert_eq!(raw.get("q"), Some("a%20b"));

        assert!(r.matches("/search/%FF", &Method::GET).is_none());
    }

    #[test]
    fn test_compile_error_names_template() {
        let err = Route::new(None, "/a/{b", &RouteOptions::new(), false).unwrap_err();
        assert!(matches!(
            err,
            RouteError::PatternCompile { ref template, .. } if template == "/a/{b"
        ));
    }

    #[test]
    fn test_redirect_route() {
        let r = Arc::new(
            Route::new(None, "/blog/{slug}", &RouteOptions::new(), false)
                .unwrap()
                .with_redirect("/articles/{slug}", 301),
        );
        let m = r.matches("/blog/hello", &Method::GET).unwrap();
        assert!(m.is_redirect());
        assert_eq!(m.redirect_target().as_deref(), Some("/articles/hello"));
        assert_eq!(m.redirect_status(), Some(301));
    }

    #[test]
    fn test_generation_score() {
        let r = Route::new(
            None,
            "/archive/{year}/{month?}",
            &RouteOptions::new()
                .with_controller("blog")
                .with_action("archive")
                .with_extra("lang", "en"),
            false,
        )
        .unwrap();

        let base = params(&[("controller", "blog"), ("action", "archive"), ("year", "2024")]);
        assert_eq!(r.generation_score(&base), Some(1));

        let mut full = base.clone();
        full.insert("month".to_string(), "05".to_string());
        assert_eq!(r.generation_score(&full), Some(0));

        let mut wrong_extra = base.clone();
        wrong_extra.insert("lang".to_string(), "de".to_string());
        assert_eq!(r.generation_score(&wrong_extra), None);

        let missing = params(&[("controller", "blog"), ("action", "archive")]);
        assert_eq!(r.generation_score(&missing), None);
    }

    #[test]
    fn test_generation_score_respects_constraints() {
        let options = RouteOptions::new().with_controller("posts").with_action("show");
        let r = Route::new(None, "/posts/{id:int}", &options, false).unwrap();

        let numeric = params(&[("controller", "posts"), ("action", "show"), ("id", "7")]);
        assert_eq!(r.generation_score(&numeric), Some(0));

        let word = params(&[("controller", "posts"), ("action", "show"), ("id", "hello")]);
        assert_eq!(r.generation_score(&word), None);
    }

    #[test]
    fn test_redirect_target_single_pass() {
        let redirect = Redirect {
            target: "/to/{a}/{b}/{missing}".to_string(),
            status: 302,
        };
        let vars = params(&[("a", "{b}"), ("b", "x")]);
        assert_eq!(redirect.target_for(&vars), "/to/{b}/x/{missing}");
    }
}
