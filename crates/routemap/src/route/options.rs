//! Keyword options accepted by route registration
//!
//! Submappers store a set of options and merge every call's options on top
//! before forwarding to their parent.

use std::collections::HashMap;

use http::Method;

/// Request predicates a route requires before its pattern is tried
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    /// Allowed methods; `None` or an empty list admits any method
    pub method: Option<Vec<Method>>,
}

impl Conditions {
    /// Condition admitting a single method
    pub fn method(method: Method) -> Self {
        Self {
            method: Some(vec![method]),
        }
    }

    /// Condition admitting any of `methods`, duplicates dropped
    pub fn methods<I>(methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        let mut list: Vec<Method> = Vec::new();
        for method in methods {
            if !list.contains(&method) {
                list.push(method);
            }
        }
        Self { method: Some(list) }
    }

    /// Whether a request with `method` satisfies these conditions
    pub fn allows(&self, method: &Method) -> bool {
        match &self.method {
            Some(list) if !list.is_empty() => list.contains(method),
            _ => true,
        }
    }

    /// Per-field merge; fields set in `other` win
    pub fn merge(&self, other: &Conditions) -> Conditions {
        Conditions {
            method: other.method.clone().or_else(|| self.method.clone()),
        }
    }
}

/// Options for [`Mapper::connect`](crate::Mapper::connect) and submappers
///
/// # Examples
///
/// ```
/// use routemap::RouteOptions;
/// use http::Method;
///
/// let stored = RouteOptions::new()
///     .with_path_prefix("/admin")
///     .with_controller("users")
///     .with_default("page", "1");
/// let call = RouteOptions::new()
///     .with_path_prefix("/users")
///     .with_action("index")
///     .with_method(Method::GET);
///
/// let merged = stored.merge(&call);
/// assert_eq!(merged.path_prefix.as_deref(), Some("/admin/users"));
/// assert_eq!(merged.controller.as_deref(), Some("users"));
/// assert_eq!(merged.action.as_deref(), Some("index"));
/// assert_eq!(merged.defaults.get("page").map(String::as_str), Some("1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    pub path_prefix: Option<String>,
    pub name_prefix: Option<String>,
    pub controller: Option<String>,
    pub action: Option<String>,
    pub conditions: Option<Conditions>,
    /// Values used when the path leaves a variable out
    pub defaults: HashMap<String, String>,
    /// Constraints for variables that declare none inline
    pub requirements: HashMap<String, String>,
    /// Fixed values added to every match
    pub extras: HashMap<String, String>,
    pub formatted: Option<bool>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Restricts the route to one HTTP method
    pub fn with_method(self, method: Method) -> Self {
        self.with_conditions(Conditions::method(method))
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    pub fn with_requirement(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements.insert(key.into(), value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn with_formatted(mut self, formatted: bool) -> Self {
        self.formatted = Some(formatted);
        self
    }

    /// Layers `call` on top of `self`
    ///
    /// Prefixes concatenate, scalars from `call` win when set, and maps are
    /// shallow-merged with `call`'s keys winning.
    pub fn merge(&self, call: &RouteOptions) -> RouteOptions {
        RouteOptions {
            path_prefix: concat(&self.path_prefix, &call.path_prefix),
            name_prefix: concat(&self.name_prefix, &call.name_prefix),
            controller: call.controller.clone().or_else(|| self.controller.clone()),
            action: call.action.clone().or_else(|| self.action.clone()),
            conditions: match (&self.conditions, &call.conditions) {
                (Some(stored), Some(given)) => Some(stored.merge(given)),
                (stored, given) => given.clone().or_else(|| stored.clone()),
            },
            defaults: merge_map(&self.defaults, &call.defaults),
            requirements: merge_map(&self.requirements, &call.requirements),
            extras: merge_map(&self.extras, &call.extras),
            formatted: call.formatted.or(self.formatted),
        }
    }
}

fn concat(stored: &Option<String>, call: &Option<String>) -> Option<String> {
    match (stored, call) {
        (Some(a), Some(b)) => Some(format!("{}{}", a, b)),
        (a, b) => b.clone().or_else(|| a.clone()),
    }
}

fn merge_map(stored: &HashMap<String, String>, call: &HashMap<String, String>) -> HashMap<String, String> {
    let mut merged = stored.clone();
    merged.extend(call.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
