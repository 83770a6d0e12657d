//! The route registry
//!
//! Routes are registered in order during startup through `&mut Mapper`;
//! afterwards the mapper is shared read-only (typically as `Arc<Mapper>`)
//! and only its match cache mutates, through interior locking.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use crate::cache::MatchCache;
use crate::path::{ensure_leading_slash, join_prefix};
use crate::route::{MatchResult, Route, RouteOptions};
use crate::submapper::{CollectionOptions, SubMapper, SubMapperParent};
use crate::{MapperConfig, Result, RouteError};

/// Ordered collection of routes with a match cache
///
/// # Examples
///
/// ```
/// use routemap::{Mapper, RouteOptions};
/// use std::collections::HashMap;
///
/// let mut mapper = Mapper::new();
/// mapper
///     .connect(
///         Some("user"),
///         "/users/{id:int}",
///         RouteOptions::new().with_controller("users").with_action("show"),
///     )
///     .unwrap();
///
/// let (vars, _route) = mapper.routematch("/users/42").unwrap();
/// assert_eq!(vars.get("id").map(String::as_str), Some("42"));
/// assert_eq!(vars.get("action").map(String::as_str), Some("show"));
///
/// let mut params = HashMap::new();
/// params.insert("id".to_string(), "7".to_string());
/// assert_eq!(mapper.generate(Some("user"), &params).unwrap(), "/users/7");
/// ```
#[derive(Debug)]
pub struct Mapper {
    routes: Vec<Arc<Route>>,
    names: HashMap<String, usize>,
    cache: MatchCache,
    config: MapperConfig,
}

impl Mapper {
    /// Creates an empty mapper with the default configuration
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            routes: Vec::new(),
            names: HashMap::new(),
            cache: MatchCache::new(config.cache_size),
            config,
        }
    }

    /// Registers a route
    ///
    /// The template gets `options.path_prefix` prepended (and a leading `/`
    /// if it still lacks one); the name gets `options.name_prefix`.
    ///
    /// # Errors
    ///
    /// - `DuplicateRouteName` if the prefixed name is taken
    /// - `PatternCompile` if the template is malformed
    ///
    /// On error the mapper is left unchanged.
    pub fn connect(
        &mut self,
        name: Option<&str>,
        template: &str,
        options: RouteOptions,
    ) -> Result<()> {
        let prefixed = match &options.path_prefix {
            Some(prefix) => join_prefix(prefix, template),
            None => template.into(),
        };
        let template = ensure_leading_slash(&prefixed);

        let name = name.map(|n| match &options.name_prefix {
            Some(prefix) => format!("{}{}", prefix, n),
            None => n.to_string(),
        });

        let route = Route::new(name, &template, &options, self.config.case_insensitive)?;
        self.add_route(route)
    }

    /// Appends an already built route
    pub fn add_route(&mut self, route: Route) -> Result<()> {
        if let Some(name) = &route.name {
            if self.names.contains_key(name) {
                return Err(RouteError::DuplicateRouteName(name.clone()));
            }
            self.names.insert(name.clone(), self.routes.len());
        }

        tracing::debug!(
            name = route.name.as_deref().unwrap_or("-"),
            template = %route.template,
            "Registered route"
        );

        self.routes.push(Arc::new(route));
        self.cache.clear();
        Ok(())
    }

    /// Registers a route that redirects to `target`
    ///
    /// `{name}` placeholders in the target are filled from the match.
    pub fn redirect(&mut self, template: &str, target: &str, status: u16) -> Result<()> {
        let template = ensure_leading_slash(template);
        let route = Route::new(
            None,
            &template,
            &RouteOptions::new(),
            self.config.case_insensitive,
        )?
        .with_redirect(target, status);
        self.add_route(route)
    }

    /// Declares a REST-style resource with the default actions
    ///
    /// Shorthand for [`collection`](SubMapperParent::collection) when the
    /// collection scope is not needed afterwards.
    pub fn resource(
        &mut self,
        collection_name: &str,
        resource_name: &str,
        options: CollectionOptions,
    ) -> Result<()> {
        self.collection(collection_name, resource_name, options)
            .map(|_| ())
    }

    /// Runs `f` with a submapper scoped to `options`
    pub fn with_submapper<F, T>(&mut self, options: RouteOptions, f: F) -> T
    where
        F: FnOnce(&mut SubMapper<'_>) -> T,
    {
        let mut submapper = self.submapper(options);
        f(&mut submapper)
    }

    /// Finds the first route matching `path` and `method`
    ///
    /// Results, including misses, are memoized per `(path, method)`.
    pub fn match_route(&self, path: &str, method: &Method) -> Option<MatchResult> {
        if let Some(hit) = self.cache.get(path, method) {
            return (*hit).clone();
        }

        let result = self
            .routes
            .iter()
            .find_map(|route| route.matches_with_options(path, method, self.config.decode_params));

        tracing::trace!(
            path,
            %method,
            matched = result.is_some(),
            "match cache miss"
        );

        self.cache.insert(path, method, result.clone());
        result
    }

    /// [`match_route`](Self::match_route) for `GET`, as a
    /// `(variables, route)` tuple
    pub fn routematch(&self, path: &str) -> Option<(HashMap<String, String>, Arc<Route>)> {
        self.match_route(path, &Method::GET)
            .map(MatchResult::into_parts)
    }

    /// Builds a path for a named route, or by controller and action
    ///
    /// With `name`, the named route's generator is used directly. Without
    /// it, `params["controller"]` and `params["action"]` select among the
    /// routes that can be generated from `params`, preferring the one that
    /// leaves the fewest optional variables out; earlier registration wins
    /// ties.
    pub fn generate(&self, name: Option<&str>, params: &HashMap<String, String>) -> Result<String> {
        let route = match name {
            Some(name) => self
                .route_by_name(name)
                .ok_or_else(|| RouteError::NoRouteFound(format!("name `{}`", name)))?,
            None => self
                .routes
                .iter()
                .filter_map(|route| route.generation_score(params).map(|score| (score, route)))
                .min_by_key(|(score, _)| *score)
                .map(|(_, route)| route)
                .ok_or_else(|| {
                    RouteError::NoRouteFound(format!(
                        "controller `{}` action `{}`",
                        params.get("controller").map_or("", String::as_str),
                        params.get("action").map_or("", String::as_str),
                    ))
                })?,
        };

        route.generate(params)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes in registration order
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn route_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.names.get(name).and_then(|&idx| self.routes.get(idx))
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Number of memoized match results
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl SubMapperParent for Mapper {
    fn connect_route(
        &mut self,
        name: Option<&str>,
        path: &str,
        options: RouteOptions,
    ) -> Result<()> {
        self.connect(name, path, options)
    }

    fn formatted(&self) -> Option<bool> {
        Some(self.config.formatted)
    }

    fn resource_name(&self) -> Option<&str> {
        None
    }
}
