//! Scoped route declaration
//!
//! A [`SubMapper`] stores a set of [`RouteOptions`] and a parent. Every
//! route connected through it gets those options merged in and its path and
//! name prefixed, then travels up the parent chain to the [`Mapper`] that
//! owns the routes. Submappers nest: a collection's member scope is a
//! submapper whose parent is the collection.
//!
//! [`Mapper`]: crate::Mapper

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use http::Method;

use crate::path::{ensure_leading_slash, join_prefix};
use crate::route::{Conditions, RouteOptions};
use crate::{Result, RouteError};

/// Actions registered on the collection scope by default
pub const COLLECTION_ACTIONS: [ResourceAction; 3] = [
    ResourceAction::Index,
    ResourceAction::Create,
    ResourceAction::New,
];

/// Actions registered on the member scope by default
pub const MEMBER_ACTIONS: [ResourceAction; 4] = [
    ResourceAction::Show,
    ResourceAction::Update,
    ResourceAction::Delete,
    ResourceAction::Edit,
];

/// Something a submapper can delegate route registration to
///
/// Implemented by [`Mapper`](crate::Mapper) (the root of every chain) and by
/// [`SubMapper`] itself.
pub trait SubMapperParent {
    /// Registers a route whose path and name are already prefixed by the
    /// caller's scope
    fn connect_route(&mut self, name: Option<&str>, path: &str, options: RouteOptions)
        -> Result<()>;

    /// Whether helpers append `{.format}`, if this scope decides
    fn formatted(&self) -> Option<bool>;

    /// Singular resource name, if this scope has one
    fn resource_name(&self) -> Option<&str>;

    /// Opens a child scope with `options`
    fn submapper(&mut self, options: RouteOptions) -> SubMapper<'_>
    where
        Self: Sized,
    {
        SubMapper::new(self, options)
    }

    /// Declares a REST-style collection and registers its action routes
    ///
    /// The returned submapper is the collection scope; its
    /// [`member`](SubMapper::member) scope sits under the member prefix.
    fn collection(
        &mut self,
        collection_name: &str,
        resource_name: &str,
        options: CollectionOptions,
    ) -> Result<SubMapper<'_>>
    where
        Self: Sized,
    {
        let CollectionOptions {
            path_prefix,
            member_prefix,
            controller,
            collection_actions,
            member_actions,
            member_options,
            options,
        } = options;

        let scope = options
            .with_path_prefix(path_prefix.unwrap_or_else(|| format!("/{}", collection_name)))
            .with_controller(controller.unwrap_or_else(|| resource_name.to_string()));

        let mut collection = SubMapper::new(self, scope)
            .with_collection_name(collection_name)
            .with_resource_name(resource_name);

        for action in &collection_actions {
            action.apply(&mut collection)?;
        }

        let member_scope = member_options.unwrap_or_default().with_path_prefix(member_prefix);
        {
            let mut member = SubMapper::new(&mut collection, member_scope.clone());
            for action in &member_actions {
                action.apply(&mut member)?;
            }
        }
        collection.member = Some(member_scope);

        tracing::debug!(
            collection = collection_name,
            resource = resource_name,
            routes = collection_actions.len() + member_actions.len(),
            "Registered collection"
        );

        Ok(collection)
    }
}

/// A scope that merges its options into every route it connects
pub struct SubMapper<'a> {
    parent: &'a mut (dyn SubMapperParent + 'a),
    options: RouteOptions,
    collection_name: Option<String>,
    resource_name: Option<String>,
    formatted: Option<bool>,
    member: Option<RouteOptions>,
}

impl<'a> SubMapper<'a> {
    pub fn new(parent: &'a mut (dyn SubMapperParent + 'a), mut options: RouteOptions) -> Self {
        let formatted = options.formatted.take();
        Self {
            parent,
            options,
            collection_name: None,
            resource_name: None,
            formatted,
            member: None,
        }
    }

    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn with_resource_name(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    pub fn collection_name(&self) -> Option<&str> {
        self.collection_name.as_deref()
    }

    /// The member scope of a collection
    ///
    /// Only submappers returned by
    /// [`collection`](SubMapperParent::collection) have one.
    pub fn member(&mut self) -> Option<SubMapper<'_>> {
        let options = self.member.clone()?;
        Some(SubMapper::new(self, options))
    }

    /// Connects a route through this scope
    ///
    /// Stored options are merged with `options` (the call's values win).
    /// With `path` set to `None`, `name` serves as both: the route keeps the
    /// name and is mounted at `/name`, so `connect(Some("stats"), None, ..)`
    /// under an `/admin` scope named `admin_` registers `admin_stats` at
    /// `/admin/stats`. Both get this scope's prefixes before being handed
    /// to the parent.
    pub fn connect(
        &mut self,
        name: Option<&str>,
        path: Option<&str>,
        options: RouteOptions,
    ) -> Result<()> {
        let mut merged = self.options.merge(&options);
        let path = match path {
            Some(path) => Cow::Borrowed(path),
            None => ensure_leading_slash(name.unwrap_or_default()),
        };

        let path_prefix = merged.path_prefix.take().unwrap_or_default();
        let name_prefix = merged.name_prefix.take().unwrap_or_default();
        merged.formatted = None;

        let path = join_prefix(&path_prefix, &path);
        let name = name.map(|n| format!("{}{}", name_prefix, n));

        self.parent.connect_route(name.as_deref(), &path, merged)
    }

    /// Connects `"/" + rel` (plus an optional format suffix) under this scope
    ///
    /// The name defaults to `{rel}_{resource}` and the action to `rel`.
    pub fn link(
        &mut self,
        rel: Option<&str>,
        name: Option<&str>,
        action: Option<&str>,
        method: Method,
        formatted: Option<bool>,
        options: RouteOptions,
    ) -> Result<()> {
        let segment = rel.or(name).unwrap_or_default();
        let path = format!("/{}{}", segment, self.format_suffix(formatted));
        let name = name
            .map(str::to_string)
            .or_else(|| self.default_name(rel.unwrap_or(segment)));
        let action = action.or(rel).or(name.as_deref()).unwrap_or(segment).to_string();

        let options = with_method(options, method).with_action(action);
        self.connect(name.as_deref(), Some(&path), options)
    }

    /// Connects the scope's own path (plus an optional format suffix)
    ///
    /// The name defaults to `{action}_{resource}` and the action to `action`.
    pub fn action(
        &mut self,
        name: Option<&str>,
        action: Option<&str>,
        method: Method,
        formatted: Option<bool>,
        options: RouteOptions,
    ) -> Result<()> {
        let action = action.unwrap_or("action");
        let path = self.format_suffix(formatted).to_string();
        let name = name
            .map(str::to_string)
            .or_else(|| self.default_name(action));

        let options = with_method(options, method).with_action(action);
        self.connect(name.as_deref(), Some(&path), options)
    }

    /// `GET` on the collection, named after the collection
    pub fn index(&mut self) -> Result<()> {
        let name = self.collection_name.clone();
        self.action(name.as_deref(), Some("index"), Method::GET, None, RouteOptions::new())
    }

    /// `POST` on the collection
    pub fn create(&mut self) -> Result<()> {
        self.action(None, Some("create"), Method::POST, None, RouteOptions::new())
    }

    /// `GET .../new`
    pub fn new_form(&mut self) -> Result<()> {
        self.link(Some("new"), None, None, Method::GET, None, RouteOptions::new())
    }

    /// `GET` on a member, named after the resource
    pub fn show(&mut self) -> Result<()> {
        let name = self.resource_name().map(str::to_string);
        self.action(name.as_deref(), Some("show"), Method::GET, None, RouteOptions::new())
    }

    /// `PUT` on a member
    pub fn update(&mut self) -> Result<()> {
        self.action(None, Some("update"), Method::PUT, None, RouteOptions::new())
    }

    /// `DELETE` on a member
    pub fn delete(&mut self) -> Result<()> {
        self.action(None, Some("delete"), Method::DELETE, None, RouteOptions::new())
    }

    /// `GET .../edit`
    pub fn edit(&mut self) -> Result<()> {
        self.link(Some("edit"), None, None, Method::GET, None, RouteOptions::new())
    }

    fn format_suffix(&self, formatted: Option<bool>) -> &'static str {
        let formatted = formatted
            .or_else(|| SubMapperParent::formatted(self))
            .unwrap_or(true);
        if formatted {
            "{.format}"
        } else {
            ""
        }
    }

    fn default_name(&self, prefix: &str) -> Option<String> {
        self.resource_name()
            .map(|resource| format!("{}_{}", prefix, resource))
    }
}

impl SubMapperParent for SubMapper<'_> {
    fn connect_route(
        &mut self,
        name: Option<&str>,
        path: &str,
        options: RouteOptions,
    ) -> Result<()> {
        self.connect(name, Some(path), options)
    }

    fn formatted(&self) -> Option<bool> {
        self.formatted.or_else(|| self.parent.formatted())
    }

    fn resource_name(&self) -> Option<&str> {
        self.resource_name
            .as_deref()
            .or_else(|| self.parent.resource_name())
    }
}

impl fmt::Debug for SubMapper<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubMapper")
            .field("options", &self.options)
            .field("collection_name", &self.collection_name)
            .field("resource_name", &self.resource_name)
            .field("formatted", &self.formatted)
            .field("member", &self.member)
            .finish_non_exhaustive()
    }
}

/// Attaches a method condition unless the caller set conditions already
fn with_method(options: RouteOptions, method: Method) -> RouteOptions {
    if options.conditions.is_some() {
        options
    } else {
        options.with_conditions(Conditions::method(method))
    }
}

/// The seven REST actions a collection can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAction {
    Index,
    Create,
    New,
    Show,
    Update,
    Delete,
    Edit,
}

impl ResourceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceAction::Index => "index",
            ResourceAction::Create => "create",
            ResourceAction::New => "new",
            ResourceAction::Show => "show",
            ResourceAction::Update => "update",
            ResourceAction::Delete => "delete",
            ResourceAction::Edit => "edit",
        }
    }

    /// HTTP method the action's route is restricted to
    pub fn method(&self) -> Method {
        match self {
            ResourceAction::Index
            | ResourceAction::New
            | ResourceAction::Show
            | ResourceAction::Edit => Method::GET,
            ResourceAction::Create => Method::POST,
            ResourceAction::Update => Method::PUT,
            ResourceAction::Delete => Method::DELETE,
        }
    }

    /// Whether the action addresses a single member rather than the collection
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            ResourceAction::Show
                | ResourceAction::Update
                | ResourceAction::Delete
                | ResourceAction::Edit
        )
    }

    /// Registers this action's route on `submapper`
    pub fn apply(&self, submapper: &mut SubMapper<'_>) -> Result<()> {
        match self {
            ResourceAction::Index => submapper.index(),
            ResourceAction::Create => submapper.create(),
            ResourceAction::New => submapper.new_form(),
            ResourceAction::Show => submapper.show(),
            ResourceAction::Update => submapper.update(),
            ResourceAction::Delete => submapper.delete(),
            ResourceAction::Edit => submapper.edit(),
        }
    }

    /// Parses a list of action names, failing on the first unknown one
    pub fn parse_list<I, S>(names: I) -> Result<Vec<ResourceAction>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl FromStr for ResourceAction {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "index" => Ok(ResourceAction::Index),
            "create" => Ok(ResourceAction::Create),
            "new" => Ok(ResourceAction::New),
            "show" => Ok(ResourceAction::Show),
            "update" => Ok(ResourceAction::Update),
            "delete" => Ok(ResourceAction::Delete),
            "edit" => Ok(ResourceAction::Edit),
            other => Err(RouteError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`SubMapperParent::collection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOptions {
    /// Defaults to `"/" + collection_name`
    pub path_prefix: Option<String>,
    pub member_prefix: String,
    /// Defaults to the resource name
    pub controller: Option<String>,
    pub collection_actions: Vec<ResourceAction>,
    pub member_actions: Vec<ResourceAction>,
    /// Extra options for the member scope
    pub member_options: Option<RouteOptions>,
    /// Extra options for the collection scope
    pub options: RouteOptions,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            path_prefix: None,
            member_prefix: "/{id}".to_string(),
            controller: None,
            collection_actions: COLLECTION_ACTIONS.to_vec(),
            member_actions: MEMBER_ACTIONS.to_vec(),
            member_options: None,
            options: RouteOptions::new(),
        }
    }
}

impl CollectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    pub fn with_member_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.member_prefix = prefix.into();
        self
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn with_collection_actions(mut self, actions: Vec<ResourceAction>) -> Self {
        self.collection_actions = actions;
        self
    }

    pub fn with_member_actions(mut self, actions: Vec<ResourceAction>) -> Self {
        self.member_actions = actions;
        self
    }

    pub fn with_member_options(mut self, options: RouteOptions) -> Self {
        self.member_options = Some(options);
        self
    }

    pub fn with_options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }
}
