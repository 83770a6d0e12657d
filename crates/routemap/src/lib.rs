//! # routemap
//!
//! URL dispatch for web services:
//! - Path templates (`/users/{id}`), with constraints (`{id:int}`,
//!   `{year:\d{4}}`), optional variables (`{page?}`) and format suffixes
//!   (`{.format}`)
//! - First-match routing with HTTP method conditions
//! - Reverse routing: paths from a route name, or from controller and action
//! - Submappers that share prefixes and options, and REST collections
//! - A per-thread request context with host and scheme resolution
//!
//! ## Phases
//!
//! Routes are registered through `&mut Mapper` at startup. The mapper is then
//! shared as `Arc<Mapper>`; matching takes `&self` and memoizes results in a
//! bounded concurrent cache.
//!
//! ## Example
//!
//! ```
//! use routemap::{CollectionOptions, Mapper, RouteOptions, SubMapperParent};
//! use http::Method;
//! use std::collections::HashMap;
//!
//! let mut mapper = Mapper::new();
//! mapper
//!     .collection("messages", "message", CollectionOptions::new())
//!     .unwrap();
//! mapper
//!     .connect(Some("home"), "/", RouteOptions::new().with_controller("pages"))
//!     .unwrap();
//! assert_eq!(mapper.len(), 8);
//!
//! let matched = mapper.match_route("/messages/3.json", &Method::PUT).unwrap();
//! assert_eq!(matched.get("action"), Some("update"));
//! assert_eq!(matched.get("id"), Some("3"));
//! assert_eq!(matched.get("format"), Some("json"));
//!
//! let mut params = HashMap::new();
//! params.insert("id".to_string(), "3".to_string());
//! assert_eq!(
//!     mapper.generate(Some("edit_message"), &params).unwrap(),
//!     "/messages/3/edit"
//! );
//! ```

mod cache;
mod config;
mod constraint;
mod error;
mod mapper;
pub mod path;
mod request;
pub mod route;
mod submapper;

pub use cache::{MatchCache, DEFAULT_CACHE_SIZE};
pub use config::MapperConfig;
pub use constraint::ParameterConstraint;
pub use error::{PatternError, Result, RouteError};
pub use mapper::Mapper;
pub use request::{resolve_host, resolve_protocol, Environ, RequestConfig};
pub use route::{Conditions, MatchResult, Redirect, Route, RouteOptions};
pub use submapper::{
    CollectionOptions, ResourceAction, SubMapper, SubMapperParent, COLLECTION_ACTIONS,
    MEMBER_ACTIONS,
};
