#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Request identity resolution
//!
//! Locates the identity of the resource a request operates on (typically a
//! record id) without hard-coding where that value lives. Three sources are
//! consulted in a fixed order:
//!
//! 1. route parameters (`/items/{id}`)
//! 2. request input (query string and body fields)
//! 3. variables assigned to the render context
//!
//! Each source can be toggled independently and all of them are queried with
//! the same identifier.
//!
//! ```
//! use modkit_identity::{HttpRequestContext, IdentityResolver, RenderView, RouteMatch};
//! use serde_json::json;
//!
//! let request = HttpRequestContext::new()
//!     .with_route(RouteMatch::new("/items/{id}").with_param("id", "42"))
//!     .with_input("item_id", "from-input");
//! let view = RenderView::new("items.edit").with("item_id", 7);
//!
//! let mut resolver = IdentityResolver::new(&request, Some(&view));
//! assert_eq!(resolver.resolve_identity(), Some(json!("42")));
//!
//! resolver.enable_input().set_identifier("item_id");
//! assert_eq!(resolver.resolve_identity(), Some(json!("from-input")));
//!
//! resolver.disable_input();
//! assert_eq!(resolver.resolve_identity(), Some(json!(7)));
//! ```

pub mod config;
pub mod context;
pub mod errors;
pub mod resolver;
pub mod source;

#[cfg(feature = "axum-ext")]
pub mod axum_ext;

pub use config::IdentityResolverConfig;
pub use context::{
    HttpRequestContext, RenderContext, RenderView, RequestContext, RouteMatch, ViewData,
};
pub use errors::IdentityError;
pub use resolver::IdentityResolver;
pub use source::{IdentitySource, IdentityValue, ResolvedIdentity};

#[cfg(feature = "axum-ext")]
pub use axum_ext::{FullRequestContext, RequestIdentity};
