//! # warden
//!
//! Convention-based authorization dispatch.
//!
//! Callers ask "may this actor do X in context C?" and the [`Dispatcher`]
//! routes the question to the [`Policy`] registered for `C` (by default under
//! `"<C>.Policy"`), normalizing whatever the policy answers into an
//! [`Outcome`]. [`Dispatcher::limit`] does the same for narrowing a [`Scope`]
//! down to what the actor may access, inferring the scope's resource type.
//!
//! ## Key invariants
//!
//! - **Denials are values**: `guard` returns `Outcome::Error(reason)`; only
//!   `guard_or_fail` turns a denial into an error.
//! - **Broken calls are errors**: a bad context, an uninferable scope, an
//!   unregistered policy or a policy answering outside its contract always
//!   abort the call and are never mistaken for a denial (except by `can`,
//!   which reads every failure as `false`).
//! - **Reserved options stay private**: `policy`, `resource`,
//!   `error_message` and `error_status` never reach a policy's params.
//!
//! ## Quick Example
//!
//! ```rust
//! use warden::{Action, Conn, Dispatcher, Options, Outcome, Params, Policy, PolicyRegistry, RawResult};
//!
//! struct OrderPolicy;
//!
//! impl Policy<String> for OrderPolicy {
//!     fn guard(&self, user: Option<&String>, action: &Action, _params: &Params) -> RawResult {
//!         (user.is_some() && action.as_str() == "read").into()
//!     }
//! }
//!
//! let mut registry = PolicyRegistry::new();
//! registry.register_for("Shop.Orders", OrderPolicy).unwrap();
//! let dispatcher = Dispatcher::new(registry);
//!
//! let conn = Conn::new().with_current_user("alice".to_string());
//! assert_eq!(dispatcher.guard(&conn, "Shop.Orders", "read", Options::new()).unwrap(), Outcome::Ok);
//! assert!(!dispatcher.can(&conn, "Shop.Orders", "delete", Options::new()));
//! ```

pub mod actor;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod options;
pub mod outcome;
pub mod policy;
pub mod scope;

pub use actor::{resolve_user, Actor, Assigns, Conn, Subject, UserResolver, CURRENT_USER};
pub use config::{ConfigError, DispatchConfig};
pub use context::{resolve_policy, ContextId, PolicyId};
pub use dispatch::{Dispatcher, DispatcherBuilder};
pub use error::{AuthorizationFailure, DispatchError};
pub use options::{merge_options, Options, Params};
pub use outcome::{normalize, Outcome, RawResult, Reason};
pub use policy::{Action, Policy, PolicyRegistry};
pub use scope::{resolve_resource, Filter, Query, Record, ResourceType, Scope};
