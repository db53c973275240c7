// error.rs - Error types for the dispatch layer.
//
// Resolution errors (bad context, bad scope, unknown policy, malformed
// reserved option, broken policy) are caller or policy bugs and abort the
// call. Ordinary denials are `Outcome::Error` values, except at
// `Dispatcher::guard_or_fail()`, which surfaces them as `Unauthorized`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::Reason;

/// Errors that can occur while dispatching an authorization call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// The context argument is not a concrete type identifier.
    #[error("invalid context '{context}': expected a type identifier such as 'Shop.Orders'")]
    InvalidContext { context: String },

    /// No resource type can be inferred from the scope and none was given.
    #[error("cannot infer a resource type from {scope}; pass the `resource` option explicitly")]
    InvalidScope { scope: String },

    /// The resolved policy id has no registered implementation.
    #[error("no policy registered under '{policy}'")]
    PolicyNotFound { policy: String },

    /// A reserved option carried a value of the wrong shape.
    #[error("invalid `{key}` option: {reason}")]
    InvalidOption { key: String, reason: String },

    /// A policy's guard returned something outside the recognized set.
    #[error("policy '{policy}' returned an unexpected guard result: {value}")]
    UnexpectedPolicyResult {
        policy: String,
        value: serde_json::Value,
    },

    /// The action was denied (raised only by `guard_or_fail`).
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationFailure),
}

impl DispatchError {
    /// True for an ordinary denial, false for resolution or contract errors.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, DispatchError::Unauthorized(_))
    }
}

/// A denied action, shaped for a top-level responder (e.g. an HTTP handler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message} (status {status}, reason: {reason})")]
pub struct AuthorizationFailure {
    /// Human-readable message.
    pub message: String,
    /// Status code to respond with.
    pub status: u16,
    /// The denial reason reported by the policy.
    pub reason: Reason,
}
