// policy.rs - The policy contract and the registry policies are looked up in.
//
// Every context gets its policy from the registry under "<Context>.<suffix>"
// (suffix "Policy" by default). Registration happens once at startup; the
// registry is read-only while dispatching.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::{ContextId, PolicyId, DEFAULT_POLICY_SUFFIX};
use crate::error::DispatchError;
use crate::options::Params;
use crate::outcome::RawResult;
use crate::scope::{ResourceType, Scope};

/// An action identifier, meaningful only to the policy that receives it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    pub fn new(action: impl Into<String>) -> Self {
        Self(action.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Action {
    fn from(action: &str) -> Self {
        Self::new(action)
    }
}

impl From<String> for Action {
    fn from(action: String) -> Self {
        Self(action)
    }
}

/// Business rules for one context.
///
/// `user` is `None` when the actor carried no user (anonymous access).
pub trait Policy<U>: Send + Sync {
    /// Decide whether `user` may perform `action`.
    ///
    /// Return `true`/`false`, an `Outcome`, or `RawResult::deny(reason)`.
    /// Any other shape is reported as a broken policy, not a denial.
    fn guard(&self, user: Option<&U>, action: &Action, params: &Params) -> RawResult;

    /// Narrow `scope` to what `user` may see. The default imposes no restriction.
    fn limit(
        &self,
        _user: Option<&U>,
        _resource: &ResourceType,
        scope: Scope,
        _params: &Params,
    ) -> Scope {
        scope
    }
}

/// Policies keyed by id.
pub struct PolicyRegistry<U> {
    policies: HashMap<PolicyId, Box<dyn Policy<U>>>,
    suffix: String,
}

impl<U> PolicyRegistry<U> {
    /// An empty registry using the `<Context>.Policy` convention.
    pub fn new() -> Self {
        Self::with_suffix(DEFAULT_POLICY_SUFFIX)
    }

    /// An empty registry using the `<Context>.<suffix>` convention.
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            policies: HashMap::new(),
            suffix: suffix.into(),
        }
    }

    /// Register a policy under an explicit id.
    ///
    /// Overwrites any policy already registered under the same id.
    pub fn register(&mut self, id: impl Into<PolicyId>, policy: impl Policy<U> + 'static) {
        let id = id.into();
        tracing::info!(policy = %id, "registered policy");
        self.policies.insert(id, Box::new(policy));
    }

    /// Register a policy as the conventional policy of `context`.
    pub fn register_for(
        &mut self,
        context: &str,
        policy: impl Policy<U> + 'static,
    ) -> Result<PolicyId, DispatchError> {
        let id = self.policy_id_for(context)?;
        self.register(id.clone(), policy);
        Ok(id)
    }

    /// The conventional policy id for `context`.
    pub fn policy_id_for(&self, context: &str) -> Result<PolicyId, DispatchError> {
        Ok(ContextId::parse(context)?.policy_id(&self.suffix))
    }

    pub fn get(&self, id: &PolicyId) -> Result<&dyn Policy<U>, DispatchError> {
        self.policies
            .get(id)
            .map(|policy| policy.as_ref())
            .ok_or_else(|| DispatchError::PolicyNotFound {
                policy: id.to_string(),
            })
    }

    pub fn contains(&self, id: &PolicyId) -> bool {
        self.policies.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&PolicyId> {
        let mut ids: Vec<_> = self.policies.keys().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl<U> Default for PolicyRegistry<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> fmt::Debug for PolicyRegistry<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("suffix", &self.suffix)
            .field("policies", &self.ids())
            .finish()
    }
}
