// dispatch.rs - The dispatcher: the caller-facing guard, can and limit calls.
//
// Every call follows the same path:
//
// 1. Merge the actor's default options under the call options.
// 2. Take the `policy` override, else derive "<Context>.Policy".
// 3. (limit) Take the `resource` override, else infer it from the scope.
// 4. Whatever options remain become the policy's params.
// 5. Resolve the user from the actor.
// 6. Delegate to the policy; normalize guard results.
//
// Resolution errors abort the call. Denials are values, except in
// `guard_or_fail()`.

use crate::actor::{Actor, UserResolver};
use crate::config::DispatchConfig;
use crate::context::PolicyId;
use crate::error::{AuthorizationFailure, DispatchError};
use crate::options::{merge_options, Options};
use crate::outcome::{normalize, Outcome};
use crate::policy::{Action, PolicyRegistry};
use crate::scope::{resolve_resource, Scope};

/// Routes authorization calls to the policy registered for each context.
///
/// Holds no mutable state; share it freely across threads.
#[derive(Debug)]
pub struct Dispatcher<U> {
    registry: PolicyRegistry<U>,
    resolver: UserResolver<U>,
    config: DispatchConfig,
}

/// Builder for a [`Dispatcher`].
#[derive(Debug)]
pub struct DispatcherBuilder<U> {
    registry: PolicyRegistry<U>,
    resolver: Option<UserResolver<U>>,
    config: DispatchConfig,
}

impl<U: Clone + 'static> DispatcherBuilder<U> {
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default "assigns, else the actor itself" user rule.
    pub fn user_resolver(mut self, resolver: UserResolver<U>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Dispatcher<U> {
        let resolver = self
            .resolver
            .unwrap_or_else(|| UserResolver::from_assigns(self.config.current_user_key.clone()));
        Dispatcher {
            registry: self.registry,
            resolver,
            config: self.config,
        }
    }
}

impl<U: Clone + 'static> Dispatcher<U> {
    pub fn builder(registry: PolicyRegistry<U>) -> DispatcherBuilder<U> {
        DispatcherBuilder {
            registry,
            resolver: None,
            config: DispatchConfig::default(),
        }
    }

    /// A dispatcher with the default config and user rule.
    pub fn new(registry: PolicyRegistry<U>) -> Self {
        Self::builder(registry).build()
    }

    pub fn registry(&self) -> &PolicyRegistry<U> {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The user policies will see for `actor`.
    pub fn resolve_user(&self, actor: &dyn Actor<U>) -> Option<U> {
        self.resolver.resolve(actor)
    }

    /// Ask the context's policy whether the actor may perform `action`.
    ///
    /// A denial is `Ok(Outcome::Error(reason))`; `Err` means the call itself
    /// was broken (bad context, unknown policy, misbehaving policy).
    pub fn guard(
        &self,
        actor: &dyn Actor<U>,
        context: &str,
        action: impl Into<Action>,
        options: Options,
    ) -> Result<Outcome, DispatchError> {
        let options = merge_options(actor, options);
        self.guard_merged(actor, context, &action.into(), options)
    }

    /// Like [`guard`](Self::guard), but a denial becomes
    /// `Err(DispatchError::Unauthorized)` carrying a message, a status and the reason.
    pub fn guard_or_fail(
        &self,
        actor: &dyn Actor<U>,
        context: &str,
        action: impl Into<Action>,
        options: Options,
    ) -> Result<(), DispatchError> {
        let mut options = merge_options(actor, options);
        let message = options
            .take_error_message()?
            .unwrap_or_else(|| self.config.error_message.clone());
        let status = options
            .take_error_status()?
            .unwrap_or(self.config.error_status);

        match self.guard_merged(actor, context, &action.into(), options)? {
            Outcome::Ok => Ok(()),
            Outcome::Error(reason) => Err(AuthorizationFailure {
                message,
                status,
                reason,
            }
            .into()),
        }
    }

    /// True only when the policy allows the action. Every error, including
    /// a broken call, reads as `false`; use [`guard`](Self::guard) to tell them apart.
    pub fn can(
        &self,
        actor: &dyn Actor<U>,
        context: &str,
        action: impl Into<Action>,
        options: Options,
    ) -> bool {
        match self.guard(actor, context, action, options) {
            Ok(outcome) => outcome.is_ok(),
            Err(err) => {
                tracing::debug!(context, error = %err, "can() treating dispatch error as denial");
                false
            }
        }
    }

    /// Narrow `scope` to what the actor may access, via the context's policy.
    ///
    /// The policy's answer is returned as is.
    pub fn limit(
        &self,
        actor: &dyn Actor<U>,
        context: &str,
        scope: impl Into<Scope>,
        options: Options,
    ) -> Result<Scope, DispatchError> {
        let scope = scope.into();
        let mut options = merge_options(actor, options);
        let policy_id = self.take_policy_id(&mut options, context)?;
        let resource = match options.take_resource()? {
            Some(resource) => resource,
            None => resolve_resource(&scope)?,
        };
        let params = options.into_params();
        let policy = self.registry.get(&policy_id)?;
        let user = self.resolver.resolve(actor);

        tracing::debug!(
            context,
            policy = %policy_id,
            resource = %resource,
            anonymous = user.is_none(),
            "dispatching limit"
        );
        Ok(policy.limit(user.as_ref(), &resource, scope, &params))
    }

    fn guard_merged(
        &self,
        actor: &dyn Actor<U>,
        context: &str,
        action: &Action,
        mut options: Options,
    ) -> Result<Outcome, DispatchError> {
        let policy_id = self.take_policy_id(&mut options, context)?;
        let params = options.into_params();
        let policy = self.registry.get(&policy_id)?;
        let user = self.resolver.resolve(actor);

        tracing::debug!(
            context,
            policy = %policy_id,
            action = %action,
            anonymous = user.is_none(),
            "dispatching guard"
        );
        let outcome = normalize(&policy_id, policy.guard(user.as_ref(), action, &params))?;
        if let Outcome::Error(reason) = &outcome {
            tracing::debug!(policy = %policy_id, action = %action, reason = %reason, "guard denied");
        }
        Ok(outcome)
    }

    /// An explicit `policy` option wins; the context is only consulted without one.
    fn take_policy_id(
        &self,
        options: &mut Options,
        context: &str,
    ) -> Result<PolicyId, DispatchError> {
        match options.take_policy()? {
            Some(policy_id) => Ok(policy_id),
            None => self.registry.policy_id_for(context),
        }
    }
}
