// actor.rs - Actors and resolution of the authorization subject.
//
// An actor is whatever the caller has at hand: the user itself, or a carrier
// (a request context, a session) that holds the user somewhere inside it.
// The default rule reads `current_user` from the carrier's assigns; when the
// actor has no assigns it is asked for itself as the subject. Integrators
// with other shapes inject a `UserResolver` when building the dispatcher.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::options::Options;

/// Assigns key read by the default user resolver.
pub const CURRENT_USER: &str = "current_user";

/// Named attributes attached to a carrier actor.
pub type Assigns<U> = HashMap<String, U>;

/// Anything that can stand in for "who is acting".
///
/// Every method is optional; an actor that implements none of them resolves
/// to an anonymous (`None`) user and contributes no default options.
pub trait Actor<U> {
    /// Named attribute map the default resolver reads the user from.
    fn assigns(&self) -> Option<&Assigns<U>> {
        None
    }

    /// Ambient default options merged under every call's options.
    fn default_options(&self) -> Option<&Options> {
        None
    }

    /// The actor itself, as the subject, when it has no assigns.
    fn subject(&self) -> Option<U> {
        None
    }
}

/// A user acting directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject<U>(pub U);

impl<U> Subject<U> {
    pub fn new(user: U) -> Self {
        Self(user)
    }
}

impl<U: Clone> Actor<U> for Subject<U> {
    fn subject(&self) -> Option<U> {
        Some(self.0.clone())
    }
}

/// A request-context carrier: assigns plus a private default-options slot.
#[derive(Debug, Clone)]
pub struct Conn<U> {
    assigns: Assigns<U>,
    private_options: Option<Options>,
}

impl<U> Conn<U> {
    pub fn new() -> Self {
        Self {
            assigns: HashMap::new(),
            private_options: None,
        }
    }

    /// Attach a named attribute.
    pub fn assign(mut self, key: impl Into<String>, value: U) -> Self {
        self.assigns.insert(key.into(), value);
        self
    }

    pub fn with_current_user(self, user: U) -> Self {
        self.assign(CURRENT_USER, user)
    }

    /// Stash default options for every dispatch made with this conn.
    pub fn with_default_options(mut self, options: Options) -> Self {
        self.put_default_options(options);
        self
    }

    pub fn put_default_options(&mut self, options: Options) {
        self.private_options = Some(options);
    }
}

impl<U> Default for Conn<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> Actor<U> for Conn<U> {
    fn assigns(&self) -> Option<&Assigns<U>> {
        Some(&self.assigns)
    }

    fn default_options(&self) -> Option<&Options> {
        self.private_options.as_ref()
    }
}

type ResolveFn<U> = dyn Fn(&dyn Actor<U>) -> Option<U> + Send + Sync;

/// Strategy mapping an actor to the user passed to policies.
pub struct UserResolver<U> {
    resolve: Arc<ResolveFn<U>>,
}

impl<U> UserResolver<U> {
    /// A custom resolution rule.
    pub fn new(resolve: impl Fn(&dyn Actor<U>) -> Option<U> + Send + Sync + 'static) -> Self {
        Self {
            resolve: Arc::new(resolve),
        }
    }

    pub fn resolve(&self, actor: &dyn Actor<U>) -> Option<U> {
        (self.resolve)(actor)
    }
}

impl<U: Clone + 'static> UserResolver<U> {
    /// The default rule, reading the user from assigns under `key`.
    pub fn from_assigns(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(move |actor| resolve_from_assigns(actor, &key))
    }
}

impl<U: Clone + 'static> Default for UserResolver<U> {
    fn default() -> Self {
        Self::from_assigns(CURRENT_USER)
    }
}

impl<U> Clone for UserResolver<U> {
    fn clone(&self) -> Self {
        Self {
            resolve: Arc::clone(&self.resolve),
        }
    }
}

impl<U> fmt::Debug for UserResolver<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserResolver").finish_non_exhaustive()
    }
}

/// Resolve the user with the default rule.
///
/// An actor with assigns but no `current_user` resolves to `None`, which is
/// a valid (anonymous) user rather than an error.
pub fn resolve_user<U: Clone>(actor: &dyn Actor<U>) -> Option<U> {
    resolve_from_assigns(actor, CURRENT_USER)
}

fn resolve_from_assigns<U: Clone>(actor: &dyn Actor<U>, key: &str) -> Option<U> {
    match actor.assigns() {
        Some(assigns) => assigns.get(key).cloned(),
        None => actor.subject(),
    }
}
