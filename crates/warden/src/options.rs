// options.rs - Call options, ambient defaults and the params forwarded to policies.
//
// Four keys are reserved for the dispatcher (`policy`, `resource`,
// `error_message`, `error_status`). Everything else is a param and reaches
// the policy verbatim, in insertion order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::actor::Actor;
use crate::context::PolicyId;
use crate::error::DispatchError;
use crate::scope::ResourceType;

pub const POLICY: &str = "policy";
pub const RESOURCE: &str = "resource";
pub const ERROR_MESSAGE: &str = "error_message";
pub const ERROR_STATUS: &str = "error_status";

const RESERVED: &[&str] = &[POLICY, RESOURCE, ERROR_MESSAGE, ERROR_STATUS];

/// Options for a single dispatch call (or ambient defaults stashed on an actor).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(Map<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch to this policy instead of the context's conventional one.
    pub fn policy(self, policy: impl Into<PolicyId>) -> Self {
        self.param(POLICY, policy.into().as_str())
    }

    /// Use this resource type instead of inferring it from the scope.
    pub fn resource(self, resource: impl Into<ResourceType>) -> Self {
        self.param(RESOURCE, resource.into().as_str())
    }

    pub fn error_message(self, message: impl Into<String>) -> Self {
        self.param(ERROR_MESSAGE, message.into())
    }

    pub fn error_status(self, status: u16) -> Self {
        self.param(ERROR_STATUS, status)
    }

    /// Set an arbitrary option. Unreserved keys are forwarded as params.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Layer these options over `defaults`; same-keyed entries here win.
    pub fn merged_over(self, defaults: &Options) -> Options {
        let mut merged = defaults.0.clone();
        for (key, value) in self.0 {
            merged.insert(key, value);
        }
        Options(merged)
    }

    pub(crate) fn take_policy(&mut self) -> Result<Option<PolicyId>, DispatchError> {
        Ok(self.take_string(POLICY)?.map(PolicyId::new))
    }

    pub(crate) fn take_resource(&mut self) -> Result<Option<ResourceType>, DispatchError> {
        Ok(self.take_string(RESOURCE)?.map(ResourceType::new))
    }

    pub(crate) fn take_error_message(&mut self) -> Result<Option<String>, DispatchError> {
        self.take_string(ERROR_MESSAGE)
    }

    pub(crate) fn take_error_status(&mut self) -> Result<Option<u16>, DispatchError> {
        match self.0.shift_remove(ERROR_STATUS) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .filter(|status| (100..=599).contains(status))
                .and_then(|status| u16::try_from(status).ok())
                .map(Some)
                .ok_or_else(|| DispatchError::InvalidOption {
                    key: ERROR_STATUS.to_string(),
                    reason: format!("expected a status code between 100 and 599, got {value}"),
                }),
        }
    }

    /// Everything left after the dispatcher took what it needs. Reserved keys
    /// an entry point does not consume are dropped, never forwarded.
    pub(crate) fn into_params(mut self) -> Params {
        self.0.retain(|key, _| !RESERVED.contains(&key.as_str()));
        Params(self.0)
    }

    fn take_string(&mut self, key: &str) -> Result<Option<String>, DispatchError> {
        match self.0.shift_remove(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(DispatchError::InvalidOption {
                key: key.to_string(),
                reason: format!("expected a string, got {other}"),
            }),
        }
    }
}

impl FromIterator<(String, Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Free-form parameters forwarded to a policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Merge the actor's ambient default options (if any) with call options.
pub fn merge_options<U>(actor: &dyn Actor<U>, options: Options) -> Options {
    match actor.default_options() {
        Some(defaults) => options.merged_over(defaults),
        None => options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Conn, Subject};
    use serde_json::json;

    #[test]
    fn no_defaults_leaves_options_untouched() {
        let opts = Options::new().param("page", 2).policy("Other.Policy");
        let actor = Subject::new("alice".to_string());
        assert_eq!(merge_options::<String>(&actor, opts.clone()), opts);

        let conn: Conn<String> = Conn::new();
        assert_eq!(merge_options::<String>(&conn, opts.clone()), opts);
    }

    #[test]
    fn call_options_override_defaults() {
        let defaults = Options::new()
            .param("tenant", "acme")
            .param("page", 1)
            .error_status(404);
        let conn: Conn<String> = Conn::new().with_default_options(defaults);

        let merged = merge_options::<String>(&conn, Options::new().param("page", 3).param("q", "x"));
        assert_eq!(merged.get("tenant"), Some(&json!("acme")));
        assert_eq!(merged.get("page"), Some(&json!(3)));
        assert_eq!(merged.get("q"), Some(&json!("x")));
        assert_eq!(merged.get(ERROR_STATUS), Some(&json!(404)));
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn merge_keeps_default_key_order() {
        let defaults = Options::new().param("a", 1).param("b", 2);
        let merged = Options::new().param("c", 3).param("a", 9).merged_over(&defaults);
        let keys: Vec<_> = merged.into_params().iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn params_never_contain_reserved_keys() {
        let params = Options::new()
            .policy("X.Policy")
            .resource("X")
            .error_message("m")
            .error_status(401)
            .param("keep", true)
            .into_params();
        assert_eq!(params.len(), 1);
        assert!(params.contains_key("keep"));
        for key in RESERVED {
            assert!(!params.contains_key(key));
        }
    }

    #[test]
    fn take_consumes_reserved_values() {
        let mut opts = Options::new().policy("X.Policy").error_status(418);
        assert_eq!(opts.take_policy().unwrap(), Some(PolicyId::new("X.Policy")));
        assert_eq!(opts.take_policy().unwrap(), None);
        assert_eq!(opts.take_error_status().unwrap(), Some(418));
        assert!(opts.is_empty());
    }

    #[test]
    fn malformed_reserved_values_are_rejected() {
        let mut opts = Options::new().param(POLICY, 5);
        assert!(matches!(
            opts.take_policy(),
            Err(DispatchError::InvalidOption { key, .. }) if key == POLICY
        ));

        for status in [json!(42), json!("403"), json!(-1), json!(700)] {
            let mut opts = Options::new().param(ERROR_STATUS, status);
            assert!(matches!(
                opts.take_error_status(),
                Err(DispatchError::InvalidOption { key, .. }) if key == ERROR_STATUS
            ));
        }
    }

    #[test]
    fn options_deserialize_from_json_objects() {
        let opts: Options =
            serde_json::from_value(json!({"policy": "A.Policy", "limit": 10})).unwrap();
        assert_eq!(opts.get(POLICY), Some(&json!("A.Policy")));
        assert_eq!(opts.len(), 2);
    }
}
