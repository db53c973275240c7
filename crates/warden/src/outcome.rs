// outcome.rs - Authorization outcomes and normalization of raw policy results.
//
// Policies may answer a guard call in several loose shapes. `normalize()`
// folds them into the two-valued `Outcome`:
//
//   true | "ok"                          → Ok
//   false | "error"                      → Error(unauthorized)
//   {"error": r} | ["error", r]          → Error(r)
//   anything else                        → UnexpectedPolicyResult
//
// The last case is a bug in the policy, never a denial.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::PolicyId;
use crate::error::DispatchError;

const OK_SENTINEL: &str = "ok";
const ERROR_SENTINEL: &str = "error";

/// Opaque denial reason reported by a policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reason(String);

impl Reason {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    /// The generic reason used when a policy denies without saying why.
    pub fn unauthorized() -> Self {
        Self::new("unauthorized")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Reason {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}

impl From<String> for Reason {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

/// The normalized result of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    /// The action is allowed.
    Ok,
    /// The action is denied for the given reason.
    Error(Reason),
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }

    /// The denial reason, if any.
    pub fn reason(&self) -> Option<&Reason> {
        match self {
            Outcome::Ok => None,
            Outcome::Error(reason) => Some(reason),
        }
    }
}

/// What a policy's guard returned, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult(pub Value);

impl RawResult {
    /// An explicit denial carrying a specific reason.
    pub fn deny(reason: impl Into<Reason>) -> Self {
        Outcome::Error(reason.into()).into()
    }
}

impl From<bool> for RawResult {
    fn from(allowed: bool) -> Self {
        Self(Value::Bool(allowed))
    }
}

impl From<&str> for RawResult {
    fn from(sentinel: &str) -> Self {
        Self(Value::String(sentinel.to_string()))
    }
}

impl From<Value> for RawResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Outcome> for RawResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Ok => Self::from(OK_SENTINEL),
            Outcome::Error(reason) => {
                let mut map = serde_json::Map::new();
                map.insert(ERROR_SENTINEL.to_string(), Value::String(reason.0));
                Self(Value::Object(map))
            }
        }
    }
}

impl From<Result<(), Reason>> for RawResult {
    fn from(result: Result<(), Reason>) -> Self {
        match result {
            Ok(()) => Outcome::Ok.into(),
            Err(reason) => Outcome::Error(reason).into(),
        }
    }
}

/// Normalize a raw guard result from `policy` into an `Outcome`.
pub fn normalize(policy: &PolicyId, raw: RawResult) -> Result<Outcome, DispatchError> {
    match recognize(&raw.0) {
        Some(outcome) => Ok(outcome),
        None => {
            tracing::warn!(
                policy = %policy,
                value = %raw.0,
                "policy returned a result outside the guard contract"
            );
            Err(DispatchError::UnexpectedPolicyResult {
                policy: policy.to_string(),
                value: raw.0,
            })
        }
    }
}

fn recognize(value: &Value) -> Option<Outcome> {
    match value {
        Value::Bool(true) => Some(Outcome::Ok),
        Value::Bool(false) => Some(Outcome::Error(Reason::unauthorized())),
        Value::String(s) if s == OK_SENTINEL => Some(Outcome::Ok),
        Value::String(s) if s == ERROR_SENTINEL => Some(Outcome::Error(Reason::unauthorized())),
        Value::Object(map) if map.len() == 1 => match map.get(ERROR_SENTINEL) {
            Some(Value::String(reason)) => Some(Outcome::Error(Reason::new(reason.as_str()))),
            _ => None,
        },
        Value::Array(items) => match items.as_slice() {
            [Value::String(tag), Value::String(reason)] if tag == ERROR_SENTINEL => {
                Some(Outcome::Error(Reason::new(reason.as_str())))
            }
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> PolicyId {
        PolicyId::new("Shop.Orders.Policy")
    }

    #[test]
    fn truthy_results_are_ok() {
        assert_eq!(normalize(&policy(), true.into()), Ok(Outcome::Ok));
        assert_eq!(normalize(&policy(), "ok".into()), Ok(Outcome::Ok));
        assert_eq!(normalize(&policy(), Outcome::Ok.into()), Ok(Outcome::Ok));
    }

    #[test]
    fn falsy_results_are_generic_denials() {
        let denied = Ok(Outcome::Error(Reason::unauthorized()));
        assert_eq!(normalize(&policy(), false.into()), denied);
        assert_eq!(normalize(&policy(), "error".into()), denied);
    }

    #[test]
    fn structured_denials_keep_their_reason() {
        let expected = Ok(Outcome::Error(Reason::new("not_owner")));
        assert_eq!(normalize(&policy(), RawResult::deny("not_owner")), expected);
        assert_eq!(
            normalize(&policy(), json!({"error": "not_owner"}).into()),
            expected
        );
        assert_eq!(
            normalize(&policy(), json!(["error", "not_owner"]).into()),
            expected
        );
        assert_eq!(
            normalize(&policy(), Err::<(), _>(Reason::new("not_owner")).into()),
            expected
        );
    }

    #[test]
    fn anything_else_is_a_contract_violation() {
        for value in [
            json!("weird"),
            json!(null),
            json!(1),
            json!({"error": 5}),
            json!({"error": "r", "extra": true}),
            json!(["ok", "r"]),
        ] {
            match normalize(&policy(), value.clone().into()) {
                Err(DispatchError::UnexpectedPolicyResult { policy, value: got }) => {
                    assert_eq!(policy, "Shop.Orders.Policy");
                    assert_eq!(got, value);
                }
                other => panic!("expected UnexpectedPolicyResult for {value}, got {other:?}"),
            }
        }
    }

    #[test]
    fn outcome_serialization() {
        let json = serde_json::to_value(Outcome::Error(Reason::new("banned"))).unwrap();
        assert_eq!(json, json!({"outcome": "error", "reason": "banned"}));
        let json = serde_json::to_value(Outcome::Ok).unwrap();
        assert_eq!(json, json!({"outcome": "ok"}));
    }
}
