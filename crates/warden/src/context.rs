// context.rs - Context identifiers and convention-based policy ids.
//
// A context names a business area ("Shop.Orders"). Its policy lives under
// "<Context>.Policy" unless the caller names one explicitly. The id is only
// a name; whether anything is registered under it is checked at dispatch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Suffix appended to a context to form its conventional policy id.
pub const DEFAULT_POLICY_SUFFIX: &str = "Policy";

/// A validated context identifier, e.g. `Shop.Orders` or `Shop::Orders`.
///
/// The policy suffix is always joined with `.`, so a `::` context yields a
/// mixed-separator id such as `Shop::Orders.Policy`. Register policies for
/// such contexts with `PolicyRegistry::register_for` to get the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContextId(String);

impl ContextId {
    /// Parse a context, rejecting anything that is not a type identifier.
    pub fn parse(context: &str) -> Result<Self, DispatchError> {
        if is_type_identifier(context) {
            Ok(Self(context.to_string()))
        } else {
            Err(DispatchError::InvalidContext {
                context: context.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The conventional policy id: `<context>.<suffix>`.
    pub fn policy_id(&self, suffix: &str) -> PolicyId {
        PolicyId(format!("{}.{}", self.0, suffix))
    }
}

impl FromStr for ContextId {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContextId {
    type Error = DispatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContextId> for String {
    fn from(context: ContextId) -> Self {
        context.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier under which a policy is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(String);

impl PolicyId {
    /// An explicit policy id. Not validated: overrides are taken verbatim.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PolicyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Resolve the conventional policy id for `context`.
pub fn resolve_policy(context: &str) -> Result<PolicyId, DispatchError> {
    Ok(ContextId::parse(context)?.policy_id(DEFAULT_POLICY_SUFFIX))
}

/// True when `s` looks like a type path: segments separated by `.` or `::`,
/// each starting with an uppercase ASCII letter followed by alphanumerics or `_`.
fn is_type_identifier(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    s.split("::")
        .flat_map(|part| part.split('.'))
        .all(is_type_segment)
}

fn is_type_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convention_appends_policy() {
        assert_eq!(
            resolve_policy("ContextX").unwrap(),
            PolicyId::new("ContextX.Policy")
        );
        assert_eq!(
            resolve_policy("Shop.Orders").unwrap().as_str(),
            "Shop.Orders.Policy"
        );
        assert_eq!(
            resolve_policy("Shop::Orders").unwrap().as_str(),
            "Shop::Orders.Policy"
        );
    }

    #[test]
    fn non_type_contexts_are_rejected() {
        for bad in ["42", "", "orders", "Shop.", ".Shop", "Shop..Orders", "Shop Orders", "Shop:Orders"] {
            assert_eq!(
                resolve_policy(bad),
                Err(DispatchError::InvalidContext {
                    context: bad.to_string()
                }),
                "context {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn custom_suffix() {
        let context: ContextId = "Billing".parse().unwrap();
        assert_eq!(context.policy_id("Rules").as_str(), "Billing.Rules");
    }

    #[test]
    fn context_deserialization_validates() {
        let ok: ContextId = serde_json::from_str("\"Shop.Orders\"").unwrap();
        assert_eq!(ok.as_str(), "Shop.Orders");
        assert!(serde_json::from_str::<ContextId>("\"42\"").is_err());
    }
}
