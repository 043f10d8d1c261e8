//! Authorization rule model.
//!
//! # Purpose
//! Defines the canonical decoded form of a stored authorization rule and the
//! typed names of the secrets grants this migration rewrites.
//!
//! # Key invariants
//! - `action` is non-empty; order and content are preserved exactly by every
//!   layer except the one insert/remove the migration performs.
//! - `conditions` is an opaque payload and passes through unchanged.
use serde_json::Value;

/// Resource category whose read grants this migration rewrites.
pub const SECRETS_SUBJECT: &str = "secrets";

/// Secrets actions involved in the rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretAction {
    Read,
    ReadValue,
}

impl SecretAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SecretAction::Read => "read",
            SecretAction::ReadValue => "readValue",
        }
    }
}

impl std::fmt::Display for SecretAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single grant or denial statement in canonical form.
///
/// Loose stored shapes (bare-string actions, list subjects) are normalized
/// into this form by the codec; see [`crate::packed::unpack_rules`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationRule {
    /// Resource category the rule governs, if any.
    pub subject: Option<String>,
    /// Permitted (or denied, when inverted) operation names, in stored order.
    pub action: Vec<String>,
    /// Opaque rule-specific constraint payload.
    pub conditions: Option<Value>,
    /// Marks the rule as a denial rather than a grant.
    pub inverted: Option<bool>,
}

impl AuthorizationRule {
    /// Whether the rule's action list names the given operation.
    pub fn grants(&self, action: &str) -> bool {
        self.action.iter().any(|name| name == action)
    }

    /// Whether the rule governs the secrets resource category.
    pub fn targets_secrets(&self) -> bool {
        self.subject.as_deref() == Some(SECRETS_SUBJECT)
    }
}
