//! Pure per-rule rewrites for the readValue backfill.
//!
//! Each transform consumes a rule and returns the (possibly) rewritten rule
//! plus a changed flag; nothing is mutated in place, so callers fold the
//! per-rule flags into a per-record flag without aliasing concerns.
use crate::model::rule::{AuthorizationRule, SecretAction};

/// Forward rewrite: secrets rules granting `read` but not `readValue` get
/// `readValue` appended. Additive only; every other rule passes through
/// untouched.
pub fn upgrade_rule(rule: AuthorizationRule) -> (AuthorizationRule, bool) {
    if !rule.targets_secrets() {
        return (rule, false);
    }
    let read = SecretAction::Read.as_str();
    let read_value = SecretAction::ReadValue.as_str();
    if rule.grants(read) && !rule.grants(read_value) {
        let mut rule = rule;
        rule.action.push(read_value.to_string());
        (rule, true)
    } else {
        (rule, false)
    }
}

/// Reverse rewrite: secrets rules lose their first `readValue` entry.
///
/// Removal does not require a `read` grant to be present: any `readValue` on
/// a secrets rule is stripped, so this exactly undoes [`upgrade_rule`] but is
/// not a true inverse for rules that gained `readValue` by another path.
pub fn downgrade_rule(rule: AuthorizationRule) -> (AuthorizationRule, bool) {
    if !rule.targets_secrets() {
        return (rule, false);
    }
    let read_value = SecretAction::ReadValue.as_str();
    match rule.action.iter().position(|action| action == read_value) {
        Some(index) => {
            let mut rule = rule;
            rule.action.remove(index);
            (rule, true)
        }
        None => (rule, false),
    }
}

/// Apply the forward rewrite to a rule list, reporting whether any rule changed.
pub fn upgrade_rules(rules: Vec<AuthorizationRule>) -> (Vec<AuthorizationRule>, bool) {
    apply(rules, upgrade_rule)
}

/// Apply the reverse rewrite to a rule list, reporting whether any rule changed.
pub fn downgrade_rules(rules: Vec<AuthorizationRule>) -> (Vec<AuthorizationRule>, bool) {
    apply(rules, downgrade_rule)
}

fn apply(
    rules: Vec<AuthorizationRule>,
    rewrite: fn(AuthorizationRule) -> (AuthorizationRule, bool),
) -> (Vec<AuthorizationRule>, bool) {
    let mut changed = false;
    let rules = rules
        .into_iter()
        .map(|rule| {
            let (rule, rule_changed) = rewrite(rule);
            changed |= rule_changed;
            rule
        })
        .collect();
    (rules, changed)
}
