//! The outer presentation layer: decorated rule lines, `chain { ... }` and
//! `table { ... }` blocks, named-set listings and their `nft --json`
//! counterparts. Everything here is thin string assembly around the rule
//! formatter.

use serde::Serialize;
use serde_json::{json, Value};

use crate::chain::{priority_name, Chain};
use crate::error::FormatError;
use crate::rule::Rule;
use crate::set::{Set, SetCache};
use crate::ProtocolFamily;

/// Renders one rule as it appears inside a listing: the formatted body,
/// a ` comment "..."` when the rule carries one, and the ` # handle N`
/// marker. Empty rule bodies render empty and are skipped by the chain
/// renderer.
pub fn rule_line(rule: &Rule, sets: &SetCache) -> Result<String, FormatError> {
    let body = rule.format(sets)?;
    if body.is_empty() {
        return Ok(body);
    }
    let mut line = body;
    if let Some(comment) = rule.comment() {
        line.push_str(&format!(" comment \"{}\"", comment));
    }
    line.push_str(&format!(" # handle {}", rule.handle));
    Ok(line)
}

#[derive(Serialize)]
struct RuleJson<'a> {
    family: ProtocolFamily,
    table: &'a str,
    chain: &'a str,
    handle: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(rename = "expr")]
    exprs: Vec<Value>,
}

/// The `{"rule": {...}}` object of a JSON ruleset dump.
pub fn rule_json(rule: &Rule, sets: &SetCache) -> Result<Value, FormatError> {
    let body = RuleJson {
        family: rule.family,
        table: &rule.table,
        chain: &rule.chain,
        handle: rule.handle,
        comment: rule.comment(),
        exprs: rule.to_json(sets)?,
    };
    Ok(json!({ "rule": serde_json::to_value(body).expect("rule serialization is infallible") }))
}

/// Renders a chain block: header line with the handle, the base-chain
/// properties when present, one indented line per non-empty rule.
pub fn chain_block(chain: &Chain, rules: &[Rule], sets: &SetCache) -> Result<String, FormatError> {
    let mut out = format!("chain {} {{ # handle {}\n", chain.name, chain.handle);

    if chain.chain_type.is_some()
        || chain.hook.is_some()
        || chain.priority.is_some()
        || chain.policy.is_some()
    {
        out.push_str("\t\t");
        if let Some(typ) = chain.chain_type {
            out.push_str(&format!("type {} ", typ));
        }
        if let Some(hook) = chain.hook {
            out.push_str(&format!("hook {} ", hook));
        }
        if let Some(priority) = chain.priority {
            match priority_name(priority) {
                Some(name) => out.push_str(&format!("priority {}; ", name)),
                None => out.push_str(&format!("priority {}; ", priority)),
            }
        }
        if let Some(policy) = chain.policy {
            out.push_str(&format!("policy {};", policy));
        }
        out.push('\n');
    }

    for rule in rules {
        let line = rule_line(rule, sets)?;
        if line.is_empty() {
            trace!("skipping empty rule {} in chain {}", rule.handle, chain.name);
            continue;
        }
        out.push_str("\t\t");
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("\t}");
    Ok(out)
}

#[derive(Serialize)]
struct ChainJson<'a> {
    family: ProtocolFamily,
    table: &'a str,
    name: &'a str,
    handle: u64,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    chain_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hook: Option<String>,
    #[serde(rename = "prio", skip_serializing_if = "Option::is_none")]
    priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    policy: Option<String>,
}

/// The `{"chain": {...}}` object of a JSON ruleset dump.
pub fn chain_json(chain: &Chain) -> Value {
    let body = ChainJson {
        family: chain.family,
        table: &chain.table,
        name: &chain.name,
        handle: chain.handle,
        chain_type: chain.chain_type.map(|t| t.to_string()),
        hook: chain.hook.map(|h| h.to_string()),
        priority: chain.priority,
        policy: chain.policy.map(|p| p.to_string()),
    };
    json!({ "chain": serde_json::to_value(body).expect("chain serialization is infallible") })
}

/// Renders a named set's listing block. Anonymous sets have no standalone
/// listing; they only appear inline in rules.
pub fn set_block(set: &Set) -> Option<String> {
    if set.is_anonymous() {
        return None;
    }
    let mut out = format!("set {} {{\n\t\ttype {}\n", set.name, set.key_type.name());
    let flags = set.flag_names();
    if !flags.is_empty() {
        out.push_str(&format!("\t\tflags {}\n", flags.join(",")));
    }
    let elements = set.element_list();
    if !elements.is_empty() {
        out.push_str(&format!("\t\telements = {{ {} }}\n", elements.join(", ")));
    }
    out.push_str("\t}");
    Some(out)
}

#[derive(Serialize)]
struct SetJson<'a> {
    family: ProtocolFamily,
    name: &'a str,
    table: &'a str,
    #[serde(rename = "type")]
    key_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    flags: Vec<&'static str>,
    #[serde(rename = "elem", skip_serializing_if = "Vec::is_empty")]
    elements: Vec<String>,
}

/// The `{"set": {...}}` object of a JSON ruleset dump, for named sets.
pub fn set_json(set: &Set) -> Option<Value> {
    if set.is_anonymous() {
        return None;
    }
    let body = SetJson {
        family: set.family,
        name: &set.name,
        table: &set.table,
        key_type: set.key_type.name(),
        flags: set.flag_names(),
        elements: set.element_list(),
    };
    Some(json!({ "set": serde_json::to_value(body).expect("set serialization is infallible") }))
}

/// One table of a listing: sets first, then chains with their rules, the
/// way `nft list table` orders its output.
pub struct TableListing<'a> {
    pub table: &'a crate::Table,
    pub sets: Vec<&'a Set>,
    pub chains: Vec<(&'a Chain, Vec<Rule>)>,
}

impl<'a> TableListing<'a> {
    /// Renders the full `table <family> <name> { ... }` block.
    pub fn format(&self, cache: &SetCache) -> Result<String, FormatError> {
        let mut out = format!(
            "table {} {} {{\n",
            self.table.family.name(),
            self.table.name
        );
        for set in &self.sets {
            if let Some(block) = set_block(set) {
                out.push('\t');
                out.push_str(&block);
                out.push('\n');
            }
        }
        for (chain, rules) in &self.chains {
            out.push('\t');
            out.push_str(&chain_block(chain, rules, cache)?);
            out.push('\n');
        }
        out.push('}');
        Ok(out)
    }

    /// The `nftables` array of a JSON dump for this table.
    pub fn to_json(&self, cache: &SetCache) -> Result<Value, FormatError> {
        let mut items = vec![json!({
            "table": {
                "family": self.table.family.name(),
                "name": self.table.name,
                "handle": self.table.handle,
            }
        })];
        for set in &self.sets {
            if let Some(obj) = set_json(set) {
                items.push(obj);
            }
        }
        for (chain, rules) in &self.chains {
            items.push(chain_json(chain));
            for rule in rules {
                items.push(rule_json(rule, cache)?);
            }
        }
        Ok(json!({ "nftables": items }))
    }
}
