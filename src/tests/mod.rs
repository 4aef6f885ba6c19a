use crate::expr::Expression;
use crate::set::{Set, SetCache, SetElement, SetFlags, SetKeyType};
use crate::{ProtocolFamily, Rule};

mod expr;
mod json;

pub const TABLE_NAME: &str = "mocktable";
pub const CHAIN_NAME: &str = "mockchain";
pub const SET_NAME: &str = "mockset";

pub const SET_ID: u32 = 123456;

pub fn get_test_rule() -> Rule {
    Rule::new(ProtocolFamily::Ipv4, TABLE_NAME, CHAIN_NAME)
}

pub fn get_test_set(key_type: SetKeyType, flags: SetFlags, elements: Vec<SetElement>) -> Set {
    Set {
        family: ProtocolFamily::Ipv4,
        table: TABLE_NAME.to_string(),
        name: SET_NAME.to_string(),
        id: SET_ID,
        key_type,
        key_len: 0,
        flags,
        elements,
    }
}

/// Formats a rule made of the given expressions against an empty set cache.
pub fn format_exprs(exprs: Vec<Expression>) -> String {
    format_exprs_with_sets(exprs, &SetCache::new())
}

pub fn format_exprs_with_sets(exprs: Vec<Expression>, sets: &SetCache) -> String {
    get_test_rule()
        .with_expressions(exprs)
        .format(sets)
        .expect("rule formatting failed")
}

pub fn json_exprs(exprs: Vec<Expression>) -> Vec<serde_json::Value> {
    get_test_rule()
        .with_expressions(exprs)
        .to_json(&SetCache::new())
        .expect("rule JSON encoding failed")
}
