use serde_json::json;

use nftfmt::expr::{
    Cmp, CmpOp, Counter, Expression, Lookup, Meta, MetaKey, Payload, Verdict, VerdictKind,
};
use nftfmt::proto::PayloadBase;
use nftfmt::ruleset;
use nftfmt::set::{Set, SetCache, SetElement, SetFlags, SetKeyType, SetSource};
use nftfmt::{Chain, ChainPolicy, ChainType, Hook, ProtocolFamily, Rule, Table};

const TABLE_NAME: &str = "filter";
const CHAIN_NAME: &str = "input";

fn accept_all_rule(handle: u64) -> Rule {
    let mut rule = Rule::new(ProtocolFamily::Ipv4, TABLE_NAME, CHAIN_NAME).with_expressions(vec![
        Expression::Meta(Meta::read(MetaKey::L4Proto, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [6u8])),
        Expression::Counter(Counter::default()),
        Expression::Verdict(Verdict::new(VerdictKind::Accept)),
    ]);
    rule.handle = handle;
    rule
}

/// Userdata blob carrying a comment TLV, as the kernel stores it.
fn comment_userdata(comment: &str) -> Vec<u8> {
    let mut blob = vec![0u8, comment.len() as u8 + 1];
    blob.extend_from_slice(comment.as_bytes());
    blob.push(0);
    blob
}

#[test]
fn rule_lines_carry_comment_and_handle() {
    let sets = SetCache::new();
    let mut rule = accept_all_rule(42);
    rule.userdata = Some(comment_userdata("allow tcp"));

    let line = ruleset::rule_line(&rule, &sets).unwrap();
    assert_eq!(
        line,
        "meta l4proto tcp counter packets 0 bytes 0 accept comment \"allow tcp\" # handle 42"
    );
}

#[test]
fn empty_rules_render_empty_lines() {
    let sets = SetCache::new();
    let rule = Rule::new(ProtocolFamily::Ipv4, TABLE_NAME, CHAIN_NAME);
    assert_eq!(ruleset::rule_line(&rule, &sets).unwrap(), "");
}

#[test]
fn chain_blocks_list_base_chain_properties() {
    let sets = SetCache::new();
    let mut chain = Chain::new(ProtocolFamily::Ipv4, TABLE_NAME, CHAIN_NAME);
    chain.handle = 1;
    chain.chain_type = Some(ChainType::Filter);
    chain.hook = Some(Hook::In);
    chain.priority = Some(0);
    chain.policy = Some(ChainPolicy::Drop);

    let block = ruleset::chain_block(&chain, &[accept_all_rule(7)], &sets).unwrap();
    assert_eq!(
        block,
        "chain input { # handle 1\n\
         \t\ttype filter hook input priority filter; policy drop;\n\
         \t\tmeta l4proto tcp counter packets 0 bytes 0 accept # handle 7\n\
         \t}"
    );
}

#[test]
fn table_listing_wraps_sets_and_chains() {
    let sets = SetCache::new();
    let table = Table::new(ProtocolFamily::Inet, TABLE_NAME);

    let named = Set {
        family: ProtocolFamily::Inet,
        table: TABLE_NAME.to_string(),
        name: "blocked".to_string(),
        id: 1,
        key_type: SetKeyType::IpAddr,
        key_len: 4,
        flags: SetFlags::CONSTANT,
        elements: vec![SetElement::new([10, 0, 0, 1].to_vec())],
    };

    let mut chain = Chain::new(ProtocolFamily::Inet, TABLE_NAME, CHAIN_NAME);
    chain.handle = 3;

    let listing = ruleset::TableListing {
        table: &table,
        sets: vec![&named],
        chains: vec![(&chain, vec![accept_all_rule(9)])],
    };

    let text = listing.format(&sets).unwrap();
    assert!(text.starts_with("table inet filter {\n"));
    assert!(text.contains("\tset blocked {\n"));
    assert!(text.contains("\telements = { 10.0.0.1 }\n"));
    assert!(text.contains("\tchain input { # handle 3\n"));
    assert!(text.ends_with("}"));
}

#[test]
fn rule_json_wraps_family_and_statements() {
    let sets = SetCache::new();
    let mut rule = accept_all_rule(42);
    rule.userdata = Some(comment_userdata("allow tcp"));

    let value = ruleset::rule_json(&rule, &sets).unwrap();
    assert_eq!(
        value,
        json!({
            "rule": {
                "family": "ip",
                "table": "filter",
                "chain": "input",
                "handle": 42,
                "comment": "allow tcp",
                "expr": [
                    {"match": {"op": "==", "left": {"meta": {"key": "l4proto"}}, "right": "tcp"}},
                    {"counter": {"bytes": 0, "packets": 0}},
                    {"accept": null},
                ],
            }
        })
    );
}

#[test]
fn chain_json_omits_absent_base_chain_fields() {
    let chain = Chain::new(ProtocolFamily::Ipv4, TABLE_NAME, "fwd");
    let value = ruleset::chain_json(&chain);
    assert_eq!(
        value,
        json!({
            "chain": {
                "family": "ip",
                "table": "filter",
                "name": "fwd",
                "handle": 0,
            }
        })
    );
}

struct OneTableSource {
    set: Set,
}

impl SetSource for OneTableSource {
    fn sets_for_table(
        &self,
        table: &str,
        _family: ProtocolFamily,
    ) -> Result<Vec<Set>, Box<dyn std::error::Error + Send + Sync>> {
        if table == self.set.table {
            Ok(vec![self.set.clone()])
        } else {
            Ok(Vec::new())
        }
    }
}

#[test]
fn set_cache_refreshes_once_on_a_miss() {
    let backing = Set {
        family: ProtocolFamily::Ipv4,
        table: TABLE_NAME.to_string(),
        name: "ipSet".to_string(),
        id: 5,
        key_type: SetKeyType::IpAddr,
        key_len: 4,
        flags: SetFlags::empty(),
        elements: Vec::new(),
    };
    let cache = SetCache::with_source(Box::new(OneTableSource { set: backing }));

    let rule = Rule::new(ProtocolFamily::Ipv4, TABLE_NAME, CHAIN_NAME).with_expressions(vec![
        Expression::Payload(Payload::load(PayloadBase::Network, 16, 4, 1)),
        Expression::Lookup(Lookup::new(1, "ipSet", 5)),
    ]);

    // the cache starts cold; the lookup triggers the single refresh
    assert_eq!(rule.format(&cache).unwrap(), "ip daddr @ipSet");
}

#[test]
fn set_cache_miss_after_refresh_is_an_error() {
    let backing = Set {
        family: ProtocolFamily::Ipv4,
        table: "othertable".to_string(),
        name: "ipSet".to_string(),
        id: 5,
        key_type: SetKeyType::IpAddr,
        key_len: 4,
        flags: SetFlags::empty(),
        elements: Vec::new(),
    };
    let cache = SetCache::with_source(Box::new(OneTableSource { set: backing }));

    let rule = Rule::new(ProtocolFamily::Ipv4, TABLE_NAME, CHAIN_NAME).with_expressions(vec![
        Expression::Payload(Payload::load(PayloadBase::Network, 16, 4, 1)),
        Expression::Lookup(Lookup::new(1, "ipSet", 5)),
    ]);

    assert!(rule.format(&cache).is_err());
}
