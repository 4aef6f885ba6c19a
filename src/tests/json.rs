use serde_json::json;

use crate::expr::{
    Bitwise, Cmp, CmpOp, Counter, Expression, Immediate, Limit, LimitTime, LimitType, Log, Lookup,
    Meta, MetaKey, Nat, NatKind, Payload, Reject, RejectKind, Verdict, VerdictKind,
};
use crate::proto::PayloadBase;
use crate::ProtocolFamily;

use super::json_exprs;

#[test]
fn match_counter_log_accept_statements() {
    let stmts = json_exprs(vec![
        Expression::Meta(Meta::read(MetaKey::L4Proto, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [libc::IPPROTO_TCP as u8])),
        Expression::Counter(Counter::default()),
        Expression::Log(Log::default()),
        Expression::Verdict(Verdict::new(VerdictKind::Accept)),
    ]);
    assert_eq!(
        stmts,
        vec![
            json!({"match": {"op": "==", "left": {"meta": {"key": "l4proto"}}, "right": "tcp"}}),
            json!({"counter": {"bytes": 0, "packets": 0}}),
            json!({"log": null}),
            json!({"accept": null}),
        ]
    );
}

#[test]
fn goto_names_its_target() {
    let stmts = json_exprs(vec![Expression::Verdict(Verdict::goto("FW-OUT"))]);
    assert_eq!(stmts, vec![json!({"goto": {"target": "FW-OUT"}})]);
}

#[test]
fn payload_match_keeps_the_raw_selector() {
    let stmts = json_exprs(vec![
        Expression::Payload(Payload::load(PayloadBase::Network, 12, 4, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [192, 168, 1, 1])),
    ]);
    assert_eq!(
        stmts,
        vec![json!({
            "match": {
                "op": "==",
                "left": {"payload": {"base": "nh", "offset": 12, "len": 4}},
                "right": 3232235777u64,
            }
        })]
    );
}

#[test]
fn mangle_wraps_key_and_value() {
    let stmts = json_exprs(vec![
        Expression::Immediate(Immediate::new(1, [0x01])),
        Expression::Meta(Meta {
            key: MetaKey::NfTrace,
            dreg: 0,
            sreg: 1,
        }),
    ]);
    assert_eq!(
        stmts,
        vec![json!({
            "mangle": {"key": {"meta": {"key": "nftrace"}}, "value": 1}
        })]
    );
}

#[test]
fn bitwise_builds_an_expression_tree() {
    let stmts = json_exprs(vec![
        Expression::Payload(Payload::load(PayloadBase::Transport, 2, 2, 1)),
        Expression::Bitwise(Bitwise {
            sreg: 1,
            dreg: 1,
            len: 2,
            mask: vec![0x00, 0xff],
            xor: vec![0x00, 0x00],
        }),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [0x00, 0x16])),
    ]);
    assert_eq!(
        stmts,
        vec![json!({
            "match": {
                "op": "==",
                "left": {
                    "op": "&",
                    "left": {"payload": {"base": "th", "offset": 2, "len": 2}},
                    "right": 255,
                },
                "right": 22,
            }
        })]
    );
}

#[test]
fn lookup_matches_against_the_set_reference() {
    let stmts = json_exprs(vec![
        Expression::Payload(Payload::load(PayloadBase::Network, 16, 4, 1)),
        Expression::Lookup(Lookup {
            sreg: 1,
            dreg: None,
            set_name: "ipSet".to_string(),
            set_id: 1,
            invert: true,
        }),
    ]);
    assert_eq!(
        stmts,
        vec![json!({
            "match": {
                "op": "!=",
                "left": {"payload": {"base": "nh", "offset": 16, "len": 4}},
                "right": "@ipSet",
            }
        })]
    );
}

#[test]
fn nat_carries_family_addr_and_port() {
    let stmts = json_exprs(vec![
        Expression::Immediate(Immediate::new(2, [192, 168, 0, 1])),
        Expression::Immediate(Immediate::new(3, [0x1f, 0x90])),
        Expression::Nat(Nat {
            reg_addr_min: 2,
            reg_proto_min: 3,
            ..Nat::new(NatKind::Dnat, ProtocolFamily::Ipv4)
        }),
    ]);
    assert_eq!(
        stmts,
        vec![json!({
            "dnat": {"family": "ip", "addr": 3232235521u64, "port": 8080}
        })]
    );
}

#[test]
fn reject_without_reason_is_null() {
    let stmts = json_exprs(vec![Expression::Reject(Reject {
        kind: RejectKind::IcmpUnreach,
        code: 0,
    })]);
    assert_eq!(stmts, vec![json!({"reject": null})]);
}

#[test]
fn limit_reports_rate_and_period() {
    let stmts = json_exprs(vec![Expression::Limit(Limit {
        kind: LimitType::Packets,
        rate: 400,
        unit: LimitTime::Minute,
        burst: 5,
        over: true,
    })]);
    assert_eq!(
        stmts,
        vec![json!({
            "limit": {"rate": 400, "burst": 5, "per": "minute", "inv": true}
        })]
    );
}

#[test]
fn text_and_json_agree_on_operators() {
    for (op, symbol) in [
        (CmpOp::Eq, "=="),
        (CmpOp::Neq, "!="),
        (CmpOp::Lt, "<"),
        (CmpOp::Lte, "<="),
        (CmpOp::Gt, ">"),
        (CmpOp::Gte, ">="),
    ] {
        assert_eq!(op.symbol(), symbol);
        let stmts = json_exprs(vec![
            Expression::Payload(Payload::load(PayloadBase::Transport, 2, 2, 1)),
            Expression::Cmp(Cmp::new(1, op, [0x00, 0x50])),
        ]);
        assert_eq!(stmts[0]["match"]["op"], json!(symbol));
    }
}
