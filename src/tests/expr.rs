use std::time::Duration;

use crate::error::FormatError;
use crate::expr::{
    Bitwise, Cmp, CmpOp, Connlimit, Counter, Ct, CtKey, Dup, Dynset, DynsetOp, Expression, Exthdr,
    ExthdrOp, Fib, FibFlags, FibResult, Immediate, Limit, LimitTime, LimitType, Log, LogLevel,
    Lookup, Masquerade, Meta, MetaKey, Nat, NatKind, Numgen, NumgenMode, Objref, ObjType, Payload,
    Queue, QueueFlags, Quota, Range, RawExpression, Redirect, Reject, RejectKind, Verdict,
    VerdictKind, EXTHDR_F_PRESENT, REG_VERDICT,
};
use crate::proto::PayloadBase;
use crate::set::{SetCache, SetElement, SetFlags, SetKeyType};
use crate::ProtocolFamily;

use super::{format_exprs, format_exprs_with_sets, get_test_rule, get_test_set, SET_ID, SET_NAME};

#[test]
fn meta_l4proto_counter_log_accept() {
    let exprs = vec![
        Expression::Meta(Meta::read(MetaKey::L4Proto, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [libc::IPPROTO_TCP as u8])),
        Expression::Counter(Counter::default()),
        Expression::Log(Log::default()),
        Expression::Verdict(Verdict::new(VerdictKind::Accept)),
    ];
    assert_eq!(
        format_exprs(exprs),
        "meta l4proto tcp counter packets 0 bytes 0 log accept"
    );
}

#[test]
fn masked_ip_version_mismatch() {
    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::Network, 0, 1, 1)),
        Expression::Bitwise(Bitwise::new([0xf0], [0x00])),
        Expression::Cmp(Cmp::new(1, CmpOp::Neq, [0x50])),
    ];
    assert_eq!(format_exprs(exprs), "ip version != 5");
}

#[test]
fn masked_ip_version_match() {
    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::Network, 0, 1, 1)),
        Expression::Bitwise(Bitwise::new([0xf0], [0x00])),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [0x40])),
        Expression::Verdict(Verdict::new(VerdictKind::Accept)),
    ];
    assert_eq!(format_exprs(exprs), "ip version 4 accept");
}

#[test]
fn ct_state_against_explicit_bits() {
    let exprs = vec![
        Expression::Ct(Ct::read(CtKey::State, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Neq, [0x03, 0x00, 0x00, 0x00])),
    ];
    assert_eq!(format_exprs(exprs), "ct state != invalid,established");
}

#[test]
fn ct_state_through_a_mask() {
    // the usual compiler output for `ct state established,related`
    let exprs = vec![
        Expression::Ct(Ct::read(CtKey::State, 1)),
        Expression::Bitwise(Bitwise {
            sreg: 1,
            dreg: 1,
            len: 4,
            mask: vec![0x06, 0x00, 0x00, 0x00],
            xor: vec![0x00; 4],
        }),
        Expression::Cmp(Cmp::new(1, CmpOp::Neq, [0x00, 0x00, 0x00, 0x00])),
    ];
    assert_eq!(format_exprs(exprs), "ct state established,related");
}

#[test]
fn daddr_in_named_set() {
    let sets = SetCache::new();
    let mut set = get_test_set(
        SetKeyType::IpAddr,
        SetFlags::empty(),
        vec![
            SetElement::new([10, 34, 11, 179].to_vec()),
            SetElement::interval_end([10, 34, 11, 180].to_vec()),
        ],
    );
    set.name = "ipSet".to_string();
    set.id = 1;
    sets.insert(set);

    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::Network, 16, 4, 1)),
        Expression::Lookup(Lookup::new(1, "ipSet", 1)),
    ];
    assert_eq!(format_exprs_with_sets(exprs, &sets), "ip daddr @ipSet");
}

#[test]
fn anonymous_set_after_protocol_pin() {
    let sets = SetCache::new();
    let mut set = get_test_set(
        SetKeyType::InetService,
        SetFlags::ANONYMOUS | SetFlags::CONSTANT,
        vec![
            SetElement::new([0x01, 0xbb].to_vec()),
            SetElement::new([0x00, 0x50].to_vec()),
        ],
    );
    set.name = "__set0".to_string();
    set.id = 0;
    sets.insert(set);

    let exprs = vec![
        Expression::Meta(Meta::read(MetaKey::L4Proto, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [libc::IPPROTO_TCP as u8])),
        Expression::Payload(Payload::load(PayloadBase::Transport, 2, 2, 1)),
        Expression::Lookup(Lookup::new(1, "__set0", 0)),
    ];
    assert_eq!(
        format_exprs_with_sets(exprs, &sets),
        "meta l4proto tcp dport {80,443}"
    );
}

#[test]
fn nftrace_mangle_then_prefixed_daddr() {
    let exprs = vec![
        Expression::Immediate(Immediate::new(1, [0x01])),
        Expression::Meta(Meta {
            key: MetaKey::NfTrace,
            dreg: 0,
            sreg: 1,
        }),
        Expression::Payload(Payload::load(PayloadBase::Network, 16, 1, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [0x0a])),
        Expression::Meta(Meta::read(MetaKey::L4Proto, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [libc::IPPROTO_UDP as u8])),
    ];
    assert_eq!(
        format_exprs(exprs),
        "meta nftrace set 1 ip daddr 10.0.0.0/8 meta l4proto udp"
    );
}

#[test]
fn dnat_to_address_and_port() {
    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::Transport, 2, 2, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [0x1f, 0x90])),
        Expression::Immediate(Immediate::new(2, [192, 168, 0, 1])),
        Expression::Immediate(Immediate::new(3, [0x1f, 0x90])),
        Expression::Nat(Nat {
            reg_addr_min: 2,
            reg_proto_min: 3,
            ..Nat::new(NatKind::Dnat, ProtocolFamily::Ipv4)
        }),
    ];
    assert_eq!(
        format_exprs(exprs),
        "tcp dport 8080 dnat ip to 192.168.0.1:8080"
    );
}

#[test]
fn snat_to_address_range() {
    let exprs = vec![
        Expression::Immediate(Immediate::new(1, [10, 0, 0, 1])),
        Expression::Immediate(Immediate::new(2, [10, 0, 0, 10])),
        Expression::Immediate(Immediate::new(3, [0x03, 0xe8])),
        Expression::Immediate(Immediate::new(4, [0x07, 0xd0])),
        Expression::Nat(Nat {
            reg_addr_min: 1,
            reg_addr_max: 2,
            reg_proto_min: 3,
            reg_proto_max: 4,
            ..Nat::new(NatKind::Snat, ProtocolFamily::Ipv4)
        }),
    ];
    assert_eq!(
        format_exprs(exprs),
        "snat ip to 10.0.0.1-10.0.0.10:1000-2000"
    );
}

#[test]
fn masquerade_with_port_and_flag() {
    let exprs = vec![
        Expression::Immediate(Immediate::new(1, [0x03, 0xe8])),
        Expression::Masquerade(Masquerade {
            reg_proto_min: 1,
            random: true,
            ..Masquerade::default()
        }),
    ];
    assert_eq!(format_exprs(exprs), "masquerade to :1000 random");
}

#[test]
fn redirect_to_port() {
    let exprs = vec![
        Expression::Immediate(Immediate::new(1, [0x01, 0xbb])),
        Expression::Redirect(Redirect {
            reg_proto_min: 1,
            ..Redirect::default()
        }),
    ];
    assert_eq!(format_exprs(exprs), "redirect to :443");
}

#[test]
fn saddr_match_with_verdict() {
    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::Network, 12, 4, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [192, 168, 1, 1])),
        Expression::Verdict(Verdict::new(VerdictKind::Accept)),
    ];
    assert_eq!(format_exprs(exprs), "ip saddr 192.168.1.1 accept");
}

#[test]
fn unqualified_transport_port_keeps_the_tcp_prefix() {
    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::Transport, 2, 2, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [0x00, 0x50])),
        Expression::Verdict(Verdict::new(VerdictKind::Accept)),
    ];
    assert_eq!(format_exprs(exprs), "tcp dport 80 accept");
}

#[test]
fn unknown_payload_offset_renders_raw() {
    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::LinkLayer, 6, 6, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [0, 0, 0, 0, 0, 1])),
    ];
    assert_eq!(format_exprs(exprs), "@ll,6,6 1");
}

#[test]
fn verdict_jumps_carry_the_chain() {
    assert_eq!(
        format_exprs(vec![Expression::Verdict(Verdict::jump("FW-OUT"))]),
        "jump FW-OUT"
    );
    assert_eq!(
        format_exprs(vec![Expression::Verdict(Verdict::goto("FW-OUT"))]),
        "goto FW-OUT"
    );
    assert_eq!(
        format_exprs(vec![Expression::Verdict(Verdict::new(VerdictKind::Drop))]),
        "drop"
    );
}

#[test]
fn verdict_map_lookup() {
    let sets = SetCache::new();
    let mut set = get_test_set(SetKeyType::IpAddr, SetFlags::MAP, Vec::new());
    set.name = "lb".to_string();
    set.id = 7;
    sets.insert(set);

    let exprs = vec![
        Expression::Numgen(Numgen {
            mode: NumgenMode::Incremental,
            dreg: 1,
            modulus: 2,
            offset: 0,
        }),
        Expression::Lookup(Lookup {
            sreg: 1,
            dreg: Some(REG_VERDICT),
            set_name: "lb".to_string(),
            set_id: 7,
            invert: false,
        }),
    ];
    assert_eq!(
        format_exprs_with_sets(exprs, &sets),
        "numgen inc mod 2 vmap @lb"
    );
}

#[test]
fn ct_mark_set_from_immediate() {
    let exprs = vec![
        Expression::Immediate(Immediate::new(1, [0x01, 0x00, 0x00, 0x00])),
        Expression::Ct(Ct {
            key: CtKey::Mark,
            dreg: 0,
            sreg: 1,
        }),
    ];
    assert_eq!(format_exprs(exprs), "ct mark set 1");
}

#[test]
fn port_range_with_implicit_equality() {
    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::Transport, 0, 2, 1)),
        Expression::Range(Range {
            sreg: 1,
            op: CmpOp::Eq,
            from: vec![0x04, 0x00],
            to: vec![0x08, 0x00],
        }),
    ];
    assert_eq!(format_exprs(exprs), "tcp sport 1024-2048");
}

#[test]
fn reject_variants() {
    assert_eq!(
        format_exprs(vec![Expression::Reject(Reject {
            kind: RejectKind::IcmpxUnreach,
            code: 1,
        })]),
        "reject"
    );
    assert_eq!(
        format_exprs(vec![Expression::Reject(Reject {
            kind: RejectKind::TcpRst,
            code: 0,
        })]),
        "reject with tcp reset 0"
    );
}

#[test]
fn limit_in_packet_mode() {
    let limit = Limit {
        kind: LimitType::Packets,
        rate: 10,
        unit: LimitTime::Second,
        burst: 5,
        over: false,
    };
    assert_eq!(
        format_exprs(vec![Expression::Limit(limit)]),
        "limit rate 10/second burst 5 packets"
    );
    let over = Limit { over: true, ..limit };
    assert_eq!(
        format_exprs(vec![Expression::Limit(over)]),
        "limit rate over 10/second burst 5 packets"
    );
}

#[test]
fn limit_in_byte_mode_scales_units() {
    let limit = Limit {
        kind: LimitType::PacketBytes,
        rate: 2048,
        unit: LimitTime::Second,
        burst: 1024,
        over: false,
    };
    assert_eq!(
        format_exprs(vec![Expression::Limit(limit)]),
        "limit rate 2/kbytes/second burst 1 kbytes"
    );
}

#[test]
fn quota_scales_to_mbytes() {
    let quota = Quota {
        bytes: 2 * 1024 * 1024,
        consumed: 0,
        over: true,
    };
    assert_eq!(format_exprs(vec![Expression::Quota(quota)]), "quota over 2 mbytes");
}

#[test]
fn connection_count_limit() {
    let exprs = vec![Expression::Connlimit(Connlimit {
        count: 20,
        flags: 1,
    })];
    assert_eq!(format_exprs(exprs), "ct count over 20");
}

#[test]
fn queue_with_flags_and_range() {
    let queue = Queue {
        num: 1,
        total: 3,
        flags: QueueFlags::BYPASS,
    };
    assert_eq!(
        format_exprs(vec![Expression::Queue(queue)]),
        "queue flags bypass to 1-3"
    );
}

#[test]
fn log_with_attributes() {
    let log = Log {
        prefix: Some("SSH ".to_string()),
        group: Some(2),
        level: Some(LogLevel::Warning),
        ..Log::default()
    };
    assert_eq!(
        format_exprs(vec![Expression::Log(log)]),
        "log prefix \"SSH \" group 2 level warn"
    );
}

#[test]
fn exthdr_reset_of_a_tcp_option() {
    let exthdr = Exthdr {
        op: ExthdrOp::TcpOpt,
        typ: 4,
        offset: 0,
        len: 0,
        flags: EXTHDR_F_PRESENT,
        dreg: 0,
        sreg: 0,
    };
    assert_eq!(format_exprs(vec![Expression::Exthdr(exthdr)]), "reset tcp option 4");
}

#[test]
fn objref_statements() {
    assert_eq!(
        format_exprs(vec![Expression::Objref(Objref {
            kind: ObjType::CtHelper,
            name: "ftp-standard".to_string(),
        })]),
        "ct helper set ftp-standard"
    );
    assert_eq!(
        format_exprs(vec![Expression::Objref(Objref {
            kind: ObjType::Counter,
            name: "mycounter".to_string(),
        })]),
        "counter name mycounter"
    );
}

#[test]
fn fib_query_feeds_a_comparison() {
    let exprs = vec![
        Expression::Fib(Fib {
            dreg: 1,
            result: FibResult::Oif,
            flags: FibFlags::SADDR | FibFlags::IIF,
        }),
        Expression::Cmp(Cmp::new(1, CmpOp::Neq, [0x01])),
    ];
    assert_eq!(format_exprs(exprs), "fib saddr, iif oif != 1");
}

#[test]
fn dup_to_address_and_device() {
    let exprs = vec![
        Expression::Immediate(Immediate::new(1, [10, 0, 0, 1])),
        Expression::Immediate(Immediate::new(2, *b"eth0")),
        Expression::Dup(Dup {
            reg_addr: 1,
            reg_dev: 2,
        }),
    ];
    assert_eq!(format_exprs(exprs), "dup to 10.0.0.1 device eth0");
}

#[test]
fn byteorder_is_transparent_in_listings() {
    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::Transport, 0, 2, 1)),
        Expression::Byteorder(crate::expr::Byteorder {
            sreg: 1,
            dreg: 2,
            op: crate::expr::ByteorderOp::Ntoh,
            len: 2,
            size: 2,
        }),
        Expression::Cmp(Cmp::new(2, CmpOp::Eq, [0x00, 0x50])),
    ];
    assert_eq!(format_exprs(exprs), "tcp sport 80");
}

#[test]
fn dynset_update_with_timeout() {
    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::Network, 12, 4, 1)),
        Expression::Dynset(Dynset {
            op: DynsetOp::Update,
            set_name: "seen".to_string(),
            set_id: 0,
            sreg_key: 1,
            sreg_data: 0,
            timeout: Some(Duration::from_secs(300)),
            exprs: Vec::new(),
        }),
    ];
    assert_eq!(
        format_exprs(exprs),
        "update @seen { ip saddr timeout 5m0s }"
    );
}

#[test]
fn dynset_attaches_inner_statements() {
    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::Network, 12, 4, 1)),
        Expression::Dynset(Dynset {
            op: DynsetOp::Add,
            set_name: "seen".to_string(),
            set_id: 0,
            sreg_key: 1,
            sreg_data: 0,
            timeout: None,
            exprs: vec![Expression::Counter(Counter::default())],
        }),
    ];
    assert_eq!(
        format_exprs(exprs),
        "add @seen { ip saddr counter packets 0 bytes 0 }"
    );
}

#[test]
fn comparing_an_unwritten_register_fails() {
    let err = get_test_rule()
        .with_expressions(vec![Expression::Cmp(Cmp::new(1, CmpOp::Eq, [0x01]))])
        .format(&SetCache::new())
        .unwrap_err();
    match err {
        FormatError::Expression { kind, source } => {
            assert_eq!(kind, "cmp");
            assert!(matches!(*source, FormatError::EmptyRegister(1)));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn unknown_expressions_name_themselves() {
    let err = get_test_rule()
        .with_expressions(vec![Expression::Raw(RawExpression {
            name: "osf".to_string(),
            data: Vec::new(),
        })])
        .format(&SetCache::new())
        .unwrap_err();
    assert!(err.to_string().contains("unknown"));
    match err {
        FormatError::Expression { source, .. } => {
            assert!(matches!(*source, FormatError::UnknownExpression(ref n) if n == "osf"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn missing_set_fails_after_the_refresh_retry() {
    let exprs = vec![
        Expression::Payload(Payload::load(PayloadBase::Network, 16, 4, 1)),
        Expression::Lookup(Lookup::new(1, SET_NAME, SET_ID)),
    ];
    let err = get_test_rule()
        .with_expressions(exprs)
        .format(&SetCache::new())
        .unwrap_err();
    match err {
        FormatError::Expression { kind, source } => {
            assert_eq!(kind, "lookup");
            assert!(matches!(*source, FormatError::SetNotFound { .. }));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn meta_writes_to_the_verdict_register_are_rejected() {
    let err = get_test_rule()
        .with_expressions(vec![Expression::Meta(Meta::read(MetaKey::Mark, REG_VERDICT))])
        .format(&SetCache::new())
        .unwrap_err();
    match err {
        FormatError::Expression { kind, source } => {
            assert_eq!(kind, "meta");
            assert!(matches!(*source, FormatError::InvalidDestRegister(0)));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn formatting_is_deterministic() {
    let rule = get_test_rule().with_expressions(vec![
        Expression::Meta(Meta::read(MetaKey::L4Proto, 1)),
        Expression::Cmp(Cmp::new(1, CmpOp::Eq, [libc::IPPROTO_TCP as u8])),
        Expression::Verdict(Verdict::new(VerdictKind::Accept)),
    ]);
    let sets = SetCache::new();
    let first = rule.format(&sets).unwrap();
    let second = rule.format(&sets).unwrap();
    assert_eq!(first, second);
}
