use std::fmt;

use serde_json::{json, Value};

use crate::bytes::RawBytes;
use crate::error::FormatError;
use crate::expr::{Cmp, EncodeCtx, RegOrigin, RegValue};
use crate::ir::Ir;
use crate::proto;

/// A meta expression refers to metadata associated with a packet rather
/// than its payload: interface names and indexes, the transport protocol,
/// socket credentials, the tracing flag and so on.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
#[non_exhaustive]
pub enum MetaKey {
    /// Packet length.
    Len = 0,
    /// Packet ethertype protocol (skb->protocol), invalid in OUTPUT.
    Protocol = 1,
    Priority = 2,
    /// Packet mark.
    Mark = 3,
    /// Packet input interface index (dev->ifindex).
    Iif = 4,
    /// Packet output interface index (dev->ifindex).
    Oif = 5,
    /// Packet input interface name (dev->name).
    IifName = 6,
    /// Packet output interface name (dev->name).
    OifName = 7,
    /// Packet input interface type (dev->type).
    IifType = 8,
    /// Packet output interface type (dev->type).
    OifType = 9,
    /// Originating socket UID (fsuid).
    SkUid = 10,
    /// Originating socket GID (fsgid).
    SkGid = 11,
    /// Netfilter ruleset tracing flag.
    NfTrace = 12,
    RtClassId = 13,
    SecMark = 14,
    /// Netfilter protocol family.
    NfProto = 15,
    /// Layer 4 protocol number.
    L4Proto = 16,
    BriIifName = 17,
    BriOifName = 18,
    PktType = 19,
    Cpu = 20,
    IifGroup = 21,
    OifGroup = 22,
    /// Socket control group (skb->sk->sk_classid).
    Cgroup = 23,
    /// A 32bit pseudo-random number.
    PRandom = 24,
}

impl MetaKey {
    /// Keys whose nft keyword stands on its own, without the `meta` prefix.
    pub fn is_unqualified(self) -> bool {
        matches!(
            self,
            MetaKey::Iif
                | MetaKey::Oif
                | MetaKey::IifName
                | MetaKey::OifName
                | MetaKey::IifGroup
                | MetaKey::OifGroup
        )
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetaKey::Len => "length",
            MetaKey::Protocol => "protocol",
            MetaKey::Priority => "priority",
            MetaKey::Mark => "mark",
            MetaKey::Iif => "iif",
            MetaKey::Oif => "oif",
            MetaKey::IifName => "iifname",
            MetaKey::OifName => "oifname",
            MetaKey::IifType => "iiftype",
            MetaKey::OifType => "oiftype",
            MetaKey::SkUid => "skuid",
            MetaKey::SkGid => "skgid",
            MetaKey::NfTrace => "nftrace",
            MetaKey::RtClassId => "rtclassid",
            MetaKey::SecMark => "secmark",
            MetaKey::NfProto => "nfproto",
            MetaKey::L4Proto => "l4proto",
            MetaKey::BriIifName => "ibrname",
            MetaKey::BriOifName => "obrname",
            MetaKey::PktType => "pkttype",
            MetaKey::Cpu => "cpu",
            MetaKey::IifGroup => "iifgroup",
            MetaKey::OifGroup => "oifgroup",
            MetaKey::Cgroup => "cgroup",
            MetaKey::PRandom => "random",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub key: MetaKey,
    /// Destination register of a read. Zero when this is a write.
    pub dreg: u32,
    /// Source register of a write (`meta mark set ...`). Zero for reads.
    pub sreg: u32,
}

impl Meta {
    pub fn read(key: MetaKey, dreg: u32) -> Self {
        Meta { key, dreg, sreg: 0 }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let keyword = if self.key.is_unqualified() {
            self.key.to_string()
        } else {
            format!("meta {}", self.key)
        };

        if self.sreg == 0 {
            if self.dreg == 0 {
                return Err(FormatError::InvalidDestRegister(self.dreg));
            }
            ctx.regs
                .store(self.dreg, RegValue::text(keyword, RegOrigin::Meta(self.key)))?;
            return Ok(None);
        }

        let src = ctx.regs.load(self.sreg)?;
        let value = match &src.origin {
            // a literal assignment renders the immediate through the
            // key-specific decoder, not as an opaque blob
            RegOrigin::Immediate(data) => self.data_to_string(data),
            _ => src.human.clone(),
        };
        Ok(Some(Ir::MetaSet {
            key: self.key,
            value,
        }))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let meta = json!({ "meta": { "key": self.key.to_string() } });

        if self.sreg == 0 {
            if self.dreg == 0 {
                return Err(FormatError::InvalidDestRegister(self.dreg));
            }
            ctx.regs
                .store(self.dreg, RegValue::json(meta, RegOrigin::Meta(self.key)))?;
            return Ok(None);
        }

        let src = ctx.regs.load(self.sreg)?;
        Ok(Some(json!({
            "mangle": { "key": meta, "value": src.json.clone() }
        })))
    }

    /// Decodes immediate bytes through the lens of this meta key.
    pub(crate) fn data_to_string(&self, data: &[u8]) -> String {
        match self.key {
            MetaKey::IifName | MetaKey::OifName | MetaKey::BriIifName | MetaKey::BriOifName => {
                RawBytes(data).string()
            }
            MetaKey::Protocol | MetaKey::L4Proto => {
                proto::proto_name(RawBytes(data).to_u128() as u8).to_string()
            }
            MetaKey::NfProto => proto::nfproto_name(RawBytes(data).to_u128() as u8).to_string(),
            _ => RawBytes(data).decimal(),
        }
    }

    /// The right-hand side of a comparison against this meta key. A match
    /// that pins down the protocol also switches the header context, so
    /// later payload reads resolve against the right field table.
    pub(crate) fn cmp_rhs(&self, ctx: &mut EncodeCtx, cmp: &Cmp) -> String {
        let value = RawBytes(&cmp.data).to_u128() as u8;
        match self.key {
            MetaKey::L4Proto | MetaKey::Protocol => {
                if let Some(desc) = proto::transport(value) {
                    ctx.hdr.pin(desc);
                    return desc.name.to_string();
                }
            }
            MetaKey::NfProto => {
                let desc = match i32::from(value) {
                    libc::NFPROTO_IPV4 => Some(&proto::IP4),
                    libc::NFPROTO_IPV6 => Some(&proto::IP6),
                    _ => None,
                };
                if let Some(desc) = desc {
                    ctx.hdr.pin(desc);
                }
            }
            _ => {}
        }
        self.data_to_string(&cmp.data)
    }

    /// The JSON right-hand side of a comparison against this meta key.
    pub(crate) fn cmp_rhs_json(&self, cmp: &Cmp) -> Value {
        match self.key {
            MetaKey::L4Proto | MetaKey::Protocol => {
                Value::String(proto::proto_name(RawBytes(&cmp.data).to_u128() as u8).to_string())
            }
            MetaKey::NfProto => {
                Value::String(proto::nfproto_name(RawBytes(&cmp.data).to_u128() as u8).to_string())
            }
            MetaKey::IifName | MetaKey::OifName => {
                Value::String(RawBytes(&cmp.data).printable().unwrap_or_default().to_string())
            }
            MetaKey::NfTrace => crate::bytes::json_uint(RawBytes(&cmp.data).to_u128()),
            _ => RawBytes(&cmp.data).json(),
        }
    }
}
