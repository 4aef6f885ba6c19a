use std::fmt;
use std::time::Duration;

use serde_json::{json, Value};

use crate::bytes::{format_duration, RawBytes};
use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue};
use crate::ir::Ir;
use crate::proto;

bitflags::bitflags! {
    pub struct CtState: u32 {
        const INVALID = 1;
        const ESTABLISHED = 2;
        const RELATED = 4;
        const NEW = 8;
        const UNTRACKED = 64;
    }
}

bitflags::bitflags! {
    pub struct CtStatus: u32 {
        const EXPECTED = 1;
        const SEEN_REPLY = 2;
        const ASSURED = 4;
        const CONFIRMED = 8;
        const SNAT = 16;
        const DNAT = 32;
        const DYING = 512;
    }
}

/// A conntrack attribute, as addressed by a ct expression.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
#[non_exhaustive]
pub enum CtKey {
    State = 0,
    Direction = 1,
    Status = 2,
    Mark = 3,
    SecMark = 4,
    Expiration = 5,
    Helper = 6,
    L3Protocol = 7,
    Src = 8,
    Dst = 9,
    Protocol = 10,
    ProtoSrc = 11,
    ProtoDst = 12,
    Labels = 13,
    Pkts = 14,
    Bytes = 15,
    AvgPkt = 16,
    Zone = 17,
    EventMask = 18,
}

impl fmt::Display for CtKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CtKey::State => "state",
            CtKey::Direction => "direction",
            CtKey::Status => "status",
            CtKey::Mark => "mark",
            CtKey::SecMark => "secmark",
            CtKey::Expiration => "expiration",
            CtKey::Helper => "helper",
            CtKey::L3Protocol => "l3proto",
            CtKey::Src => "saddr",
            CtKey::Dst => "daddr",
            CtKey::Protocol => "protocol",
            CtKey::ProtoSrc => "proto-src",
            CtKey::ProtoDst => "proto-dst",
            CtKey::Labels => "label",
            CtKey::Pkts => "packets",
            CtKey::Bytes => "bytes",
            CtKey::AvgPkt => "avgpkt",
            CtKey::Zone => "zone",
            CtKey::EventMask => "event",
        };
        f.write_str(name)
    }
}

impl CtKey {
    /// Decodes comparison bytes through the dictionary of this key. State,
    /// status and event masks are little-endian bitfields; counters and
    /// marks are little-endian integers; the rest has bespoke vocabulary.
    pub(crate) fn decode(self, data: &[u8]) -> String {
        match self {
            CtKey::State => ct_state(RawBytes(data).le_u128() as u32),
            CtKey::Direction => match data.first().copied().unwrap_or(0) {
                0 => "original".to_string(),
                1 => "reply".to_string(),
                _ => "unknown".to_string(),
            },
            CtKey::Status => ct_status(RawBytes(data).le_u128() as u32),
            CtKey::EventMask => ct_events(RawBytes(data).le_u128() as u32),
            CtKey::Expiration => {
                format_duration(Duration::from_millis(RawBytes(data).le_u128() as u64))
            }
            CtKey::Helper => RawBytes(data).printable().unwrap_or_default().to_string(),
            CtKey::L3Protocol => {
                proto::nfproto_name(data.first().copied().unwrap_or(0)).to_string()
            }
            // conntrack address keys carry no family information; nft
            // flags them rather than guessing
            CtKey::Src | CtKey::Dst => {
                format!("0x{:x} [invalid type]", RawBytes(data).le_u128())
            }
            CtKey::Protocol => proto::proto_name(RawBytes(data).to_u128() as u8).to_string(),
            CtKey::ProtoSrc | CtKey::ProtoDst | CtKey::Labels => RawBytes(data).decimal(),
            CtKey::Mark
            | CtKey::SecMark
            | CtKey::Pkts
            | CtKey::Bytes
            | CtKey::AvgPkt
            | CtKey::Zone => RawBytes(data).le_u128().to_string(),
        }
    }
}

fn ct_state(bits: u32) -> String {
    const NAMES: [(CtState, &str); 5] = [
        (CtState::INVALID, "invalid"),
        (CtState::ESTABLISHED, "established"),
        (CtState::RELATED, "related"),
        (CtState::NEW, "new"),
        (CtState::UNTRACKED, "untracked"),
    ];
    let state = CtState::from_bits_truncate(bits);
    let names: Vec<&str> = NAMES
        .iter()
        .filter(|(f, _)| state.contains(*f))
        .map(|(_, n)| *n)
        .collect();
    names.join(",")
}

fn ct_status(bits: u32) -> String {
    const NAMES: [(CtStatus, &str); 7] = [
        (CtStatus::EXPECTED, "expected"),
        (CtStatus::SEEN_REPLY, "seen-reply"),
        (CtStatus::ASSURED, "assured"),
        (CtStatus::CONFIRMED, "confirmed"),
        (CtStatus::SNAT, "snat"),
        (CtStatus::DNAT, "dnat"),
        (CtStatus::DYING, "dying"),
    ];
    let status = CtStatus::from_bits_truncate(bits);
    let names: Vec<&str> = NAMES
        .iter()
        .filter(|(f, _)| status.contains(*f))
        .map(|(_, n)| *n)
        .collect();
    names.join(",")
}

fn ct_events(bits: u32) -> String {
    const NAMES: [&str; 11] = [
        "new",
        "related",
        "destroy",
        "reply",
        "assured",
        "protoinfo",
        "helper",
        "mark",
        "seqadj",
        "secmark",
        "label",
    ];
    let names: Vec<&str> = NAMES
        .iter()
        .enumerate()
        .filter(|(i, _)| bits & (1 << i) != 0)
        .map(|(_, n)| *n)
        .collect();
    names.join(",")
}

/// A conntrack expression reads or writes one attribute of the packet's
/// connection-tracking entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ct {
    pub key: CtKey,
    pub dreg: u32,
    pub sreg: u32,
}

impl Ct {
    pub fn read(key: CtKey, dreg: u32) -> Self {
        Ct { key, dreg, sreg: 0 }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let keyword = format!("ct {}", self.key);

        if self.sreg == 0 {
            if self.dreg == 0 {
                return Err(FormatError::InvalidDestRegister(self.dreg));
            }
            ctx.regs
                .store(self.dreg, RegValue::text(keyword, RegOrigin::Ct(self.key)))?;
            return Ok(None);
        }

        let src = ctx.regs.load(self.sreg)?;
        let value = match &src.origin {
            // mark and friends are written as host-order u32 immediates
            RegOrigin::Immediate(data) if data.len() >= 4 => {
                u32::from_le_bytes([data[0], data[1], data[2], data[3]]).to_string()
            }
            _ => src.human.clone(),
        };
        Ok(Some(Ir::Simple(format!("{} set {}", keyword, value))))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let ct = json!({ "ct": { "key": self.key.to_string() } });

        if self.sreg == 0 {
            if self.dreg == 0 {
                return Err(FormatError::InvalidDestRegister(self.dreg));
            }
            ctx.regs
                .store(self.dreg, RegValue::json(ct, RegOrigin::Ct(self.key)))?;
            return Ok(None);
        }

        let src = ctx.regs.load(self.sreg)?;
        Ok(Some(json!({
            "mangle": { "key": ct, "value": src.json.clone() }
        })))
    }
}
