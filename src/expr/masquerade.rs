use serde_json::Value;

use crate::error::FormatError;
use crate::expr::{EncodeCtx, Nat, NatKind};
use crate::ir::Ir;

bitflags::bitflags! {
    /// NAT range flags, NF_NAT_RANGE_*.
    pub struct NatRangeFlags: u32 {
        const MAP_IPS = 0x01;
        const PROTO_SPECIFIED = 0x02;
        const PROTO_RANDOM = 0x04;
        const PERSISTENT = 0x08;
        const PROTO_RANDOM_FULLY = 0x10;
    }
}

impl Default for NatRangeFlags {
    fn default() -> Self {
        NatRangeFlags::empty()
    }
}

/// Source-NAT onto the outgoing interface's address. Lowers into the nat
/// encoder with the masquerade type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Masquerade {
    pub random: bool,
    pub fully_random: bool,
    pub persistent: bool,
    pub reg_proto_min: u32,
    pub reg_proto_max: u32,
}

impl Masquerade {
    fn lower(&self) -> Nat {
        Nat {
            reg_proto_min: self.reg_proto_min,
            reg_proto_max: self.reg_proto_max,
            random: self.random,
            fully_random: self.fully_random,
            persistent: self.persistent,
            ..Nat::new(NatKind::Masquerade, crate::ProtocolFamily::Unspec)
        }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        self.lower().encode_text(ctx)
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        self.lower().encode_json(ctx)
    }
}

/// Redirect to the local machine, optionally onto another port. Lowers
/// into the nat encoder with the redirect type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Redirect {
    pub reg_proto_min: u32,
    pub reg_proto_max: u32,
    pub flags: NatRangeFlags,
}

impl Redirect {
    fn lower(&self) -> Nat {
        Nat {
            reg_proto_min: self.reg_proto_min,
            reg_proto_max: self.reg_proto_max,
            random: self.flags.contains(NatRangeFlags::PROTO_RANDOM),
            fully_random: self.flags.contains(NatRangeFlags::PROTO_RANDOM_FULLY),
            persistent: self.flags.contains(NatRangeFlags::PERSISTENT),
            ..Nat::new(NatKind::Redirect, crate::ProtocolFamily::Unspec)
        }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        self.lower().encode_text(ctx)
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        self.lower().encode_json(ctx)
    }
}
