use serde_json::Value;

use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue, REG_VERDICT};
use crate::ir::Ir;

/// Direction of a byte-order conversion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ByteorderOp {
    /// Network to host order.
    Ntoh,
    /// Host to network order.
    Hton,
}

impl ByteorderOp {
    pub fn name(self) -> &'static str {
        match self {
            ByteorderOp::Ntoh => "ntoh",
            ByteorderOp::Hton => "hton",
        }
    }
}

/// A byte-order conversion between registers. Transparent in both output
/// dialects; the conversion tag rides along on the register value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Byteorder {
    pub sreg: u32,
    pub dreg: u32,
    pub op: ByteorderOp,
    pub len: u32,
    pub size: u32,
}

impl Byteorder {
    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        if self.dreg == REG_VERDICT {
            return Err(FormatError::VerdictRegisterWrite);
        }
        let src = ctx.regs.load(self.sreg)?;
        let forwarded = RegValue {
            human: src.human.clone(),
            len: src.len,
            origin: RegOrigin::Byteorder,
            op: Some(self.op),
            ..Default::default()
        };
        ctx.regs.store(self.dreg, forwarded)?;
        Ok(None)
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        if self.dreg == REG_VERDICT {
            return Err(FormatError::VerdictRegisterWrite);
        }
        let src = ctx.regs.load(self.sreg)?;
        let forwarded = RegValue {
            json: src.json.clone(),
            len: src.len,
            origin: src.origin.clone(),
            op: Some(self.op),
            ..Default::default()
        };
        ctx.regs.store(self.dreg, forwarded)?;
        Ok(None)
    }
}
