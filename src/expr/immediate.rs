use serde_json::Value;

use crate::bytes::RawBytes;
use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue};
use crate::ir::Ir;

/// An immediate expression loads constant data into a register. Verdicts
/// use a dedicated [`Verdict`] expression instead.
///
/// [`Verdict`]: struct.Verdict.html
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Immediate {
    pub dreg: u32,
    pub data: Vec<u8>,
}

impl Immediate {
    pub fn new(dreg: u32, data: impl Into<Vec<u8>>) -> Self {
        Immediate {
            dreg,
            data: data.into(),
        }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        ctx.regs.store(
            self.dreg,
            RegValue {
                human: RawBytes(&self.data).string(),
                len: self.data.len() as u32,
                origin: RegOrigin::Immediate(self.data.clone()),
                ..Default::default()
            },
        )?;
        Ok(None)
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        ctx.regs.store(
            self.dreg,
            RegValue {
                json: RawBytes(&self.data).json(),
                len: self.data.len() as u32,
                origin: RegOrigin::Immediate(self.data.clone()),
                ..Default::default()
            },
        )?;
        Ok(None)
    }
}
