use serde_json::{json, Value};

use crate::bytes::RawBytes;
use crate::error::FormatError;
use crate::expr::{CmpOp, EncodeCtx};
use crate::ir::Ir;

/// A range comparison of a register against an inclusive byte interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub sreg: u32,
    pub op: CmpOp,
    pub from: Vec<u8>,
    pub to: Vec<u8>,
}

impl Range {
    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let left = ctx.regs.load(self.sreg)?.human.clone();
        let op = match self.op {
            CmpOp::Eq => "",
            other => other.symbol(),
        };
        Ok(Some(Ir::Range {
            left,
            op,
            from: RawBytes(&self.from).string(),
            to: RawBytes(&self.to).string(),
        }))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let src = ctx.regs.load(self.sreg)?;
        if src.json.is_null() {
            return Err(FormatError::EmptyRegister(self.sreg));
        }
        Ok(Some(json!({
            "match": {
                "op": self.op.symbol(),
                "left": src.json.clone(),
                "right": {
                    "range": [RawBytes(&self.from).json(), RawBytes(&self.to).json()]
                },
            }
        })))
    }
}
