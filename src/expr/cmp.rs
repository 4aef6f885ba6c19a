use serde_json::{json, Value};

use crate::bytes::RawBytes;
use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin};
use crate::ir::Ir;

/// Comparison operator.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum CmpOp {
    Eq = 0,
    Neq = 1,
    Lt = 2,
    Lte = 3,
    Gt = 4,
    Gte = 5,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Neq => "!=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
        }
    }
}

/// A comparison of a register against constant data. This is where most
/// statements come together: the left-hand side was prepared by whatever
/// loaded the register, the right-hand side is decoded according to that
/// origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmp {
    pub sreg: u32,
    pub op: CmpOp,
    pub data: Vec<u8>,
}

impl Cmp {
    pub fn new(sreg: u32, op: CmpOp, data: impl Into<Vec<u8>>) -> Self {
        Cmp {
            sreg,
            op,
            data: data.into(),
        }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let src = ctx.regs.load(self.sreg)?.clone();

        let mut left = src.human.clone();
        let mut right = String::new();

        match &src.origin {
            RegOrigin::Meta(key) => {
                let meta = super::Meta {
                    key: *key,
                    dreg: 0,
                    sreg: 0,
                };
                right = meta.cmp_rhs(ctx, self);
            }
            RegOrigin::Bitwise => {
                right = super::bitwise::masked_cmp_rhs(ctx, &self.data);
            }
            RegOrigin::Ct(key) => {
                right = key.decode(&self.data);
            }
            RegOrigin::Payload { base, offset, len } => {
                let payload = super::Payload {
                    base: *base,
                    offset: *offset,
                    len: *len,
                    dreg: 0,
                    sreg: 0,
                };
                let (l, r) = payload.cmp_fragments(ctx, self);
                if !l.is_empty() {
                    left = l;
                }
                right = r;
            }
            _ => {
                right = RawBytes(&self.data).decimal();
            }
        }

        // equality stays implicit in the text dialect
        let op = match self.op {
            CmpOp::Eq => "",
            other => other.symbol(),
        };
        Ok(Some(Ir::Cmp { left, op, right }))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let src = ctx.regs.load(self.sreg)?;
        if src.json.is_null() {
            return Err(FormatError::EmptyRegister(self.sreg));
        }

        let right = match &src.origin {
            RegOrigin::Meta(key) => {
                let meta = super::Meta {
                    key: *key,
                    dreg: 0,
                    sreg: 0,
                };
                meta.cmp_rhs_json(self)
            }
            _ => RawBytes(&self.data).json(),
        };

        Ok(Some(json!({
            "match": {
                "op": self.op.symbol(),
                "left": src.json.clone(),
                "right": right,
            }
        })))
    }
}
