use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue};
use crate::ir::Ir;

/// Number-generator mode, NFT_NG_*.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NumgenMode {
    Incremental,
    Random,
}

impl NumgenMode {
    fn name(self) -> &'static str {
        match self {
            NumgenMode::Incremental => "inc",
            NumgenMode::Random => "random",
        }
    }
}

/// A number generator, the building block of round-robin and random load
/// balancing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Numgen {
    pub mode: NumgenMode,
    pub dreg: u32,
    pub modulus: u32,
    pub offset: u32,
}

impl Numgen {
    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        if self.dreg == 0 {
            return Err(FormatError::InvalidDestRegister(self.dreg));
        }
        let mut human = format!("numgen {} mod {}", self.mode.name(), self.modulus);
        if self.offset != 0 {
            human.push_str(&format!(" offset {}", self.offset));
        }
        ctx.regs
            .store(self.dreg, RegValue::text(human, RegOrigin::Other))?;
        Ok(None)
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        if self.dreg == 0 {
            return Err(FormatError::InvalidDestRegister(self.dreg));
        }
        let numgen = json!({
            "numgen": {
                "mode": self.mode.name(),
                "mod": self.modulus,
                "offset": self.offset,
            }
        });
        ctx.regs
            .store(self.dreg, RegValue::json(numgen, RegOrigin::Other))?;
        Ok(None)
    }
}
