use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue};
use crate::ir::Ir;

/// Hash function selector.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HashType {
    Jenkins,
    Symmetric,
}

impl HashType {
    fn name(self) -> &'static str {
        match self {
            HashType::Jenkins => "jhash",
            HashType::Symmetric => "symhash",
        }
    }
}

/// A hash expression: maps an input register (or, for symhash, the flow
/// tuple) onto `[offset, offset+modulus)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Hash {
    pub kind: HashType,
    pub sreg: u32,
    pub dreg: u32,
    pub modulus: u32,
    pub seed: u32,
    pub offset: u32,
}

impl Hash {
    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        if self.dreg == 0 {
            return Err(FormatError::InvalidDestRegister(self.dreg));
        }
        let mut human = match self.kind {
            HashType::Symmetric => "symhash".to_string(),
            HashType::Jenkins => {
                let src = ctx.regs.load(self.sreg)?;
                format!("jhash {}", src.human)
            }
        };
        human.push_str(&format!(" mod {} seed 0x{:x}", self.modulus, self.seed));
        if self.offset > 0 {
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
        let mut body = serde_json::Map::new();
        body.insert("mod".to_string(), json!(self.modulus));
        if self.seed != 0 {
            body.insert("seed".to_string(), json!(self.seed));
        }
        if self.offset != 0 {
            body.insert("offset".to_string(), json!(self.offset));
        }
        if let HashType::Jenkins = self.kind {
            let src = ctx.regs.load(self.sreg)?;
            body.insert("expr".to_string(), src.json.clone());
        }
        let mut hash = serde_json::Map::new();
        hash.insert(self.kind.name().to_string(), Value::Object(body));
        ctx.regs
            .store(self.dreg, RegValue::json(Value::Object(hash), RegOrigin::Other))?;
        Ok(None)
    }
}
