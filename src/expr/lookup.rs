use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue, REG_VERDICT};
use crate::ir::Ir;

/// A lookup expression tests a register against a set, or maps it through
/// one. With a destination register the set is a map; mapping into the
/// verdict register is a verdict map (`vmap`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub sreg: u32,
    /// Destination register of a map lookup. `Some(0)` is the verdict
    /// register, i.e. a vmap.
    pub dreg: Option<u32>,
    pub set_name: String,
    pub set_id: u32,
    pub invert: bool,
}

impl Lookup {
    pub fn new(sreg: u32, set_name: impl Into<String>, set_id: u32) -> Self {
        Lookup {
            sreg,
            dreg: None,
            set_name: set_name.into(),
            set_id,
            invert: false,
        }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let set = ctx.sets.resolve(
            &ctx.rule.table,
            ctx.rule.family,
            &self.set_name,
            self.set_id,
        )?;
        let left = ctx.regs.load(self.sreg)?.human.clone();
        let right = set.render();

        if let Some(dreg) = self.dreg {
            if dreg != REG_VERDICT {
                ctx.regs.store(
                    dreg,
                    RegValue::text(format!("{} map {}", left, right), RegOrigin::Other),
                )?;
                return Ok(None);
            }
            return Ok(Some(Ir::Simple(format!("{} vmap {}", left, right))));
        }

        Ok(Some(Ir::Lookup {
            left,
            right,
            invert: self.invert,
        }))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let src = ctx.regs.load(self.sreg)?;
        let set_ref = format!("@{}", self.set_name);

        if let Some(dreg) = self.dreg {
            let map = json!({ "key": src.json.clone(), "data": set_ref });
            if dreg != REG_VERDICT {
                let stored = json!({ "map": map });
                ctx.regs.store(dreg, RegValue::json(stored, RegOrigin::Other))?;
                return Ok(None);
            }
            return Ok(Some(json!({ "vmap": map })));
        }

        let op = if self.invert { "!=" } else { "==" };
        Ok(Some(json!({
            "match": { "op": op, "left": src.json.clone(), "right": set_ref }
        })))
    }
}
