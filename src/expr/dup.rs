use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::{nat, EncodeCtx};
use crate::ir::Ir;

/// Duplicate the packet to another address, optionally out of a specific
/// device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Dup {
    pub reg_addr: u32,
    pub reg_dev: u32,
}

impl Dup {
    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let mut out = String::from("dup");
        let mut addr = String::new();
        if self.reg_addr != 0 {
            addr = nat::reg_addr(ctx.regs.load(self.reg_addr)?);
            if !addr.is_empty() {
                out.push_str(&format!(" to {}", addr));
            }
        }
        if self.reg_dev != 0 {
            let dev = ctx.regs.load(self.reg_dev)?.human.clone();
            if !addr.is_empty() && !dev.is_empty() {
                out.push_str(&format!(" device {}", dev));
            }
        }
        Ok(Some(Ir::Simple(out)))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let mut body = serde_json::Map::new();
        if self.reg_addr != 0 {
            let addr = ctx.regs.load(self.reg_addr)?;
            if addr.json.is_null() {
                return Err(FormatError::EmptyRegister(self.reg_addr));
            }
            body.insert("addr".to_string(), addr.json.clone());
        }
        if self.reg_dev != 0 {
            let dev = ctx.regs.load(self.reg_dev)?;
            if dev.json.is_null() {
                return Err(FormatError::EmptyRegister(self.reg_dev));
            }
            body.insert("dev".to_string(), dev.json.clone());
        }
        Ok(Some(json!({ "dup": Value::Object(body) })))
    }
}
