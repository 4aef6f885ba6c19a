use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::{nat, EncodeCtx};
use crate::ir::Ir;
use crate::ProtocolFamily;

/// Transparent proxying: steer the packet to a local socket without
/// rewriting it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TProxy {
    /// Address family the redirection applies to.
    pub family: ProtocolFamily,
    /// Family of the table the rule lives in.
    pub table_family: ProtocolFamily,
    pub reg_addr: u32,
    pub reg_port: u32,
}

impl TProxy {
    /// The family keyword is only spelled out in inet tables, where the
    /// statement would otherwise be ambiguous.
    fn family_word(&self) -> Option<&'static str> {
        if self.table_family == ProtocolFamily::Inet && self.family != ProtocolFamily::Unspec {
            Some(self.family.name())
        } else {
            None
        }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let mut addr = ctx
            .regs
            .get(self.reg_addr)
            .map(nat::reg_addr)
            .unwrap_or_default();
        if !addr.is_empty() && self.family == ProtocolFamily::Ipv6 {
            addr = format!("[{}]", addr);
        }
        let port = ctx
            .regs
            .get(self.reg_port)
            .map(nat::reg_port)
            .unwrap_or_default();

        Ok(Some(Ir::TProxy {
            family: self.family_word(),
            addr,
            port,
        }))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let mut body = serde_json::Map::new();
        if let Some(fam) = self.family_word() {
            body.insert("family".to_string(), json!(fam));
        }
        if let Some(addr) = ctx.regs.get(self.reg_addr) {
            body.insert("addr".to_string(), addr.json.clone());
        }
        if let Some(port) = ctx.regs.get(self.reg_port) {
            body.insert("port".to_string(), port.json.clone());
        }
        Ok(Some(json!({ "tproxy": Value::Object(body) })))
    }
}
