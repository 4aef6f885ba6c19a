use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue};
use crate::ir::Ir;

/// Routing data selector, NFT_RT_*.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RtKey {
    ClassId,
    NextHop4,
    NextHop6,
    TcpMss,
}

impl RtKey {
    fn name(self) -> &'static str {
        match self {
            RtKey::ClassId => "classid",
            RtKey::NextHop4 | RtKey::NextHop6 => "nexthop",
            RtKey::TcpMss => "mtu",
        }
    }

    fn family(self) -> Option<&'static str> {
        match self {
            RtKey::NextHop4 => Some("ip"),
            RtKey::NextHop6 => Some("ip6"),
            _ => None,
        }
    }
}

/// An rt expression loads routing information about the packet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rt {
    pub key: RtKey,
    pub dreg: u32,
}

impl Rt {
    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        if self.dreg == 0 {
            return Err(FormatError::InvalidDestRegister(self.dreg));
        }
        let human = match self.key.family() {
            Some(fam) => format!("rt {} {}", fam, self.key.name()),
            None => format!("rt {}", self.key.name()),
        };
        ctx.regs
            .store(self.dreg, RegValue::text(human, RegOrigin::Other))?;
        Ok(None)
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        if self.dreg == 0 {
            return Err(FormatError::InvalidDestRegister(self.dreg));
        }
        let mut body = serde_json::Map::new();
        body.insert("key".to_string(), json!(self.key.name()));
        if let Some(fam) = self.key.family() {
            body.insert("family".to_string(), json!(fam));
        }
        let rt = json!({ "rt": Value::Object(body) });
        ctx.regs.store(self.dreg, RegValue::json(rt, RegOrigin::Other))?;
        Ok(None)
    }
}
