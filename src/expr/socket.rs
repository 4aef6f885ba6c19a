use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue};
use crate::ir::Ir;

/// Socket attribute selector, NFT_SOCKET_*.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SocketKey {
    Transparent,
    Mark,
    Wildcard,
    CgroupV2,
}

impl SocketKey {
    fn name(self) -> &'static str {
        match self {
            SocketKey::Transparent => "transparent",
            SocketKey::Mark => "mark",
            SocketKey::Wildcard => "wildcard",
            SocketKey::CgroupV2 => "cgroupv2",
        }
    }
}

/// A socket expression reads attributes of the socket the packet belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Socket {
    pub key: SocketKey,
    /// Cgroup ancestor level, only meaningful for [`SocketKey::CgroupV2`].
    pub level: u32,
    pub dreg: u32,
}

impl Socket {
    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        if self.dreg == 0 {
            return Err(FormatError::InvalidDestRegister(self.dreg));
        }
        let mut human = format!("socket {}", self.key.name());
        if let SocketKey::CgroupV2 = self.key {
            human.push_str(&format!(" level {}", self.level));
        }
        ctx.regs
            .store(self.dreg, RegValue::text(human, RegOrigin::Other))?;
        Ok(None)
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        if self.dreg == 0 {
            return Err(FormatError::InvalidDestRegister(self.dreg));
        }
        let socket = json!({ "socket": { "key": self.key.name() } });
        ctx.regs
            .store(self.dreg, RegValue::json(socket, RegOrigin::Other))?;
        Ok(None)
    }
}
