use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

/// NFT_LIMIT_F_INV: count connections over the threshold instead of under.
pub const CONNLIMIT_F_INV: u32 = 1;

/// A connection-count limit (`ct count over 20`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Connlimit {
    pub count: u32,
    pub flags: u32,
}

impl Connlimit {
    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let over = if self.flags != 0 { "over " } else { "" };
        Ok(Some(Ir::Simple(format!("ct count {}{}", over, self.count))))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let mut body = json!({ "val": self.count });
        if self.flags & CONNLIMIT_F_INV != 0 {
            body["inv"] = Value::Bool(true);
        }
        Ok(Some(json!({ "ct count": body })))
    }
}
