use serde_json::{json, Value};

use crate::bytes::scale_bytes;
use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

/// A quota statement: matches until (or after, with `over`) a byte total
/// has been consumed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Quota {
    pub bytes: u64,
    pub consumed: u64,
    pub over: bool,
}

impl Quota {
    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let (val, unit) = scale_bytes(self.bytes);
        let over = if self.over { "over " } else { "" };
        Ok(Some(Ir::Simple(format!("quota {}{} {}", over, val, unit))))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let (val, unit) = scale_bytes(self.bytes);
        Ok(Some(json!({
            "quota": { "val": val, "val_unit": unit }
        })))
    }
}
