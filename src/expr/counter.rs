use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

/// A counter statement. The kernel-side packet and byte totals only show up
/// in the JSON dialect; listings always print the zeroed form, matching the
/// reference formatter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Counter {
    pub bytes: u64,
    pub packets: u64,
}

impl Counter {
    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        Ok(Some(Ir::Simple("counter packets 0 bytes 0".to_string())))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        Ok(Some(json!({
            "counter": { "bytes": self.bytes, "packets": self.packets }
        })))
    }
}
