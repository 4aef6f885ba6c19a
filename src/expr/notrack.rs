use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

/// Disable connection tracking for the packet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Notrack;

impl Notrack {
    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        Ok(Some(Ir::Simple("notrack".to_string())))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        Ok(Some(json!({ "notrack": Value::Null })))
    }
}
