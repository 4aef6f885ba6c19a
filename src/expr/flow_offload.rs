use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

/// Offload the flow to a flowtable (`flow add @ft`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowOffload {
    pub table_name: String,
}

impl FlowOffload {
    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        Ok(Some(Ir::Simple(format!("flow add @{}", self.table_name))))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        Ok(Some(json!({
            "flow": { "op": "add", "flowtable": self.table_name }
        })))
    }
}
