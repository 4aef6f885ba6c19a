use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

/// An iptables-compat match extension carried inside an nftables rule. The
/// opaque match blob cannot be decoded here; listings name the extension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Match {
    pub name: String,
    pub rev: u32,
    pub info: Vec<u8>,
}

impl Match {
    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        Ok(Some(Ir::Simple(format!("xt match \"{}\"", self.name))))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        Ok(Some(json!({
            "xt": { "type": "match", "name": self.name }
        })))
    }
}

/// An iptables-compat target extension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Target {
    pub name: String,
    pub rev: u32,
    pub info: Vec<u8>,
}

impl Target {
    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        Ok(Some(Ir::Simple(format!("xt target \"{}\"", self.name))))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        Ok(Some(json!({
            "xt": { "type": "target", "name": self.name }
        })))
    }
}
