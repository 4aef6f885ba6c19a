use std::time::Duration;

use serde_json::{json, Value};

use crate::bytes::format_duration;
use crate::error::FormatError;
use crate::expr::{EncodeCtx, Expression};
use crate::ir::Ir;
use crate::rule;

/// What a dynset statement does to the set, NFT_DYNSET_OP_*.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DynsetOp {
    Add = 0,
    Update = 1,
    Delete = 2,
}

impl DynsetOp {
    pub fn name(self) -> &'static str {
        match self {
            DynsetOp::Add => "add",
            DynsetOp::Update => "update",
            DynsetOp::Delete => "delete",
        }
    }
}

/// A dynamic set update: adds, refreshes or deletes an element as a side
/// effect of the rule matching (`update @seen { ip saddr timeout 5m }`).
#[derive(Debug, Clone, PartialEq)]
pub struct Dynset {
    pub op: DynsetOp,
    pub set_name: String,
    pub set_id: u32,
    pub sreg_key: u32,
    /// Data register for map sets; zero when the set maps nothing.
    pub sreg_data: u32,
    pub timeout: Option<Duration>,
    /// Statements attached to the new element, e.g. a per-element counter.
    pub exprs: Vec<Expression>,
}

impl Dynset {
    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let key = ctx.regs.load(self.sreg_key)?.human.clone();

        // the attached statements form a miniature rule of their own,
        // formatted against a fresh register file
        let inner = rule::format_statements(&self.exprs, ctx.rule, ctx.sets)?;

        let mut elem = key;
        if !inner.is_empty() {
            elem.push(' ');
            elem.push_str(&inner);
        }
        if let Some(timeout) = self.timeout {
            elem.push_str(&format!(" timeout {}", format_duration(timeout)));
        }
        if let Some(data) = ctx.regs.get(self.sreg_data) {
            if !data.human.is_empty() {
                elem.push_str(&format!(" : {}", data.human));
            }
        }

        Ok(Some(Ir::Simple(format!(
            "{} @{} {{ {} }}",
            self.op.name(),
            self.set_name,
            elem
        ))))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let key = ctx.regs.load(self.sreg_key)?;
        if key.json.is_null() {
            return Err(FormatError::EmptyRegister(self.sreg_key));
        }

        let mut elem = key.json.clone();
        if let Some(timeout) = self.timeout {
            elem = json!({
                "elem": { "val": elem, "timeout": timeout.as_secs() }
            });
        }
        let set_ref = format!("@{}", self.set_name);

        if let Some(data) = ctx.regs.get(self.sreg_data) {
            if !data.json.is_null() {
                return Ok(Some(json!({
                    "map": {
                        "op": self.op.name(),
                        "elem": elem,
                        "data": data.json.clone(),
                        "map": set_ref,
                    }
                })));
            }
        }

        let mut body = serde_json::Map::new();
        body.insert("op".to_string(), json!(self.op.name()));
        body.insert("elem".to_string(), elem);
        body.insert("set".to_string(), json!(set_ref));
        let stmts = rule::json_statements(&self.exprs, ctx.rule, ctx.sets)?;
        if !stmts.is_empty() {
            body.insert("stmt".to_string(), Value::Array(stmts));
        }
        Ok(Some(json!({ "set": Value::Object(body) })))
    }
}
