use std::fmt;

use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

/// The disposition a rule hands down for a packet. Jump and goto carry the
/// target chain.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum VerdictKind {
    /// Silently drop the packet.
    Drop,
    /// Accept the packet and let it pass.
    Accept,
    Stolen,
    Queue,
    Repeat,
    Stop,
    Continue,
    Break,
    Jump,
    Goto,
    Return,
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            VerdictKind::Drop => "drop",
            VerdictKind::Accept => "accept",
            VerdictKind::Stolen => "stolen",
            VerdictKind::Queue => "queue",
            VerdictKind::Repeat => "repeat",
            VerdictKind::Stop => "stop",
            VerdictKind::Continue => "continue",
            VerdictKind::Break => "break",
            VerdictKind::Jump => "jump",
            VerdictKind::Goto => "goto",
            VerdictKind::Return => "return",
        };
        f.write_str(word)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub kind: VerdictKind,
    /// Target chain of a jump or goto.
    pub chain: Option<String>,
}

impl Verdict {
    pub fn new(kind: VerdictKind) -> Self {
        Verdict { kind, chain: None }
    }

    pub fn jump(chain: impl Into<String>) -> Self {
        Verdict {
            kind: VerdictKind::Jump,
            chain: Some(chain.into()),
        }
    }

    pub fn goto(chain: impl Into<String>) -> Self {
        Verdict {
            kind: VerdictKind::Goto,
            chain: Some(chain.into()),
        }
    }

    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let text = match &self.chain {
            Some(chain) => format!("{} {}", self.kind, chain),
            None => self.kind.to_string(),
        };
        Ok(Some(Ir::Simple(text)))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let body = match &self.chain {
            Some(chain) => json!({ "target": chain }),
            None => Value::Null,
        };
        let mut obj = serde_json::Map::new();
        obj.insert(self.kind.to_string(), body);
        Ok(Some(Value::Object(obj)))
    }
}
