use std::fmt;

use serde_json::Value;

use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

/// Kind of a named stateful object, NFT_OBJECT_*.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
#[non_exhaustive]
pub enum ObjType {
    Counter = 1,
    Quota = 2,
    CtHelper = 3,
    Limit = 4,
    CtTimeout = 7,
    SecMark = 8,
    CtExpect = 9,
    SynProxy = 10,
}

impl fmt::Display for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjType::Counter => "counter",
            ObjType::Quota => "quota",
            ObjType::CtHelper => "ct helper",
            ObjType::Limit => "limit",
            ObjType::CtTimeout => "ct timeout",
            ObjType::SecMark => "secmark",
            ObjType::SynProxy => "synproxy",
            ObjType::CtExpect => "ct expectation",
        };
        f.write_str(name)
    }
}

/// A reference to a named stateful object (`counter name mycounter`,
/// `ct helper set ftp-standard`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Objref {
    pub kind: ObjType,
    pub name: String,
}

impl Objref {
    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        Ok(Some(Ir::Objref {
            kind: self.kind,
            name: self.name.clone(),
        }))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let mut obj = serde_json::Map::new();
        obj.insert(self.kind.to_string(), Value::String(self.name.clone()));
        Ok(Some(Value::Object(obj)))
    }
}
