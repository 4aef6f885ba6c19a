use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

/// How a reject statement refuses the packet, NFT_REJECT_*.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RejectKind {
    /// An ICMP unreachable of the family given by the code.
    IcmpUnreach = 0,
    /// A TCP RST.
    TcpRst = 1,
    /// A family-agnostic ICMP unreachable.
    IcmpxUnreach = 2,
}

/// NFT_REJECT_ICMPX_PORT_UNREACH, the default icmpx code that stays
/// implicit in listings.
const ICMPX_PORT_UNREACH: u8 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Reject {
    pub kind: RejectKind,
    pub code: u8,
}

impl Reject {
    fn kind_word(&self) -> Option<&'static str> {
        match self.kind {
            RejectKind::TcpRst => Some("tcp reset"),
            RejectKind::IcmpxUnreach => {
                if self.code == ICMPX_PORT_UNREACH {
                    None
                } else {
                    Some("icmpx")
                }
            }
            RejectKind::IcmpUnreach => match i32::from(self.code) {
                libc::NFPROTO_IPV4 => Some("icmp"),
                libc::NFPROTO_IPV6 => Some("icmpv6"),
                _ => None,
            },
        }
    }

    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        Ok(Some(Ir::Reject {
            with: self.kind_word().map(|w| (w, self.code)),
        }))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let word = self.kind_word();
        if word.is_none() && self.code == 0 {
            return Ok(Some(json!({ "reject": Value::Null })));
        }
        let mut body = serde_json::Map::new();
        if let Some(word) = word {
            body.insert("type".to_string(), json!(word));
        }
        if self.code != 0 {
            body.insert("expr".to_string(), json!(self.code));
        }
        Ok(Some(json!({ "reject": Value::Object(body) })))
    }
}
