use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

bitflags::bitflags! {
    /// Userspace queueing behaviour, NFT_QUEUE_FLAG_*.
    pub struct QueueFlags: u16 {
        const BYPASS = 0x01;
        const FANOUT = 0x02;
    }
}

impl Default for QueueFlags {
    fn default() -> Self {
        QueueFlags::empty()
    }
}

/// Queue the packet to userspace. A total above one spreads packets over a
/// contiguous range of queues.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Queue {
    pub num: u16,
    pub total: u16,
    pub flags: QueueFlags,
}

impl Queue {
    fn flag_names(&self) -> Vec<&'static str> {
        const NAMES: [(QueueFlags, &str); 2] =
            [(QueueFlags::BYPASS, "bypass"), (QueueFlags::FANOUT, "fanout")];
        NAMES
            .iter()
            .filter(|(f, _)| self.flags.contains(*f))
            .map(|(_, n)| *n)
            .collect()
    }

    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        Ok(Some(Ir::Queue {
            num: self.num,
            total: self.total,
            flags: self.flag_names(),
        }))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let mut body = serde_json::Map::new();
        if self.num != 0 {
            body.insert("num".to_string(), json!(self.num));
        }
        let flags = self.flag_names();
        match flags.len() {
            0 => {}
            1 => {
                body.insert("flags".to_string(), json!(flags[0]));
            }
            _ => {
                body.insert("flags".to_string(), json!(flags));
            }
        }
        Ok(Some(json!({ "queue": Value::Object(body) })))
    }
}
