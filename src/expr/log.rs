use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

bitflags::bitflags! {
    /// Extra information a log statement records, NF_LOG_* bits.
    pub struct LogFlags: u32 {
        const TCP_SEQ = 0x01;
        const TCP_OPT = 0x02;
        const IP_OPT = 0x04;
        const UID = 0x08;
        const NFLOG = 0x10;
        const MAC_DECODE = 0x20;
        const MASK = 0x2f;
    }
}

impl Default for LogFlags {
    fn default() -> Self {
        LogFlags::empty()
    }
}

/// Syslog severity of a log statement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Emerg,
    Alert,
    Crit,
    Err,
    Warning,
    Notice,
    Info,
    Debug,
    Audit,
}

impl LogLevel {
    fn name(self) -> &'static str {
        match self {
            LogLevel::Emerg => "emerg",
            LogLevel::Alert => "alert",
            LogLevel::Crit => "crit",
            LogLevel::Err => "err",
            LogLevel::Warning => "warn",
            LogLevel::Notice => "notice",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Audit => "audit",
        }
    }
}

/// A log statement. Every attribute is optional; a bare `log` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Log {
    pub prefix: Option<String>,
    pub group: Option<u16>,
    pub snaplen: Option<u32>,
    pub queue_threshold: Option<u16>,
    pub level: Option<LogLevel>,
    pub flags: LogFlags,
}

impl Log {
    fn flag_names(&self) -> Vec<&'static str> {
        if self.flags.contains(LogFlags::MASK) {
            return vec!["all"];
        }
        const NAMES: [(LogFlags, &str); 6] = [
            (LogFlags::TCP_SEQ, "tcp sequence"),
            (LogFlags::TCP_OPT, "tcp options"),
            (LogFlags::IP_OPT, "ip options"),
            (LogFlags::UID, "skuid"),
            (LogFlags::NFLOG, "nflog"),
            (LogFlags::MAC_DECODE, "mac-decode"),
        ];
        NAMES
            .iter()
            .filter(|(f, _)| self.flags.contains(*f))
            .map(|(_, n)| *n)
            .collect()
    }

    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        Ok(Some(Ir::Log {
            prefix: self.prefix.clone(),
            group: self.group,
            snaplen: self.snaplen,
            queue_threshold: self.queue_threshold,
            level: self.level.map(LogLevel::name),
            flags: self.flag_names(),
        }))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let mut body = serde_json::Map::new();
        if let Some(prefix) = &self.prefix {
            body.insert("prefix".to_string(), json!(prefix));
        }
        if let Some(group) = self.group {
            body.insert("group".to_string(), json!(group));
        }
        if let Some(snaplen) = self.snaplen {
            body.insert("snaplen".to_string(), json!(snaplen));
        }
        if let Some(qthreshold) = self.queue_threshold {
            body.insert("queue-threshold".to_string(), json!(qthreshold));
        }
        if let Some(level) = self.level {
            body.insert("level".to_string(), json!(level.name()));
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
        let log = if body.is_empty() {
            Value::Null
        } else {
            Value::Object(body)
        };
        Ok(Some(json!({ "log": log })))
    }
}
