use std::fmt;

use serde_json::{json, Value};

use crate::bytes::scale_bytes;
use crate::error::FormatError;
use crate::expr::EncodeCtx;
use crate::ir::Ir;

/// What a limit meters: packets or payload bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LimitType {
    Packets,
    PacketBytes,
}

/// The period a limit rate is expressed over.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LimitTime {
    Second,
    Minute,
    Hour,
    Day,
    Week,
}

impl LimitTime {
    fn name(self) -> &'static str {
        match self {
            LimitTime::Second => "second",
            LimitTime::Minute => "minute",
            LimitTime::Hour => "hour",
            LimitTime::Day => "day",
            LimitTime::Week => "week",
        }
    }
}

impl fmt::Display for LimitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rate limit statement, in packet or byte mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Limit {
    pub kind: LimitType,
    pub rate: u64,
    pub unit: LimitTime,
    pub burst: u32,
    pub over: bool,
}

impl Limit {
    pub(crate) fn encode_text(&self, _ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let node = match self.kind {
            LimitType::Packets => Ir::Limit {
                over: self.over,
                rate: self.rate,
                rate_unit: None,
                per: self.unit.name(),
                burst: u64::from(self.burst),
                burst_unit: None,
            },
            LimitType::PacketBytes => {
                let (rate, rate_unit) = scale_bytes(self.rate);
                let (burst, burst_unit) = scale_bytes(u64::from(self.burst));
                Ir::Limit {
                    over: self.over,
                    rate,
                    rate_unit: Some(rate_unit),
                    per: self.unit.name(),
                    burst,
                    burst_unit: if self.burst != 0 {
                        Some(burst_unit)
                    } else {
                        None
                    },
                }
            }
        };
        Ok(Some(node))
    }

    pub(crate) fn encode_json(&self, _ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let mut body = serde_json::Map::new();
        match self.kind {
            LimitType::Packets => {
                body.insert("rate".to_string(), json!(self.rate));
                body.insert("burst".to_string(), json!(self.burst));
            }
            LimitType::PacketBytes => {
                let (rate, rate_unit) = scale_bytes(self.rate);
                let (burst, burst_unit) = scale_bytes(u64::from(self.burst));
                body.insert("rate".to_string(), json!(rate));
                body.insert("burst".to_string(), json!(burst));
                body.insert("rate_unit".to_string(), json!(rate_unit));
                body.insert("burst_unit".to_string(), json!(burst_unit));
            }
        }
        body.insert("per".to_string(), json!(self.unit.name()));
        if self.over {
            body.insert("inv".to_string(), json!(true));
        }
        Ok(Some(json!({ "limit": Value::Object(body) })))
    }
}
