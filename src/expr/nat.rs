use serde_json::{json, Value};

use crate::bytes::RawBytes;
use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue};
use crate::ir::Ir;
use crate::ProtocolFamily;

/// The translation a nat statement performs. Masquerade and redirect are
/// compiled down to this expression as well.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NatKind {
    Snat,
    Dnat,
    Masquerade,
    Redirect,
}

impl NatKind {
    pub fn name(self) -> &'static str {
        match self {
            NatKind::Snat => "snat",
            NatKind::Dnat => "dnat",
            NatKind::Masquerade => "masquerade",
            NatKind::Redirect => "redirect",
        }
    }
}

/// Renders the address register of a nat-like statement. Addresses usually
/// arrive as immediates, whose raw bytes are the address itself.
pub(crate) fn reg_addr(val: &RegValue) -> String {
    if let RegOrigin::Immediate(data) = &val.origin {
        if let Some(ip) = RawBytes(data).ip() {
            return ip.to_string();
        }
    }
    val.human.clone()
}

/// Renders a port register; immediate ports are big-endian u16s.
pub(crate) fn reg_port(val: &RegValue) -> String {
    if let RegOrigin::Immediate(data) = &val.origin {
        return RawBytes(data).decimal();
    }
    val.human.clone()
}

fn bracket_v6(addr: String, family: ProtocolFamily) -> String {
    if family == ProtocolFamily::Ipv6 {
        format!("[{}]", addr)
    } else {
        addr
    }
}

/// A network-address translation statement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Nat {
    pub kind: NatKind,
    pub family: ProtocolFamily,
    pub reg_addr_min: u32,
    pub reg_addr_max: u32,
    pub reg_proto_min: u32,
    pub reg_proto_max: u32,
    pub random: bool,
    pub fully_random: bool,
    pub persistent: bool,
}

impl Nat {
    pub fn new(kind: NatKind, family: ProtocolFamily) -> Self {
        Nat {
            kind,
            family,
            reg_addr_min: 0,
            reg_addr_max: 0,
            reg_proto_min: 0,
            reg_proto_max: 0,
            random: false,
            fully_random: false,
            persistent: false,
        }
    }

    fn flag_names(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.random {
            flags.push("random");
        }
        if self.fully_random {
            flags.push("fully-random");
        }
        if self.persistent {
            flags.push("persistent");
        }
        flags
    }

    fn family_word(&self) -> Option<&'static str> {
        match self.family {
            ProtocolFamily::Ipv4 => Some("ip"),
            ProtocolFamily::Ipv6 => Some("ip6"),
            _ => None,
        }
    }

    /// The rendered address (or address range), empty when no address
    /// register is in play.
    fn addr_text(&self, ctx: &EncodeCtx) -> Result<String, FormatError> {
        let mut addr = String::new();
        if self.reg_addr_min != 0 {
            let min = ctx.regs.load(self.reg_addr_min)?;
            addr = bracket_v6(reg_addr(min), self.family);
        }
        if self.reg_addr_max != 0 && self.reg_addr_max != self.reg_addr_min {
            let max = ctx.regs.load(self.reg_addr_max)?;
            let max = bracket_v6(reg_addr(max), self.family);
            if addr.is_empty() {
                addr = max;
            } else if !max.is_empty() {
                addr = format!("{}-{}", addr, max);
            }
        }
        Ok(addr)
    }

    fn port_text(&self, ctx: &EncodeCtx) -> Result<String, FormatError> {
        let mut port = String::new();
        if self.reg_proto_min != 0 {
            port = reg_port(ctx.regs.load(self.reg_proto_min)?);
        }
        if self.reg_proto_max != 0 && self.reg_proto_max != self.reg_proto_min {
            let max = reg_port(ctx.regs.load(self.reg_proto_max)?);
            if port.is_empty() {
                port = max;
            } else if !max.is_empty() {
                port = format!("{}-{}", port, max);
            }
        }
        Ok(port)
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        Ok(Some(Ir::Nat {
            kind: self.kind,
            family: self.family_word(),
            addr: self.addr_text(ctx)?,
            port: self.port_text(ctx)?,
            flags: self.flag_names(),
        }))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let mut body = serde_json::Map::new();

        if let Some(fam) = self.family_word() {
            body.insert("family".to_string(), json!(fam));
        }

        let mut addr = Value::Null;
        if self.reg_addr_min != 0 {
            addr = ctx.regs.load(self.reg_addr_min)?.json.clone();
        }
        if self.reg_addr_max != 0 && self.reg_addr_max != self.reg_addr_min {
            let max = ctx.regs.load(self.reg_addr_max)?.json.clone();
            addr = if addr.is_null() {
                max
            } else {
                json!({ "range": [addr, max] })
            };
        }
        if !addr.is_null() {
            body.insert("addr".to_string(), addr);
        }

        let mut port = Value::Null;
        if self.reg_proto_min != 0 {
            port = ctx.regs.load(self.reg_proto_min)?.json.clone();
        }
        if self.reg_proto_max != 0 && self.reg_proto_max != self.reg_proto_min {
            let max = ctx.regs.load(self.reg_proto_max)?.json.clone();
            port = if port.is_null() {
                max
            } else {
                json!({ "range": [port, max] })
            };
        }
        if !port.is_null() {
            body.insert("port".to_string(), port);
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

        let mut nat = serde_json::Map::new();
        nat.insert(self.kind.name().to_string(), Value::Object(body));
        Ok(Some(Value::Object(nat)))
    }
}
