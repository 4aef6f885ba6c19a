use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue};
use crate::ir::Ir;

/// NFT_EXTHDR_F_PRESENT: test for the option's presence instead of loading
/// its bytes.
pub const EXTHDR_F_PRESENT: u32 = 1;

/// Which option space an exthdr expression walks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExthdrOp {
    /// IPv6 extension headers.
    Ipv6,
    /// TCP options.
    TcpOpt,
    /// IPv4 options.
    IpV4,
}

impl ExthdrOp {
    fn keyword(self) -> &'static str {
        match self {
            ExthdrOp::TcpOpt => "tcp option",
            ExthdrOp::Ipv6 => "ip option",
            ExthdrOp::IpV4 => "exthdr",
        }
    }
}

/// An extension-header expression: loads, rewrites or strips an IPv6
/// extension header or TCP option.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Exthdr {
    pub op: ExthdrOp,
    /// Option/extension type number.
    pub typ: u8,
    pub offset: u32,
    pub len: u32,
    pub flags: u32,
    pub dreg: u32,
    pub sreg: u32,
}

impl Exthdr {
    fn keyword(&self) -> String {
        if self.offset == 0 && self.flags == EXTHDR_F_PRESENT {
            format!("{} {}", self.op.keyword(), self.typ)
        } else {
            format!(
                "{} @{},{},{}",
                self.op.keyword(),
                self.typ,
                self.offset,
                self.len
            )
        }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let keyword = self.keyword();

        if self.dreg != 0 {
            ctx.regs
                .store(self.dreg, RegValue::text(keyword, RegOrigin::Other))?;
            return Ok(None);
        }
        if self.sreg != 0 {
            let src = ctx.regs.load(self.sreg)?;
            return Ok(Some(Ir::Simple(format!("{} set {}", keyword, src.human))));
        }
        Ok(Some(Ir::Simple(format!("reset {}", keyword))))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let mut hdr = serde_json::Map::new();
        hdr.insert(
            self.op.keyword().to_string(),
            json!({ "base": self.typ, "offset": self.offset, "len": self.len }),
        );
        let hdr = Value::Object(hdr);

        if self.dreg != 0 {
            ctx.regs
                .store(self.dreg, RegValue::json(hdr, RegOrigin::Other))?;
            return Ok(None);
        }
        if self.sreg != 0 {
            let src = ctx.regs.load(self.sreg)?;
            return Ok(Some(json!({
                "mangle": { "key": hdr, "value": src.json.clone() }
            })));
        }
        Ok(Some(hdr))
    }
}
