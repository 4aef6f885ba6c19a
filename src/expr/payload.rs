use serde_json::{json, Value};

use crate::bytes::RawBytes;
use crate::error::FormatError;
use crate::expr::{Cmp, EncodeCtx, RegOrigin, RegValue};
use crate::ir::Ir;
use crate::proto::{PayloadBase, BITS_PER_BYTE};

/// Payload expressions refer to data from the packet's headers: a byte
/// range at an offset within the link, network or transport header. A load
/// writes a register; a store consumes one and mangles the packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub base: PayloadBase,
    pub offset: u32,
    pub len: u32,
    pub dreg: u32,
    pub sreg: u32,
}

impl Payload {
    /// A load of `len` bytes at `offset` into the destination register.
    pub fn load(base: PayloadBase, offset: u32, len: u32, dreg: u32) -> Self {
        Payload {
            base,
            offset,
            len,
            dreg,
            sreg: 0,
        }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        let key = self.key(ctx);

        if self.dreg != 0 {
            ctx.regs.store(
                self.dreg,
                RegValue {
                    human: key,
                    len: self.len,
                    origin: self.origin(),
                    ..Default::default()
                },
            )?;
            return Ok(None);
        }

        let src = ctx.regs.load(self.sreg)?;
        Ok(Some(Ir::Simple(format!("{} set {}", key, src.human))))
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        let key = self.json_key();

        if self.dreg != 0 {
            ctx.regs
                .store(self.dreg, RegValue::json(key, self.origin()))?;
            return Ok(None);
        }

        let src = ctx.regs.load(self.sreg)?;
        Ok(Some(json!({
            "mangle": { "key": key, "value": src.json.clone() }
        })))
    }

    fn origin(&self) -> RegOrigin {
        RegOrigin::Payload {
            base: self.base,
            offset: self.offset,
            len: self.len,
        }
    }

    /// The human key for this load, e.g. `ip saddr`. Falls back to the raw
    /// `@base,offset,len` notation when the offset names no known field.
    fn key(&self, ctx: &mut EncodeCtx) -> String {
        match ctx.hdr.resolve(self.base, self.offset * BITS_PER_BYTE, false) {
            Some(key) => key,
            None => format!("@{},{},{}", self.base.name(), self.offset, self.len),
        }
    }

    /// The key for a load whose result is masked before use. Shifting the
    /// offset by the mask's trailing zero bits lands on sub-byte fields, so
    /// `payload(nh,0,1) & 0xf0` resolves to `ip version`. The header prefix
    /// is always included; the context protocol survives, the probed offset
    /// stays behind for the comparison that follows.
    pub(crate) fn key_with_mask(&self, ctx: &mut EncodeCtx, mask: &[u8]) -> String {
        let low = mask.last().copied().unwrap_or(0);
        let bit_offset = self.offset * BITS_PER_BYTE + low.trailing_zeros().min(8);

        let saved = (ctx.hdr.proto, ctx.hdr.assumed);
        let resolved = ctx.hdr.resolve(self.base, bit_offset, true);
        ctx.hdr.proto = saved.0;
        ctx.hdr.assumed = saved.1;

        match resolved {
            Some(key) => key,
            None => format!(
                "@{},{},{}/{:#x}",
                self.base.name(),
                self.offset,
                self.len,
                RawBytes(mask).to_u128()
            ),
        }
    }

    /// Left- and right-hand fragments for a comparison against this load.
    pub(crate) fn cmp_fragments(&self, ctx: &mut EncodeCtx, cmp: &Cmp) -> (String, String) {
        let left = ctx
            .hdr
            .resolve(self.base, self.offset * BITS_PER_BYTE, false)
            .unwrap_or_default();

        let right = match ctx
            .hdr
            .proto
            .and_then(|d| d.field_at(self.offset * BITS_PER_BYTE))
        {
            Some(field) => (field.decode)(&cmp.data),
            None => RawBytes(&cmp.data).string(),
        };
        (left, right)
    }

    fn json_key(&self) -> Value {
        json!({
            "payload": {
                "base": self.base.name(),
                "offset": self.offset,
                "len": self.len,
            }
        })
    }
}
