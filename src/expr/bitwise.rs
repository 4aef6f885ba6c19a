use serde_json::{json, Value};

use crate::bytes::{json_uint, RawBytes};
use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue, REG_VERDICT};
use crate::ir::Ir;

/// A bitwise expression masks a register and optionally flips bits in it:
/// `dreg = (sreg & mask) ^ xor`. Never a statement of its own, it narrows
/// the value a following comparison or lookup consumes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bitwise {
    pub sreg: u32,
    pub dreg: u32,
    /// Operand width in bytes.
    pub len: u32,
    pub mask: Vec<u8>,
    pub xor: Vec<u8>,
}

impl Bitwise {
    /// Returns a new `Bitwise` on register 1 that first masks the value
    /// it's applied to with `mask` and then performs xor with the value in
    /// `xor`.
    pub fn new(mask: impl Into<Vec<u8>>, xor: impl Into<Vec<u8>>) -> Self {
        let mask = mask.into();
        let xor = xor.into();
        let len = mask.len() as u32;
        Bitwise {
            sreg: 1,
            dreg: 1,
            len,
            mask,
            xor,
        }
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        if self.dreg == REG_VERDICT {
            return Err(FormatError::VerdictRegisterWrite);
        }
        let src = ctx.regs.load(self.sreg)?.clone();

        let (mask, xor, or) = canonicalize(
            RawBytes(&self.mask).to_u128(),
            RawBytes(&self.xor).to_u128(),
            self.len,
        );

        let human = match &src.origin {
            // a mask over a conntrack bitfield names the matched values
            RegOrigin::Ct(key) => format!("{} {}", src.human, key.decode(&self.mask)),
            // a mask over a payload shifts into sub-byte header fields
            RegOrigin::Payload { base, offset, len } => {
                let payload = super::Payload {
                    base: *base,
                    offset: *offset,
                    len: *len,
                    dreg: 0,
                    sreg: 0,
                };
                payload.key_with_mask(ctx, &self.mask)
            }
            _ => infix_expr(&src.human, mask, xor, or, self.len),
        };

        ctx.regs.store(
            self.dreg,
            RegValue {
                human,
                len: src.len,
                origin: RegOrigin::Bitwise,
                ..Default::default()
            },
        )?;
        Ok(None)
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        if self.dreg == REG_VERDICT {
            return Err(FormatError::VerdictRegisterWrite);
        }
        let src = ctx.regs.load(self.sreg)?.clone();

        let (mask, xor, or) = canonicalize(
            RawBytes(&self.mask).to_u128(),
            RawBytes(&self.xor).to_u128(),
            self.len,
        );

        let mut exp = src.json;
        if !is_full_mask(mask, self.len) {
            exp = json!({ "op": "&", "left": exp, "right": json_uint(mask) });
        }
        if xor != 0 {
            exp = json!({ "op": "^", "left": exp, "right": json_uint(xor) });
        }
        if or != 0 {
            exp = json!({ "op": "|", "left": exp, "right": json_uint(or) });
        }

        ctx.regs.store(
            self.dreg,
            RegValue {
                json: exp,
                len: src.len,
                origin: RegOrigin::Bitwise,
                ..Default::default()
            },
        )?;
        Ok(None)
    }
}

/// Right-hand side of a comparison against a masked value: consult the
/// header field the mask shifted onto, fall back to hex. A zero value
/// renders empty, leaving the match implicit (`ct state established`).
pub(crate) fn masked_cmp_rhs(ctx: &EncodeCtx, data: &[u8]) -> String {
    if let Some(field) = ctx.hdr.current_field() {
        return (field.decode)(data);
    }
    if RawBytes(data).to_u128() != 0 {
        return format!("0x{}", RawBytes(data).hex());
    }
    String::new()
}

fn is_full_mask(mask: u128, len: u32) -> bool {
    let bits = (len * 8).min(128);
    if bits == 0 {
        return false;
    }
    mask == !0u128 >> (128 - bits)
}

/// Rewrites `(x & mask) ^ xor` so that bits the mask clears but the xor
/// sets move into a separate OR term. That is the shape nft prints:
/// `x & m ^ x'` with the forced-on bits as `| o`.
fn canonicalize(mask: u128, xor: u128, len: u32) -> (u128, u128, u128) {
    if is_full_mask(mask, len) && xor == 0 {
        return (mask, xor, 0);
    }
    let or = (mask & xor) ^ xor;
    let xor = xor & mask;
    let mask = mask | or;
    (mask, xor, or)
}

/// Characters after which nft requires the accumulated expression to be
/// parenthesised before applying another operator.
fn needs_parens(s: &str) -> bool {
    s.contains(|c| matches!(c, '(' | ')' | '&' | '|' | '^' | '<' | '>' | ' '))
}

fn infix_expr(base: &str, mask: u128, xor: u128, or: u128, len: u32) -> String {
    let mut cur = base.to_string();
    if !is_full_mask(mask, len) {
        if needs_parens(&cur) {
            cur = format!("({})", cur);
        }
        cur = format!("{} & {:#x}", cur, mask);
    }
    if xor != 0 {
        if needs_parens(&cur) {
            cur = format!("({})", cur);
        }
        cur = format!("{} ^ {:#x}", cur, xor);
    }
    if or != 0 {
        if needs_parens(&cur) {
            cur = format!("({})", cur);
        }
        cur = format!("{} | {:#x}", cur, or);
    }
    cur
}

#[cfg(test)]
mod tests {
    use super::*;

    // (input & mask) ^ xor must be expressible as ((input & mask') ^ xor') | or'
    fn check(mask: u128, xor: u128, len: u32) {
        let (m, x, o) = canonicalize(mask, xor, len);
        let bits = len * 8;
        for input in [0u128, !0u128 >> (128 - bits), 0x5a, 0xff00 & (!0u128 >> (128 - bits))] {
            let want = ((input & mask) ^ xor) & (!0u128 >> (128 - bits));
            let got = (((input & m) ^ x) | o) & (!0u128 >> (128 - bits));
            assert_eq!(want, got, "mask={:#x} xor={:#x}", mask, xor);
        }
    }

    #[test]
    fn canonical_form_preserves_the_function() {
        check(0xf0, 0x00, 1);
        check(0x0f, 0xf0, 1);
        check(0xff, 0x0f, 1);
        check(0xff00, 0x00ff, 2);
        check(0x00ff, 0x0f0f, 2);
    }

    #[test]
    fn full_mask_without_xor_is_untouched() {
        assert_eq!(canonicalize(0xffff, 0, 2), (0xffff, 0, 0));
    }

    #[test]
    fn infix_rendering_parenthesises_compounds() {
        assert_eq!(infix_expr("ct mark", 0x0f, 0, 0, 4), "(ct mark) & 0xf");
        assert_eq!(
            infix_expr("mark", 0x0f, 0x03, 0, 4),
            "(mark & 0xf) ^ 0x3"
        );
    }
}
