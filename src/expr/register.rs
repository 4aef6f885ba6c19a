//! The rule-scoped register file. Expressions communicate through a small
//! bank of scratch registers: loads write a register, comparisons and
//! statements consume one. The formatter mirrors that dataflow with a map
//! from register id to the partially rendered value flowing through it.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::FormatError;
use crate::expr::{ByteorderOp, CtKey, MetaKey};
use crate::proto::PayloadBase;

/// Register 0 is reserved for the packet's verdict; data expressions may
/// never write to it.
pub const REG_VERDICT: u32 = libc::NFT_REG_VERDICT as u32;

/// What kind of expression last wrote a register. Comparisons dispatch on
/// this to decode their right-hand side: a value compared against `ct state`
/// means something entirely different from the same bytes compared against
/// `tcp dport`. Only the operands needed at the read sites are carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RegOrigin {
    Immediate(Vec<u8>),
    Payload {
        base: PayloadBase,
        offset: u32,
        len: u32,
    },
    Meta(MetaKey),
    Ct(CtKey),
    Bitwise,
    Byteorder,
    Other,
}

impl Default for RegOrigin {
    fn default() -> Self {
        RegOrigin::Other
    }
}

/// The value a register currently holds, as far as formatting is concerned:
/// the human-readable fragment for the text dialect, the JSON fragment for
/// the other one, the logical byte width (used to recognise full-width
/// masks) and the origin tag.
#[derive(Debug, Clone, Default)]
pub(crate) struct RegValue {
    pub human: String,
    pub json: Value,
    pub len: u32,
    pub origin: RegOrigin,
    /// Byte-order conversion applied on the way, carried through untouched.
    pub op: Option<ByteorderOp>,
}

impl RegValue {
    pub fn text(human: impl Into<String>, origin: RegOrigin) -> Self {
        RegValue {
            human: human.into(),
            origin,
            ..Default::default()
        }
    }

    pub fn json(json: Value, origin: RegOrigin) -> Self {
        RegValue {
            json,
            origin,
            ..Default::default()
        }
    }
}

/// The register file itself. Created empty for every `format` call and
/// discarded with it; registers never carry state from one rule to the next.
#[derive(Debug, Default)]
pub(crate) struct Registers {
    slots: HashMap<u32, RegValue>,
}

impl Registers {
    pub fn new() -> Self {
        Registers::default()
    }

    /// A register that may legitimately be absent (e.g. tproxy without an
    /// address register).
    pub fn get(&self, id: u32) -> Option<&RegValue> {
        self.slots.get(&id)
    }

    /// A register an expression requires. Reading a register nothing wrote
    /// is a malformed rule.
    pub fn load(&self, id: u32) -> Result<&RegValue, FormatError> {
        self.slots.get(&id).ok_or(FormatError::EmptyRegister(id))
    }

    pub fn store(&mut self, id: u32, val: RegValue) -> Result<(), FormatError> {
        if id == REG_VERDICT {
            return Err(FormatError::VerdictRegisterWrite);
        }
        self.slots.insert(id, val);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_an_unwritten_register_fails() {
        let regs = Registers::new();
        assert!(matches!(regs.load(1), Err(FormatError::EmptyRegister(1))));
        assert!(regs.get(1).is_none());
    }

    #[test]
    fn data_writes_to_the_verdict_register_are_rejected() {
        let mut regs = Registers::new();
        let err = regs.store(REG_VERDICT, RegValue::default());
        assert!(matches!(err, Err(FormatError::VerdictRegisterWrite)));
    }

    #[test]
    fn stores_are_visible_to_later_loads() {
        let mut regs = Registers::new();
        regs.store(2, RegValue::text("ip saddr", RegOrigin::Other))
            .unwrap();
        assert_eq!(regs.load(2).unwrap().human, "ip saddr");
    }
}
