use serde_json::{json, Value};

use crate::error::FormatError;
use crate::expr::{EncodeCtx, RegOrigin, RegValue};
use crate::ir::Ir;

bitflags::bitflags! {
    /// Which packet fields feed the route lookup, NFTA_FIB_F_*.
    pub struct FibFlags: u32 {
        const SADDR = 0x01;
        const DADDR = 0x02;
        const MARK = 0x04;
        const IIF = 0x08;
        const OIF = 0x10;
    }
}

/// What a fib expression asks the routing table for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FibResult {
    Oif,
    OifName,
    AddrType,
}

impl FibResult {
    fn name(self) -> &'static str {
        match self {
            FibResult::Oif => "oif",
            FibResult::OifName => "oifname",
            FibResult::AddrType => "type",
        }
    }
}

/// A forwarding-information-base query (`fib saddr type local`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Fib {
    pub dreg: u32,
    pub result: FibResult,
    pub flags: FibFlags,
}

impl Fib {
    fn flag_names(&self) -> Vec<&'static str> {
        const NAMES: [(FibFlags, &str); 5] = [
            (FibFlags::SADDR, "saddr"),
            (FibFlags::DADDR, "daddr"),
            (FibFlags::MARK, "mark"),
            (FibFlags::IIF, "iif"),
            (FibFlags::OIF, "oif"),
        ];
        NAMES
            .iter()
            .filter(|(f, _)| self.flags.contains(*f))
            .map(|(_, n)| *n)
            .collect()
    }

    pub(crate) fn encode_text(&self, ctx: &mut EncodeCtx) -> Result<Option<Ir>, FormatError> {
        if self.dreg == 0 {
            return Err(FormatError::InvalidDestRegister(self.dreg));
        }
        let human = format!(
            "fib {} {}",
            self.flag_names().join(", "),
            self.result.name()
        );
        ctx.regs
            .store(self.dreg, RegValue::text(human, RegOrigin::Other))?;
        Ok(None)
    }

    pub(crate) fn encode_json(&self, ctx: &mut EncodeCtx) -> Result<Option<Value>, FormatError> {
        if self.dreg == 0 {
            return Err(FormatError::InvalidDestRegister(self.dreg));
        }
        let fib = json!({
            "fib": { "result": self.result.name(), "flags": self.flag_names() }
        });
        ctx.regs.store(self.dreg, RegValue::json(fib, RegOrigin::Other))?;
        Ok(None)
    }
}
