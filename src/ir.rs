//! The intermediate nodes a rule's expression sequence collapses into. One
//! node usually stands for several low-level expressions (a payload load,
//! its bitwise mask and the final compare all end up in a single [`Ir::Cmp`]).
//! Nodes own their textual rendering; once the encode pass is over they no
//! longer reference the register file.

use std::fmt;

use crate::expr::{MetaKey, NatKind, ObjType};

/// Characters that mark the left-hand side as a computed expression, which
/// nft requires to be parenthesised before a relational operator.
fn is_expression(s: &str) -> bool {
    s.contains(|c| matches!(c, '(' | ')' | '&' | '|' | '^' | '<' | '>'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Ir {
    /// A statement that already rendered itself.
    Simple(String),
    /// A relational match. The empty operator is the implicit equality.
    Cmp {
        left: String,
        op: &'static str,
        right: String,
    },
    /// A set membership test.
    Lookup {
        left: String,
        right: String,
        invert: bool,
    },
    /// A range match (`left 1024-65535`).
    Range {
        left: String,
        op: &'static str,
        from: String,
        to: String,
    },
    Nat {
        kind: NatKind,
        family: Option<&'static str>,
        addr: String,
        port: String,
        flags: Vec<&'static str>,
    },
    Log {
        prefix: Option<String>,
        group: Option<u16>,
        snaplen: Option<u32>,
        queue_threshold: Option<u16>,
        level: Option<&'static str>,
        flags: Vec<&'static str>,
    },
    Limit {
        over: bool,
        rate: u64,
        rate_unit: Option<&'static str>,
        per: &'static str,
        burst: u64,
        burst_unit: Option<&'static str>,
    },
    Queue {
        num: u16,
        total: u16,
        flags: Vec<&'static str>,
    },
    Reject {
        with: Option<(&'static str, u8)>,
    },
    /// A metadata write (`meta nftrace set 1`).
    MetaSet { key: MetaKey, value: String },
    TProxy {
        family: Option<&'static str>,
        addr: String,
        port: String,
    },
    /// A reference to a named stateful object.
    Objref { kind: ObjType, name: String },
}

impl fmt::Display for Ir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ir::Simple(s) => f.write_str(s),

            Ir::Cmp { left, op, right } => {
                if right.is_empty() {
                    f.write_str(left)
                } else if op.is_empty() {
                    write!(f, "{} {}", left, right)
                } else {
                    write!(f, "{} {} {}", left, op, right)
                }
            }

            Ir::Lookup {
                left,
                right,
                invert,
            } => {
                if is_expression(left) {
                    let op = if *invert { "!=" } else { "==" };
                    write!(f, "({}) {} {}", left, op, right)
                } else {
                    write!(f, "{} {}", left, right)
                }
            }

            Ir::Range { left, op, from, to } => {
                if op.is_empty() {
                    write!(f, "{} {}-{}", left, from, to)
                } else {
                    write!(f, "{} {} {}-{}", left, op, from, to)
                }
            }

            Ir::Nat {
                kind,
                family,
                addr,
                port,
                flags,
            } => {
                f.write_str(kind.name())?;
                if !addr.is_empty() || !port.is_empty() {
                    if let Some(fam) = family {
                        write!(f, " {}", fam)?;
                    }
                    f.write_str(" to")?;
                }
                if !addr.is_empty() {
                    write!(f, " {}", addr)?;
                }
                if !port.is_empty() {
                    if addr.is_empty() {
                        f.write_str(" ")?;
                    }
                    write!(f, ":{}", port)?;
                }
                for flag in flags {
                    write!(f, " {}", flag)?;
                }
                Ok(())
            }

            Ir::Log {
                prefix,
                group,
                snaplen,
                queue_threshold,
                level,
                flags,
            } => {
                f.write_str("log")?;
                if let Some(p) = prefix {
                    write!(f, " prefix \"{}\"", p)?;
                }
                if let Some(g) = group {
                    write!(f, " group {}", g)?;
                }
                if let Some(s) = snaplen {
                    write!(f, " snaplen {}", s)?;
                }
                if let Some(q) = queue_threshold {
                    write!(f, " queue-threshold {}", q)?;
                }
                if let Some(l) = level {
                    write!(f, " level {}", l)?;
                }
                if !flags.is_empty() {
                    write!(f, " flags {}", flags.join(","))?;
                }
                Ok(())
            }

            Ir::Limit {
                over,
                rate,
                rate_unit,
                per,
                burst,
                burst_unit,
            } => {
                f.write_str("limit rate ")?;
                if *over {
                    f.write_str("over ")?;
                }
                match rate_unit {
                    // byte mode spells out the scaled unit and the period
                    Some(unit) => {
                        write!(f, "{}/{}/{}", rate, unit, per)?;
                        if let Some(burst_unit) = burst_unit {
                            write!(f, " burst {} {}", burst, burst_unit)?;
                        }
                        Ok(())
                    }
                    None => write!(f, "{}/{} burst {} packets", rate, per, burst),
                }
            }

            Ir::Queue { num, total, flags } => {
                f.write_str("queue")?;
                if !flags.is_empty() {
                    write!(f, " flags {}", flags.join(","))?;
                }
                if *total > 1 {
                    write!(f, " to {}-{}", num, num + total - 1)
                } else {
                    write!(f, " to {}", num)
                }
            }

            Ir::Reject { with } => match with {
                Some((kind, code)) => write!(f, "reject with {} {}", kind, code),
                None => f.write_str("reject"),
            },

            Ir::MetaSet { key, value } => {
                if key.is_unqualified() {
                    write!(f, "{} set {}", key, value)
                } else {
                    write!(f, "meta {} set {}", key, value)
                }
            }

            Ir::TProxy { family, addr, port } => {
                f.write_str("tproxy")?;
                if let Some(fam) = family {
                    write!(f, " {}", fam)?;
                }
                f.write_str(" to")?;
                if !addr.is_empty() {
                    write!(f, " {}", addr)?;
                }
                if !port.is_empty() {
                    if addr.is_empty() {
                        f.write_str(" ")?;
                    }
                    write!(f, ":{}", port)?;
                }
                Ok(())
            }

            Ir::Objref { kind, name } => match kind {
                ObjType::CtHelper => write!(f, "ct helper set {}", name),
                ObjType::CtTimeout => write!(f, "ct timeout set {}", name),
                ObjType::CtExpect => write!(f, "ct expectation set {}", name),
                ObjType::SecMark => write!(f, "meta secmark set {}", name),
                other => write!(f, "{} name {}", other, name),
            },
        }
    }
}
