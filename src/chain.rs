use std::fmt;

use crate::ProtocolFamily;

/// A base chain type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ChainType {
    Filter,
    Route,
    Nat,
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChainType::Filter => "filter",
            ChainType::Route => "route",
            ChainType::Nat => "nat",
        })
    }
}

/// The netfilter hook a base chain attaches to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Hook {
    PreRouting,
    In,
    Forward,
    Out,
    PostRouting,
    Ingress,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Hook::PreRouting => "prerouting",
            Hook::In => "input",
            Hook::Forward => "forward",
            Hook::Out => "output",
            Hook::PostRouting => "postrouting",
            Hook::Ingress => "ingress",
        })
    }
}

/// A chain's default verdict for packets that fell through every rule.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ChainPolicy {
    Accept,
    Drop,
}

impl fmt::Display for ChainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChainPolicy::Accept => "accept",
            ChainPolicy::Drop => "drop",
        })
    }
}

/// The standard hook priority values have names in listings; anything else
/// prints numerically.
pub(crate) fn priority_name(priority: i32) -> Option<&'static str> {
    match priority {
        i32::MIN => Some("first"),
        -400 => Some("conntrack-defrag"),
        -300 => Some("raw"),
        -225 => Some("se-linux-first"),
        -200 => Some("conntrack"),
        -150 => Some("mangle"),
        -100 => Some("dstnat"),
        0 => Some("filter"),
        50 => Some("security"),
        100 => Some("srcnat"),
        225 => Some("se-linux-last"),
        300 => Some("conntrack-helper"),
        i32::MAX => Some("last"),
        _ => None,
    }
}

/// A nftables chain. Base chains carry a type, a hook, a priority and a
/// policy; regular chains only exist as jump targets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chain {
    pub family: ProtocolFamily,
    pub table: String,
    pub name: String,
    pub handle: u64,
    pub chain_type: Option<ChainType>,
    pub hook: Option<Hook>,
    pub priority: Option<i32>,
    pub policy: Option<ChainPolicy>,
}

impl Chain {
    pub fn new(family: ProtocolFamily, table: impl Into<String>, name: impl Into<String>) -> Self {
        Chain {
            family,
            table: table.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}
