// Copyright (c) 2024 GPL lafleur@boum.org and Simon Thoby
//
// This file is free software: you may copy, redistribute and/or modify it
// under the terms of the GNU General Public License as published by the
// Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This file is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see the LICENSE file.

//! Renderer for in-kernel nf_tables rulesets. The kernel hands userspace a
//! rule as a flat, ordered sequence of virtual-machine expressions that load
//! packet data into registers, mask it, compare it and finally emit a
//! verdict. This crate walks that sequence and reassembles the high-level
//! statements a human wrote: `payload` + `bitwise` + `cmp` fuses back into
//! `ip version 4`, `meta` + `cmp` into `tcp dport 80`, `payload` + `lookup`
//! into `ip saddr @allowed`.
//!
//! Two output dialects are supported, and they aim to be byte-compatible
//! with what the stock `nft` binary prints for the same rules:
//!
//! * the textual syntax, through [`Rule::format`];
//! * the JSON statement arrays of `nft --json`, through [`Rule::to_json`].
//!
//! The crate deliberately does not speak netlink. Callers decode rules, sets
//! and chains with whatever transport they like and feed the models defined
//! here; the [`SetSource`] trait is the only hook back towards the kernel,
//! used to refresh anonymous set contents when a rule references a set this
//! process has not seen yet.
//!
//! Formatting is deterministic: a rule plus a snapshot of the set cache
//! always renders to the same line. Register and protocol-header state is
//! rule-scoped and never leaks between calls.
//!
//! [`SetSource`]: trait.SetSource.html

use thiserror::Error;

#[macro_use]
extern crate log;

use std::convert::TryFrom;

mod bytes;

pub mod error;
pub use error::FormatError;

pub mod proto;

mod ir;

mod table;
pub use table::Table;

mod chain;
pub use chain::{Chain, ChainPolicy, ChainType, Hook};

mod rule;
pub use rule::Rule;

pub mod expr;

pub mod set;
pub use set::{Set, SetCache, SetElement, SetKey, SetSource};

pub mod ruleset;

/// Denotes a protocol. Used to specify which protocol a table or rule belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash, serde::Serialize)]
#[repr(i32)]
pub enum ProtocolFamily {
    #[serde(rename = "unspec")]
    Unspec = libc::NFPROTO_UNSPEC,
    /// Inet - Means both IPv4 and IPv6
    #[serde(rename = "inet")]
    Inet = libc::NFPROTO_INET,
    #[serde(rename = "ip")]
    Ipv4 = libc::NFPROTO_IPV4,
    #[serde(rename = "arp")]
    Arp = libc::NFPROTO_ARP,
    #[serde(rename = "netdev")]
    NetDev = libc::NFPROTO_NETDEV,
    #[serde(rename = "bridge")]
    Bridge = libc::NFPROTO_BRIDGE,
    #[serde(rename = "ip6")]
    Ipv6 = libc::NFPROTO_IPV6,
    #[serde(rename = "decnet")]
    DecNet = libc::NFPROTO_DECNET,
}

impl ProtocolFamily {
    /// The family keyword as it appears in ruleset listings (`table inet filter`).
    pub fn name(self) -> &'static str {
        match self {
            ProtocolFamily::Unspec => "unspec",
            ProtocolFamily::Inet => "inet",
            ProtocolFamily::Ipv4 => "ip",
            ProtocolFamily::Arp => "arp",
            ProtocolFamily::NetDev => "netdev",
            ProtocolFamily::Bridge => "bridge",
            ProtocolFamily::Ipv6 => "ip6",
            ProtocolFamily::DecNet => "decnet",
        }
    }
}

impl Default for ProtocolFamily {
    fn default() -> Self {
        Self::Unspec
    }
}

#[derive(Error, Debug)]
#[error("Invalid value for a protocol family")]
pub struct InvalidProtocolFamily(pub i32);

impl TryFrom<i32> for ProtocolFamily {
    type Error = InvalidProtocolFamily;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            libc::NFPROTO_UNSPEC => Ok(ProtocolFamily::Unspec),
            libc::NFPROTO_INET => Ok(ProtocolFamily::Inet),
            libc::NFPROTO_IPV4 => Ok(ProtocolFamily::Ipv4),
            libc::NFPROTO_ARP => Ok(ProtocolFamily::Arp),
            libc::NFPROTO_NETDEV => Ok(ProtocolFamily::NetDev),
            libc::NFPROTO_BRIDGE => Ok(ProtocolFamily::Bridge),
            libc::NFPROTO_IPV6 => Ok(ProtocolFamily::Ipv6),
            libc::NFPROTO_DECNET => Ok(ProtocolFamily::DecNet),
            _ => Err(InvalidProtocolFamily(value)),
        }
    }
}

#[cfg(test)]
mod tests;
