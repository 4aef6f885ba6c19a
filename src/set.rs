//! Sets, their elements and the process-wide set cache. Rules only carry a
//! set's name and id; rendering `ip daddr @allowed` or the inline literal
//! `{22,80,443}` needs the set's key type and materialised elements, which
//! live here.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::bytes::RawBytes;
use crate::error::FormatError;
use crate::expr::Counter;
use crate::ProtocolFamily;

bitflags::bitflags! {
    /// Set property flags, straight from the kernel's NFT_SET_* bits.
    pub struct SetFlags: u32 {
        const ANONYMOUS = 0x1;
        const CONSTANT = 0x2;
        const INTERVAL = 0x4;
        const MAP = 0x8;
        const TIMEOUT = 0x10;
        const EVAL = 0x20;
        const OBJECT = 0x40;
        const CONCAT = 0x80;
    }
}

impl Default for SetFlags {
    fn default() -> Self {
        SetFlags::empty()
    }
}

/// The declared datatype of a set's keys. Only the classes that render
/// differently are named; everything else formats as a decimal integer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SetKeyType {
    Verdict,
    NfProto,
    Bitmask,
    Integer,
    String,
    LlAddr,
    IpAddr,
    Ip6Addr,
    EtherAddr,
    InetProto,
    InetService,
    IcmpType,
    TcpFlag,
    Mark,
    Uid,
    Gid,
    IfName,
    Other(u32),
}

impl SetKeyType {
    /// Maps the kernel's datatype magic onto a key type.
    pub fn from_magic(magic: u32) -> Self {
        match magic {
            1 => SetKeyType::Verdict,
            2 => SetKeyType::NfProto,
            3 => SetKeyType::Bitmask,
            4 => SetKeyType::Integer,
            5 => SetKeyType::String,
            6 => SetKeyType::LlAddr,
            7 => SetKeyType::IpAddr,
            8 => SetKeyType::Ip6Addr,
            9 => SetKeyType::EtherAddr,
            12 => SetKeyType::InetProto,
            13 => SetKeyType::InetService,
            14 => SetKeyType::IcmpType,
            15 => SetKeyType::TcpFlag,
            19 => SetKeyType::Mark,
            24 => SetKeyType::Uid,
            25 => SetKeyType::Gid,
            41 => SetKeyType::IfName,
            other => SetKeyType::Other(other),
        }
    }

    /// The nft name of the type, as listed in `set { type ...; }` blocks.
    pub fn name(self) -> &'static str {
        match self {
            SetKeyType::Verdict => "verdict",
            SetKeyType::NfProto => "nf_proto",
            SetKeyType::Bitmask => "bitmask",
            SetKeyType::Integer => "integer",
            SetKeyType::String => "string",
            SetKeyType::LlAddr => "ll_addr",
            SetKeyType::IpAddr => "ipv4_addr",
            SetKeyType::Ip6Addr => "ipv6_addr",
            SetKeyType::EtherAddr => "ether_addr",
            SetKeyType::InetProto => "inet_proto",
            SetKeyType::InetService => "inet_service",
            SetKeyType::IcmpType => "icmp_type",
            SetKeyType::TcpFlag => "tcp_flag",
            SetKeyType::Mark => "mark",
            SetKeyType::Uid => "uid",
            SetKeyType::Gid => "gid",
            SetKeyType::IfName => "ifname",
            SetKeyType::Other(_) => "unknown",
        }
    }

    /// String-ish keys keep their insertion order when a literal is
    /// rendered; numeric keys sort by value.
    fn is_stringish(self) -> bool {
        matches!(
            self,
            SetKeyType::Verdict | SetKeyType::String | SetKeyType::IfName
        )
    }

    fn format_key(self, key: &[u8]) -> String {
        match self {
            SetKeyType::Verdict | SetKeyType::String | SetKeyType::IfName => {
                RawBytes(key).string()
            }
            SetKeyType::IpAddr | SetKeyType::Ip6Addr => match RawBytes(key).ip() {
                Some(ip) => ip.to_string(),
                None => RawBytes(key).hex(),
            },
            SetKeyType::Bitmask
            | SetKeyType::LlAddr
            | SetKeyType::EtherAddr
            | SetKeyType::TcpFlag
            | SetKeyType::Mark
            | SetKeyType::Uid
            | SetKeyType::Gid => RawBytes(key).hex(),
            _ => RawBytes(key).decimal(),
        }
    }
}

impl Default for SetKeyType {
    fn default() -> Self {
        SetKeyType::Integer
    }
}

/// One element of a materialised set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetElement {
    pub key: Vec<u8>,
    /// Exclusive upper bound of a preceding range element.
    pub key_end: Option<Vec<u8>>,
    /// Mapped value, for map sets.
    pub data: Option<Vec<u8>>,
    /// Marks the sentinel closing an interval; hidden when rendering.
    pub interval_end: bool,
    pub timeout: Option<Duration>,
    pub expires: Option<Duration>,
    pub counter: Option<Counter>,
}

impl SetElement {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        SetElement {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn interval_end(key: impl Into<Vec<u8>>) -> Self {
        SetElement {
            key: key.into(),
            interval_end: true,
            ..Default::default()
        }
    }
}

/// A set descriptor plus its elements, as decoded from the kernel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Set {
    pub family: ProtocolFamily,
    pub table: String,
    pub name: String,
    pub id: u32,
    pub key_type: SetKeyType,
    pub key_len: u32,
    pub flags: SetFlags,
    pub elements: Vec<SetElement>,
}

impl Set {
    pub fn is_anonymous(&self) -> bool {
        self.flags.contains(SetFlags::ANONYMOUS)
    }

    /// How the set appears inside a rule: named sets by reference,
    /// anonymous sets as an inline literal.
    pub fn render(&self) -> String {
        if !self.is_anonymous() {
            return format!("@{}", self.name);
        }
        format!("{{{}}}", self.element_list().join(","))
    }

    /// The element list in display order: interval-end sentinels dropped,
    /// numeric keys sorted ascending, string-ish keys in insertion order.
    pub fn element_list(&self) -> Vec<String> {
        let mut elems: Vec<&SetElement> =
            self.elements.iter().filter(|e| !e.interval_end).collect();
        if !self.key_type.is_stringish() {
            elems.sort_by_key(|e| RawBytes(&e.key).to_u128());
        }
        elems
            .iter()
            .map(|e| self.key_type.format_key(&e.key))
            .collect()
    }

    /// The set property flags as nft keywords.
    pub fn flag_names(&self) -> Vec<&'static str> {
        const NAMES: [(SetFlags, &str); 6] = [
            (SetFlags::CONSTANT, "constant"),
            (SetFlags::ANONYMOUS, "anonymous"),
            (SetFlags::INTERVAL, "interval"),
            (SetFlags::MAP, "map"),
            (SetFlags::TIMEOUT, "timeout"),
            (SetFlags::CONCAT, "concatenation"),
        ];
        NAMES
            .iter()
            .filter(|(f, _)| self.flags.contains(*f))
            .map(|(_, n)| *n)
            .collect()
    }
}

/// Cache key: a set is identified by its owning table, its name and the
/// kernel-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetKey {
    pub table: String,
    pub name: String,
    pub id: u32,
}

/// The collaborator that can fetch a table's sets from the kernel. The
/// crate itself never opens a netlink socket; callers plug their transport
/// in through this trait.
pub trait SetSource: Send + Sync {
    fn sets_for_table(
        &self,
        table: &str,
        family: ProtocolFamily,
    ) -> Result<Vec<Set>, Box<dyn std::error::Error + Send + Sync>>;
}

/// A concurrent map from set identity to descriptor, shared by all format
/// calls. Readers see a complete descriptor or none at all; a miss triggers
/// at most one refresh of the owning table before the rule fails.
pub struct SetCache {
    entries: RwLock<HashMap<SetKey, Arc<Set>>>,
    source: Option<Box<dyn SetSource>>,
}

impl SetCache {
    /// A cache without a kernel transport; misses become errors after the
    /// (no-op) refresh. Useful for tests and for callers that pre-populate.
    pub fn new() -> Self {
        SetCache {
            entries: RwLock::new(HashMap::new()),
            source: None,
        }
    }

    /// A cache that refreshes through the given source on a miss.
    pub fn with_source(source: Box<dyn SetSource>) -> Self {
        SetCache {
            entries: RwLock::new(HashMap::new()),
            source: Some(source),
        }
    }

    pub fn insert(&self, set: Set) {
        let key = SetKey {
            table: set.table.clone(),
            name: set.name.clone(),
            id: set.id,
        };
        self.entries.write().unwrap().insert(key, Arc::new(set));
    }

    pub fn get(&self, key: &SetKey) -> Option<Arc<Set>> {
        self.entries.read().unwrap().get(key).cloned()
    }

    /// Re-fetches every set of the table through the source, replacing
    /// cached descriptors wholesale.
    pub fn refresh_from_table(
        &self,
        table: &str,
        family: ProtocolFamily,
    ) -> Result<(), FormatError> {
        let source = match &self.source {
            Some(s) => s,
            None => return Ok(()),
        };
        debug!("refreshing set cache for table '{}'", table);
        let sets = source
            .sets_for_table(table, family)
            .map_err(FormatError::SetRefresh)?;
        let mut entries = self.entries.write().unwrap();
        for set in sets {
            let key = SetKey {
                table: set.table.clone(),
                name: set.name.clone(),
                id: set.id,
            };
            entries.insert(key, Arc::new(set));
        }
        Ok(())
    }

    /// A lookup with the single refresh retry the formatter is allowed.
    pub(crate) fn resolve(
        &self,
        table: &str,
        family: ProtocolFamily,
        name: &str,
        id: u32,
    ) -> Result<Arc<Set>, FormatError> {
        let key = SetKey {
            table: table.to_string(),
            name: name.to_string(),
            id,
        };
        if let Some(set) = self.get(&key) {
            return Ok(set);
        }
        self.refresh_from_table(table, family)?;
        self.get(&key).ok_or_else(|| FormatError::SetNotFound {
            table: table.to_string(),
            name: name.to_string(),
        })
    }
}

impl Default for SetCache {
    fn default() -> Self {
        SetCache::new()
    }
}
