use crate::ProtocolFamily;

/// A nftables table: the top-level container for chains and sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub family: ProtocolFamily,
    pub name: String,
    pub handle: u64,
}

impl Table {
    pub fn new(family: ProtocolFamily, name: impl Into<String>) -> Self {
        Table {
            family,
            name: name.into(),
            handle: 0,
        }
    }
}
