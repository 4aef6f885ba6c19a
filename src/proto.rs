//! Static protocol-header descriptions driving symbolic decoding of payload
//! expressions. For every header the formatter can name, the table maps a
//! bit offset inside that header onto the nft field keyword and a decoder
//! turning the compared bytes into the nft vocabulary (`tcp`, `echo-reply`,
//! `af11`, `10.0.0.0/8`, ...).
//!
//! Offsets follow the kernel's little-endian bitfield layout for sub-byte
//! fields, which is why the IPv4 version nibble lives at bit 4 and the
//! header length nibble at bit 0.

use crate::bytes::RawBytes;

pub(crate) const BITS_PER_BYTE: u32 = 8;
const BITS_PER_HALF_BYTE: u32 = 4;

/// Which packet header a payload expression indexes into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PayloadBase {
    /// Link layer, e.g. the Ethernet header.
    LinkLayer,
    /// Network layer, e.g. the IPv4 or IPv6 header.
    Network,
    /// Transport layer, e.g. the TCP or UDP header.
    Transport,
}

impl PayloadBase {
    pub fn name(self) -> &'static str {
        match self {
            PayloadBase::LinkLayer => "ll",
            PayloadBase::Network => "nh",
            PayloadBase::Transport => "th",
        }
    }
}

/// One named field of a protocol header, with its decoder for right-hand
/// sides of comparisons against that field.
pub struct ProtoField {
    pub name: &'static str,
    pub decode: fn(&[u8]) -> String,
}

/// A protocol header description: its nft name, its IANA protocol number
/// and the offset table of its fields.
pub struct ProtoDesc {
    pub name: &'static str,
    pub id: u8,
    pub base: PayloadBase,
    fields: &'static [(u32, ProtoField)],
}

impl ProtoDesc {
    pub fn field_at(&self, bit_offset: u32) -> Option<&'static ProtoField> {
        self.fields
            .iter()
            .find(|(off, _)| *off == bit_offset)
            .map(|(_, f)| f)
    }
}

fn dec(b: &[u8]) -> String {
    RawBytes(b).decimal()
}

fn hex(b: &[u8]) -> String {
    format!("0x{}", RawBytes(b).hex())
}

fn addr(b: &[u8]) -> String {
    RawBytes(b).addr()
}

fn ip_version(b: &[u8]) -> String {
    ((RawBytes(b).to_u128() >> 4) & 0xf).to_string()
}

pub static IP4: ProtoDesc = ProtoDesc {
    name: "ip",
    id: libc::IPPROTO_IP as u8,
    base: PayloadBase::Network,
    fields: &[
        (0, ProtoField { name: "hdrlength", decode: dec }),
        (BITS_PER_HALF_BYTE, ProtoField { name: "version", decode: ip_version }),
        (8, ProtoField { name: "ecn", decode: ecn }),
        (12, ProtoField { name: "dscp", decode: dscp }),
        (16, ProtoField { name: "length", decode: dec }),
        (4 * BITS_PER_BYTE, ProtoField { name: "id", decode: dec }),
        (6 * BITS_PER_BYTE, ProtoField { name: "frag-off", decode: hex }),
        (8 * BITS_PER_BYTE, ProtoField { name: "ttl", decode: dec }),
        (9 * BITS_PER_BYTE, ProtoField { name: "protocol", decode: proto_field }),
        (10 * BITS_PER_BYTE, ProtoField { name: "checksum", decode: dec }),
        (12 * BITS_PER_BYTE, ProtoField { name: "saddr", decode: addr }),
        (16 * BITS_PER_BYTE, ProtoField { name: "daddr", decode: addr }),
    ],
};

pub static IP6: ProtoDesc = ProtoDesc {
    name: "ip6",
    id: libc::IPPROTO_IPV6 as u8,
    base: PayloadBase::Network,
    fields: &[
        (0, ProtoField { name: "version", decode: dec }),
        (BITS_PER_BYTE, ProtoField { name: "flowlabel", decode: dec }),
        (4 * BITS_PER_BYTE, ProtoField { name: "length", decode: dec }),
        (6 * BITS_PER_BYTE, ProtoField { name: "nexthdr", decode: dec }),
        (7 * BITS_PER_BYTE, ProtoField { name: "hoplimit", decode: dec }),
        (8 * BITS_PER_BYTE, ProtoField { name: "saddr", decode: addr }),
        (24 * BITS_PER_BYTE, ProtoField { name: "daddr", decode: addr }),
    ],
};

pub static TCP: ProtoDesc = ProtoDesc {
    name: "tcp",
    id: libc::IPPROTO_TCP as u8,
    base: PayloadBase::Transport,
    fields: &[
        (0, ProtoField { name: "sport", decode: dec }),
        (2 * BITS_PER_BYTE, ProtoField { name: "dport", decode: dec }),
        (4 * BITS_PER_BYTE, ProtoField { name: "sequence", decode: dec }),
        (8 * BITS_PER_BYTE, ProtoField { name: "ackseq", decode: dec }),
        (12 * BITS_PER_BYTE, ProtoField { name: "reserved", decode: dec }),
        (12 * BITS_PER_BYTE + BITS_PER_HALF_BYTE, ProtoField { name: "doff", decode: dec }),
        (13 * BITS_PER_BYTE, ProtoField { name: "flags", decode: tcp_flags }),
        (14 * BITS_PER_BYTE, ProtoField { name: "window", decode: dec }),
        (16 * BITS_PER_BYTE, ProtoField { name: "checksum", decode: dec }),
        (18 * BITS_PER_BYTE, ProtoField { name: "urgptr", decode: dec }),
    ],
};

pub static UDP: ProtoDesc = ProtoDesc {
    name: "udp",
    id: libc::IPPROTO_UDP as u8,
    base: PayloadBase::Transport,
    fields: &[
        (0, ProtoField { name: "sport", decode: dec }),
        (2 * BITS_PER_BYTE, ProtoField { name: "dport", decode: dec }),
        (4 * BITS_PER_BYTE, ProtoField { name: "length", decode: dec }),
        (6 * BITS_PER_BYTE, ProtoField { name: "checksum", decode: dec }),
    ],
};

pub static ICMP: ProtoDesc = ProtoDesc {
    name: "icmp",
    id: libc::IPPROTO_ICMP as u8,
    base: PayloadBase::Transport,
    fields: &[
        (0, ProtoField { name: "type", decode: icmp_type }),
        (BITS_PER_BYTE, ProtoField { name: "code", decode: icmp_code }),
        (2 * BITS_PER_BYTE, ProtoField { name: "checksum", decode: dec }),
        (4 * BITS_PER_BYTE, ProtoField { name: "id", decode: dec }),
        (6 * BITS_PER_BYTE, ProtoField { name: "sequence", decode: dec }),
        (8 * BITS_PER_BYTE, ProtoField { name: "gateway", decode: dec }),
        (14 * BITS_PER_BYTE, ProtoField { name: "mtu", decode: dec }),
    ],
};

pub static ICMP6: ProtoDesc = ProtoDesc {
    name: "icmpv6",
    id: libc::IPPROTO_ICMPV6 as u8,
    base: PayloadBase::Transport,
    fields: &[
        (0, ProtoField { name: "type", decode: icmp6_type }),
        (BITS_PER_BYTE, ProtoField { name: "code", decode: icmp6_code }),
        (2 * BITS_PER_BYTE, ProtoField { name: "checksum", decode: dec }),
        (4 * BITS_PER_BYTE, ProtoField { name: "parameter-problem", decode: dec }),
        (8 * BITS_PER_BYTE, ProtoField { name: "mtu", decode: dec }),
    ],
};

/// The protocol-agnostic transport header: only the port pair is known.
pub static TH: ProtoDesc = ProtoDesc {
    name: "th",
    id: 255,
    base: PayloadBase::Transport,
    fields: &[
        (0, ProtoField { name: "sport", decode: dec }),
        (2 * BITS_PER_BYTE, ProtoField { name: "dport", decode: dec }),
    ],
};

/// Resolves a transport-layer protocol number to its header description.
pub fn transport(proto: u8) -> Option<&'static ProtoDesc> {
    match i32::from(proto) {
        libc::IPPROTO_ICMP => Some(&ICMP),
        libc::IPPROTO_ICMPV6 => Some(&ICMP6),
        libc::IPPROTO_TCP => Some(&TCP),
        libc::IPPROTO_UDP => Some(&UDP),
        _ => None,
    }
}

/// The nft keyword for an IP protocol number.
pub fn proto_name(proto: u8) -> &'static str {
    match i32::from(proto) {
        libc::IPPROTO_IP => "ip",
        libc::IPPROTO_IPV6 => "ip6",
        libc::IPPROTO_ICMP => "icmp",
        libc::IPPROTO_ICMPV6 => "icmp6",
        libc::IPPROTO_IGMP => "igmp",
        libc::IPPROTO_EGP => "egp",
        libc::IPPROTO_PUP => "pup",
        libc::IPPROTO_TCP => "tcp",
        libc::IPPROTO_UDP => "udp",
        libc::IPPROTO_UDPLITE => "udplite",
        libc::IPPROTO_ESP => "esp",
        libc::IPPROTO_AH => "ah",
        libc::IPPROTO_COMP => "comp",
        libc::IPPROTO_DCCP => "dccp",
        libc::IPPROTO_SCTP => "sctp",
        _ => "unknown",
    }
}

fn proto_field(b: &[u8]) -> String {
    proto_name(RawBytes(b).to_u128() as u8).to_string()
}

/// The nft keyword for a netfilter protocol family byte (`meta nfproto`,
/// `ct l3proto`).
pub fn nfproto_name(family: u8) -> &'static str {
    match i32::from(family) {
        libc::NFPROTO_IPV4 => "ipv4",
        libc::NFPROTO_IPV6 => "ipv6",
        _ => "unknown",
    }
}

fn icmp_type(b: &[u8]) -> String {
    let name = match RawBytes(b).to_u128() {
        0 => "echo-reply",
        3 => "destination-unreachable",
        4 => "source-quench",
        5 => "redirect",
        8 => "echo-request",
        9 => "router-advertisement",
        10 => "router-solicitation",
        11 => "time-exceeded",
        12 => "parameter-problem",
        13 => "timestamp-request",
        14 => "timestamp-reply",
        15 => "info-request",
        16 => "info-reply",
        17 => "address-mask-request",
        18 => "address-mask-reply",
        _ => "unknown",
    };
    name.to_string()
}

fn icmp_code(b: &[u8]) -> String {
    let name = match RawBytes(b).to_u128() {
        0 => "net-unreachable",
        1 => "host-unreachable",
        2 => "prot-unreachable",
        3 => "port-unreachable",
        4 => "frag-needed",
        9 => "net-prohibited",
        10 => "host-prohibited",
        13 => "admin-prohibited",
        _ => "unknown",
    };
    name.to_string()
}

fn icmp6_type(b: &[u8]) -> String {
    let name = match RawBytes(b).to_u128() {
        1 => "destination-unreachable",
        2 => "packet-too-big",
        3 => "time-exceeded",
        4 => "parameter-problem",
        128 => "echo-request",
        129 => "echo-reply",
        130 => "mld-listener-query",
        131 => "mld-listener-report",
        132 => "mld-listener-reduction",
        133 => "nd-router-solicit",
        134 => "nd-router-advert",
        135 => "nd-neighbor-solicit",
        136 => "nd-neighbor-advert",
        137 => "nd-redirect",
        138 => "router-renumbering",
        141 => "ind-neighbor-solicit",
        142 => "ind-neighbor-advert",
        143 => "mld2-listener-report",
        _ => "unknown",
    };
    name.to_string()
}

fn icmp6_code(b: &[u8]) -> String {
    let name = match RawBytes(b).to_u128() {
        0 => "no-route",
        1 => "admin-prohibited",
        3 => "addr-unreachable",
        4 => "port-unreachable",
        5 => "policy-fail",
        6 => "reject-route",
        _ => "unknown",
    };
    name.to_string()
}

bitflags::bitflags! {
    pub struct TcpFlags: u8 {
        const FIN = 0x01;
        const SYN = 0x02;
        const RST = 0x04;
        const PSH = 0x08;
        const ACK = 0x10;
        const URG = 0x20;
        const ECN = 0x40;
        const CWR = 0x80;
    }
}

pub(crate) fn tcp_flags(b: &[u8]) -> String {
    const NAMES: [(TcpFlags, &str); 8] = [
        (TcpFlags::FIN, "fin"),
        (TcpFlags::SYN, "syn"),
        (TcpFlags::RST, "rst"),
        (TcpFlags::PSH, "psh"),
        (TcpFlags::ACK, "ack"),
        (TcpFlags::URG, "urg"),
        (TcpFlags::ECN, "ecn"),
        (TcpFlags::CWR, "cwr"),
    ];
    let flags = TcpFlags::from_bits_truncate(RawBytes(b).to_u128() as u8);
    let names: Vec<&str> = NAMES
        .iter()
        .filter(|(f, _)| flags.contains(*f))
        .map(|(_, n)| *n)
        .collect();
    names.join(",")
}

fn dscp(b: &[u8]) -> String {
    match RawBytes(b).to_u128() {
        0x00 => "cs0".to_string(),
        0x08 => "cs1".to_string(),
        0x10 => "cs2".to_string(),
        0x18 => "cs3".to_string(),
        0x20 => "cs4".to_string(),
        0x28 => "cs5".to_string(),
        0x30 => "cs6".to_string(),
        0x38 => "cs7".to_string(),
        0x01 => "lephb".to_string(),
        0x0a => "af11".to_string(),
        0x0c => "af12".to_string(),
        0x0e => "af13".to_string(),
        0x12 => "af21".to_string(),
        0x14 => "af22".to_string(),
        0x16 => "af23".to_string(),
        0x1a => "af31".to_string(),
        0x1c => "af32".to_string(),
        0x1e => "af33".to_string(),
        0x22 => "af41".to_string(),
        0x24 => "af42".to_string(),
        0x26 => "af43".to_string(),
        0x2c => "va".to_string(),
        0x2e => "ef".to_string(),
        other => other.to_string(),
    }
}

fn ecn(b: &[u8]) -> String {
    let name = match RawBytes(b).to_u128() & 0x3 {
        0 => "not-ect",
        1 => "ect1",
        2 => "ect0",
        _ => "ce",
    };
    name.to_string()
}

/// The protocol header the rule is currently matching inside, threaded
/// through the per-rule encode pass. A payload or meta comparison that pins
/// down the protocol switches the context; subsequent payload reads then
/// resolve their offsets against that header's field table.
pub(crate) struct HeaderCtx {
    pub proto: Option<&'static ProtoDesc>,
    /// The context was established by base-layer fallback rather than an
    /// actual protocol match. Assumed headers keep their name prefix, a
    /// pinned transport header drops it (`meta l4proto tcp dport 80`).
    pub assumed: bool,
    /// Bit offset of the last resolved field, consulted when a bitwise
    /// result is compared and the field has to be recovered from context.
    pub offset: u32,
}

impl HeaderCtx {
    pub fn new() -> Self {
        HeaderCtx {
            proto: None,
            assumed: false,
            offset: 0,
        }
    }

    /// Pins the context to a header named by an explicit protocol match.
    pub fn pin(&mut self, proto: &'static ProtoDesc) {
        self.proto = Some(proto);
        self.assumed = false;
    }

    /// Translates a bit offset into a field description, preferring the
    /// header the rule is already inside and falling back to the default
    /// header of the payload base. The returned key carries the header name
    /// prefix when `force_prefix` is set, when the header is merely
    /// assumed, or for network headers, which nft always qualifies.
    pub fn resolve(
        &mut self,
        base: PayloadBase,
        bit_offset: u32,
        force_prefix: bool,
    ) -> Option<String> {
        if let Some(desc) = self.proto {
            if let Some(field) = desc.field_at(bit_offset) {
                self.offset = bit_offset;
                if force_prefix || self.assumed || desc.base == PayloadBase::Network {
                    return Some(format!("{} {}", desc.name, field.name));
                }
                return Some(field.name.to_string());
            }
        }

        let desc = match base {
            PayloadBase::Network => &IP4,
            // With no protocol pinned down yet, resolve through the TCP
            // table: it covers the generic port pair and matches what nft
            // prints for unqualified transport matches.
            PayloadBase::Transport => &TCP,
            PayloadBase::LinkLayer => return None,
        };
        let field = desc.field_at(bit_offset)?;
        self.proto = Some(desc);
        self.assumed = true;
        self.offset = bit_offset;
        Some(format!("{} {}", desc.name, field.name))
    }

    /// The field description at the remembered context offset, if any.
    pub fn current_field(&self) -> Option<&'static ProtoField> {
        self.proto.and_then(|d| d.field_at(self.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_offsets_resolve_ip_fields() {
        let mut ctx = HeaderCtx::new();
        assert_eq!(
            ctx.resolve(PayloadBase::Network, 12 * BITS_PER_BYTE, false),
            Some("ip saddr".to_string())
        );
        // the fallback pinned the context to the IPv4 header
        assert_eq!(ctx.proto.map(|p| p.name), Some("ip"));
    }

    #[test]
    fn context_header_wins_over_the_fallback() {
        let mut ctx = HeaderCtx::new();
        ctx.proto = Some(&UDP);
        assert_eq!(
            ctx.resolve(PayloadBase::Transport, 2 * BITS_PER_BYTE, false),
            Some("dport".to_string())
        );
    }

    #[test]
    fn unqualified_transport_match_uses_tcp_names() {
        let mut ctx = HeaderCtx::new();
        assert_eq!(
            ctx.resolve(PayloadBase::Transport, 2 * BITS_PER_BYTE, false),
            Some("tcp dport".to_string())
        );
    }

    #[test]
    fn unknown_offsets_do_not_resolve() {
        let mut ctx = HeaderCtx::new();
        assert_eq!(ctx.resolve(PayloadBase::Network, 999, false), None);
        assert_eq!(ctx.resolve(PayloadBase::LinkLayer, 0, false), None);
    }

    #[test]
    fn tcp_flag_bytes_join_with_commas() {
        assert_eq!(tcp_flags(&[0x12]), "syn,ack");
        assert_eq!(tcp_flags(&[0x01]), "fin");
    }
}
