//! Rendering helpers for the raw byte payloads carried by expressions and
//! set elements. The kernel hands every operand over as a plain byte string;
//! whether those bytes mean an integer, an interface name, an address or a
//! bitfield is only known from the context of the expression reading them.

use std::convert::{TryFrom, TryInto};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use ipnetwork::Ipv4Network;
use serde_json::Value;

/// A borrowed view over an operand's raw bytes, interpreted big-endian
/// unless stated otherwise.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct RawBytes<'a>(pub &'a [u8]);

impl<'a> RawBytes<'a> {
    /// The bytes as a big-endian unsigned integer. Operands longer than 16
    /// bytes keep their 128 low-order bits; nothing the kernel emits for a
    /// comparison is wider than an IPv6 address.
    pub fn to_u128(self) -> u128 {
        let tail = if self.0.len() > 16 {
            &self.0[self.0.len() - 16..]
        } else {
            self.0
        };
        let mut val = 0u128;
        for b in tail {
            val = (val << 8) | u128::from(*b);
        }
        val
    }

    /// The bytes as a little-endian unsigned integer, used by the conntrack
    /// keys the kernel stores in host order (mark, counters, expiration).
    pub fn le_u128(self) -> u128 {
        let head = if self.0.len() > 16 { &self.0[..16] } else { self.0 };
        let mut val = 0u128;
        for b in head.iter().rev() {
            val = (val << 8) | u128::from(*b);
        }
        val
    }

    /// Best-effort human form: the payload as a string when every byte up to
    /// trailing NUL padding is printable, the decimal integer otherwise.
    pub fn string(self) -> String {
        match self.printable() {
            Some(s) => s.to_string(),
            None => self.decimal(),
        }
    }

    /// The payload as a printable string, with trailing NUL padding removed.
    /// Interface names and set keys of string type arrive NUL-padded to
    /// their fixed field width.
    pub fn printable(self) -> Option<&'a str> {
        let s = std::str::from_utf8(self.0).ok()?;
        let trimmed = s.trim_end_matches('\0');
        if trimmed.chars().all(|c| !c.is_control()) {
            Some(trimmed)
        } else {
            None
        }
    }

    pub fn decimal(self) -> String {
        self.to_u128().to_string()
    }

    pub fn hex(self) -> String {
        format!("{:x}", self.to_u128())
    }

    /// The payload as an IP address. Only 4- and 16-byte operands are
    /// addresses; everything else is invalid for address rendering.
    pub fn ip(self) -> Option<IpAddr> {
        match self.0.len() {
            4 => {
                let octets: [u8; 4] = self.0.try_into().ok()?;
                Some(IpAddr::V4(Ipv4Addr::from(octets)))
            }
            16 => {
                let octets: [u8; 16] = self.0.try_into().ok()?;
                Some(IpAddr::V6(Ipv6Addr::from(octets)))
            }
            _ => None,
        }
    }

    /// Renders an address-typed payload. Partial-length loads of an address
    /// field compare only its leading bytes, which nft displays as a CIDR
    /// prefix (`10.0.0.0/8`). Lengths that cannot be an address fall through
    /// to hex.
    pub fn addr(self) -> String {
        if let Some(ip) = self.ip() {
            return ip.to_string();
        }
        if self.0.len() == 1 {
            // 8 is always a valid IPv4 prefix length
            let net = Ipv4Network::new(Ipv4Addr::new(self.0[0], 0, 0, 0), 8).unwrap();
            return net.to_string();
        }
        format!("0x{}", self.hex())
    }

    /// The JSON-side value: a string when printable, a number otherwise.
    pub fn json(self) -> Value {
        match self.printable() {
            Some(s) => Value::String(s.to_string()),
            None => json_uint(self.to_u128()),
        }
    }
}

/// JSON numbers wider than u64 lose nothing by being emitted as strings;
/// most parsers reject larger literals anyway.
pub(crate) fn json_uint(val: u128) -> Value {
    match u64::try_from(val) {
        Ok(v) => Value::from(v),
        Err(_) => Value::String(val.to_string()),
    }
}

/// Renders a kernel millisecond duration the way nft does: `1h2m30s`,
/// trailing zero units kept inside the largest one (`1h0m5s`).
pub(crate) fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    let secs = millis / 1000;
    let sub_millis = millis % 1000;
    let (hours, rem) = (secs / 3600, secs % 3600);
    let (mins, secs) = (rem / 60, rem % 60);

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h{}m", hours, mins));
    } else if mins > 0 {
        out.push_str(&format!("{}m", mins));
    }
    if sub_millis > 0 {
        out.push_str(&format!("{}.{:03}s", secs, sub_millis));
    } else {
        out.push_str(&format!("{}s", secs));
    }
    out
}

/// Scales a byte count down through the 1024-based units nft uses for
/// quota and byte-rate limits.
pub(crate) fn scale_bytes(mut bytes: u64) -> (u64, &'static str) {
    const UNITS: [&str; 3] = ["bytes", "kbytes", "mbytes"];
    if bytes == 0 {
        return (0, UNITS[0]);
    }
    let mut unit = 0;
    while unit < UNITS.len() - 1 && bytes % 1024 == 0 {
        bytes /= 1024;
        unit += 1;
    }
    (bytes, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_trims_nul_padding() {
        assert_eq!(RawBytes(b"eth0\0\0\0\0").string(), "eth0");
        assert_eq!(RawBytes(b"lo").string(), "lo");
    }

    #[test]
    fn unprintable_bytes_render_decimal() {
        assert_eq!(RawBytes(&[0x1f, 0x90]).string(), "8080");
        assert_eq!(RawBytes(&[0x00, 0x50]).string(), "80");
    }

    #[test]
    fn partial_address_renders_as_prefix() {
        assert_eq!(RawBytes(&[10]).addr(), "10.0.0.0/8");
        assert_eq!(RawBytes(&[192, 168, 1, 1]).addr(), "192.168.1.1");
    }

    #[test]
    fn oddly_sized_address_falls_through_to_hex() {
        assert_eq!(RawBytes(&[0xde, 0xad, 0xbe]).addr(), "0xdeadbe");
    }

    #[test]
    fn little_endian_reads_reverse_the_bytes() {
        assert_eq!(RawBytes(&[0x03, 0x00, 0x00, 0x00]).le_u128(), 3);
        assert_eq!(RawBytes(&[0x00, 0x00, 0x00, 0x03]).to_u128(), 3);
    }

    #[test]
    fn durations_render_like_nft() {
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3605)), "1h0m5s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }

    #[test]
    fn byte_rates_scale_by_1024() {
        assert_eq!(scale_bytes(512), (512, "bytes"));
        assert_eq!(scale_bytes(2048), (2, "kbytes"));
        assert_eq!(scale_bytes(3 * 1024 * 1024), (3, "mbytes"));
    }
}
