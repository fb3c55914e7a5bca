//! Address value types used by the rule IR
//!
//! [`Ipv4Address`] and [`Ipv4Prefix`] validate dotted-quad literals and convert
//! between prefix lengths and dotted netmasks. [`MacAddress`] carries the
//! Ethernet addresses used by the switch and controller backends.
//!
//! # Example
//!
//! ```
//! use flowgen::core::address::{Ipv4Address, Ipv4Prefix};
//!
//! let prefix: Ipv4Prefix = "192.168.1.0/24".parse().unwrap();
//! assert_eq!(prefix.netmask().to_string(), "255.255.255.0");
//! assert_eq!(Ipv4Address::netmask(24).unwrap().prefix_len(), Some(24));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("'{0}' is not a dotted-quad IPv4 address")]
    Syntax(String),

    #[error("prefix length '{0}' is not in 0..=32")]
    PrefixLength(String),

    #[error("'{0}' has host bits set outside its prefix")]
    HostBitsSet(String),

    #[error("'{0}' is not a MAC address")]
    Mac(String),
}

/// An IPv4 address stored in host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Address(u32);

impl Ipv4Address {
    pub const BROADCAST: Self = Self(u32::MAX);

    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self(u32::from_be_bytes([a, b, c, d]))
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u32 {
        self.0
    }

    pub const fn octets(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Builds the dotted netmask for a prefix length (`24` → `255.255.255.0`).
    pub fn netmask(prefix_len: u8) -> Result<Self, AddressError> {
        match prefix_len {
            0 => Ok(Self(0)),
            1..=32 => Ok(Self(u32::MAX << (32 - u32::from(prefix_len)))),
            _ => Err(AddressError::PrefixLength(prefix_len.to_string())),
        }
    }

    /// Interprets this address as a netmask and returns its prefix length.
    ///
    /// Returns `None` for non-contiguous masks such as `255.0.255.0`.
    pub fn prefix_len(self) -> Option<u8> {
        let ones = self.0.leading_ones();
        if self.0.checked_shl(ones).unwrap_or(0) == 0 {
            u8::try_from(ones).ok()
        } else {
            None
        }
    }
}

impl FromStr for Ipv4Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = || AddressError::Syntax(s.to_string());

        let mut octets = [0u8; 4];
        let mut parts = s.split('.');
        for octet in &mut octets {
            let part = parts.next().ok_or_else(syntax)?;
            // Reject signs, whitespace and overlong forms like "0001"
            if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(syntax());
            }
            *octet = part.parse().map_err(|_| syntax())?;
        }
        if parts.next().is_some() {
            return Err(syntax());
        }

        Ok(Self(u32::from_be_bytes(octets)))
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.octets();
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

/// An IPv4 network in CIDR form.
///
/// Parsing rejects networks with host bits set (`10.0.0.1/24`). A literal
/// without a `/len` suffix is a host prefix (`/32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Prefix {
    address: Ipv4Address,
    len: u8,
}

impl Ipv4Prefix {
    pub fn new(address: Ipv4Address, len: u8) -> Result<Self, AddressError> {
        let mask = Ipv4Address::netmask(len)?;
        if address.to_bits() & !mask.to_bits() != 0 {
            return Err(AddressError::HostBitsSet(format!("{address}/{len}")));
        }
        Ok(Self { address, len })
    }

    pub const fn address(&self) -> Ipv4Address {
        self.address
    }

    pub const fn length(&self) -> u8 {
        self.len
    }

    pub const fn is_host(&self) -> bool {
        self.len == 32
    }

    pub fn netmask(&self) -> Ipv4Address {
        // len is validated on construction
        Ipv4Address::netmask(self.len).unwrap_or(Ipv4Address::BROADCAST)
    }
}

impl FromStr for Ipv4Prefix {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((addr, len)) => {
                let address = addr.parse()?;
                if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(AddressError::PrefixLength(len.to_string()));
                }
                let len: u8 = len
                    .parse()
                    .map_err(|_| AddressError::PrefixLength(len.to_string()))?;
                Self::new(address, len)
            }
            None => Self::new(s.parse()?, 32),
        }
    }
}

impl fmt::Display for Ipv4Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.len)
    }
}

/// Returns true when `literal` (with an optional `/len` suffix) is an IPv6 address.
pub fn is_ipv6_literal(literal: &str) -> bool {
    let addr = literal.split_once('/').map_or(literal, |(addr, _)| addr);
    addr.contains(':') && addr.parse::<std::net::Ipv6Addr>().is_ok()
}

/// Returns true when `literal` is a valid IPv4 prefix (host bits clear,
/// length in `0..=32`) or an IPv6 address with an optional length in
/// `0..=128`. A bare address counts as a full-length prefix.
pub fn is_address_literal(literal: &str) -> bool {
    if literal.parse::<Ipv4Prefix>().is_ok() {
        return true;
    }
    let len_ok = match literal.split_once('/') {
        Some((_, len)) => {
            len.bytes().all(|b| b.is_ascii_digit()) && len.parse::<u8>().is_ok_and(|l| l <= 128)
        }
        None => true,
    };
    len_ok && is_ipv6_literal(literal)
}

/// A 48-bit Ethernet address, rendered lowercase and colon separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in &mut octets {
            let part = parts
                .next()
                .filter(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_hexdigit()))
                .ok_or_else(|| AddressError::Mac(s.to_string()))?;
            *octet =
                u8::from_str_radix(part, 16).map_err(|_| AddressError::Mac(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(AddressError::Mac(s.to_string()));
        }
        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}
