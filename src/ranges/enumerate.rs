//! Address counting and enumeration for IPv4 and IPv6 ranges

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::{IpAddrRange, IpNet, Ipv4AddrRange, Ipv6AddrRange};

use super::error::RangeParseError;

/// Address family of a range, derived from its address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    pub fn max_prefix_len(self) -> u8 {
        match self {
            AddressFamily::V4 => 32,
            AddressFamily::V6 => 128,
        }
    }
}

/// A parsed `address/prefix` range
///
/// Parsing is lenient: host bits may be set (`10.0.0.5/24`) and a bare
/// address is a single-host range. The address is kept as written so the
/// textual form round-trips; [`NetworkRange::network`] gives the truncated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkRange {
    net: IpNet,
}

impl NetworkRange {
    pub fn address(&self) -> IpAddr {
        self.net.addr()
    }

    pub fn prefix_len(&self) -> u8 {
        self.net.prefix_len()
    }

    pub fn family(&self) -> AddressFamily {
        match self.net {
            IpNet::V4(_) => AddressFamily::V4,
            IpNet::V6(_) => AddressFamily::V6,
        }
    }

    /// First address of the range
    pub fn network(&self) -> IpAddr {
        self.net.network()
    }

    /// Last address of the range
    pub fn last(&self) -> IpAddr {
        self.net.broadcast()
    }

    /// Number of addresses, saturating at `u128::MAX` for `::/0`
    pub fn address_count(&self) -> u128 {
        let host_bits = u32::from(self.family().max_prefix_len() - self.prefix_len());
        range_size(host_bits)
    }

    /// Every address in ascending order, network and broadcast included
    ///
    /// The iterator is lazy and can be recreated at will, so even a `/0`
    /// never needs to be held in memory.
    pub fn addresses(&self) -> IpAddrRange {
        match self.net {
            IpNet::V4(n) => IpAddrRange::V4(Ipv4AddrRange::new(n.network(), n.broadcast())),
            IpNet::V6(n) => IpAddrRange::V6(Ipv6AddrRange::new(n.network(), n.broadcast())),
        }
    }
}

impl FromStr for NetworkRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || RangeParseError::InvalidAddress {
            input: s.to_string(),
        };

        match text.split_once('/') {
            Some((addr, prefix)) => {
                let address = IpAddr::from_str(addr).map_err(|_| invalid())?;
                let prefix_len = prefix
                    .parse::<u8>()
                    .map_err(|_| RangeParseError::InvalidPrefix {
                        input: s.to_string(),
                        prefix: prefix.to_string(),
                    })?;
                IpNet::new(address, prefix_len)
                    .map(|net| Self { net })
                    .map_err(|_| RangeParseError::InvalidPrefix {
                        input: s.to_string(),
                        prefix: prefix.to_string(),
                    })
            }
            None => IpAddr::from_str(text)
                .map(|address| Self {
                    net: IpNet::from(address),
                })
                .map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.net.addr(), self.net.prefix_len())
    }
}

fn range_size(host_bits: u32) -> u128 {
    1u128.checked_shl(host_bits).unwrap_or(u128::MAX)
}

/// Count the addresses in `raw` without enumerating them
///
/// Only the prefix is inspected: a missing prefix means a single host, and
/// the family is IPv6 whenever the text contains `:`. The address itself is
/// not validated.
pub fn count_addresses(raw: &str) -> Result<u128, RangeParseError> {
    let text = raw.trim();
    let bits: u32 = if text.contains(':') { 128 } else { 32 };

    let prefix_len = match text.split_once('/') {
        Some((_, prefix)) => prefix
            .parse::<u32>()
            .ok()
            .filter(|p| *p <= bits)
            .ok_or_else(|| RangeParseError::InvalidPrefix {
                input: raw.to_string(),
                prefix: prefix.to_string(),
            })?,
        None => bits,
    };

    Ok(range_size(bits - prefix_len))
}

/// Materialize every address of `raw` as text, in ascending order
///
/// There is no upper bound here; use [`to_address_list_bounded`] for input
/// you do not control.
pub fn to_address_list(raw: &str) -> Result<Vec<String>, RangeParseError> {
    let range: NetworkRange = raw.parse()?;
    Ok(range.addresses().map(|ip| ip.to_string()).collect())
}

/// Like [`to_address_list`], but refuses ranges holding more than `limit` addresses
pub fn to_address_list_bounded(raw: &str, limit: u128) -> Result<Vec<String>, RangeParseError> {
    let range: NetworkRange = raw.parse()?;
    let count = range.address_count();
    if count > limit {
        return Err(RangeParseError::TooLarge {
            input: raw.to_string(),
            count,
            limit,
        });
    }
    Ok(range.addresses().map(|ip| ip.to_string()).collect())
}
