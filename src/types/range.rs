//! Inclusive IPv4 address ranges.
//!
//! An [`IpRange`] is validated once from two dotted-quad strings and then
//! enumerated lazily. No upper bound is placed on the range size here;
//! bounding the work is the worker pool's job.

use crate::error::ValidationError;
use serde::Serialize;
use std::fmt;
use std::iter::FusedIterator;
use std::net::Ipv4Addr;

/// A validated, inclusive range of IPv4 addresses (`start <= end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IpRange {
    start: u32,
    end: u32,
}

impl IpRange {
    /// Create a range from two addresses.
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Result<Self, ValidationError> {
        let (lo, hi) = (u32::from(start), u32::from(end));
        if lo > hi {
            return Err(ValidationError::RangeInverted { start, end });
        }
        Ok(Self { start: lo, end: hi })
    }

    /// Parse both endpoints as dotted quads and validate the ordering.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_address(start)?, parse_address(end)?)
    }

    /// First address of the range.
    pub fn start(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.start)
    }

    /// Last address of the range.
    pub fn end(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.end)
    }

    /// Number of addresses in the range (`end - start + 1`).
    ///
    /// Returned as `u64` since the full IPv4 space holds 2^32 addresses.
    pub fn len(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    /// A valid range always holds at least one address.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Lazily enumerate every address, in increasing order.
    ///
    /// Each call starts a fresh enumeration.
    pub fn iter(&self) -> Addresses {
        Addresses {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for IpRange {
    type Item = Ipv4Addr;
    type IntoIter = Addresses;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &IpRange {
    type Item = Ipv4Addr;
    type IntoIter = Addresses;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start())
        } else {
            write!(f, "{}-{}", self.start(), self.end())
        }
    }
}

/// Lazy iterator over the addresses of an [`IpRange`].
#[derive(Debug, Clone)]
pub struct Addresses {
    next: Option<u32>,
    end: u32,
}

impl Iterator for Addresses {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        // checked_add keeps 255.255.255.255 from wrapping around
        self.next = if current < self.end {
            current.checked_add(1)
        } else {
            None
        };
        Some(Ipv4Addr::from(current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(next) => {
                let remaining = u64::from(self.end - next) + 1;
                match usize::try_from(remaining) {
                    Ok(n) => (n, Some(n)),
                    Err(_) => (usize::MAX, None),
                }
            }
            None => (0, Some(0)),
        }
    }
}

impl FusedIterator for Addresses {}

/// Parse a dotted-quad IPv4 address, tolerating surrounding whitespace.
pub fn parse_address(s: &str) -> Result<Ipv4Addr, ValidationError> {
    s.trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| ValidationError::MalformedAddress(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerates_inclusive_range() {
        let range = IpRange::parse("10.0.0.250", "10.0.1.2").unwrap();
        let addrs: Vec<Ipv4Addr> = range.iter().collect();

        assert_eq!(range.len(), 9);
        assert_eq!(addrs.len(), 9);
        assert_eq!(addrs.first(), Some(&Ipv4Addr::new(10, 0, 0, 250)));
        assert_eq!(addrs.last(), Some(&Ipv4Addr::new(10, 0, 1, 2)));
        assert!(addrs.windows(2).all(|w| u32::from(w[0]) < u32::from(w[1])));
    }

    #[test]
    fn test_single_address_range() {
        let range = IpRange::parse("192.168.1.1", "192.168.1.1").unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![Ipv4Addr::new(192, 168, 1, 1)]);
        assert_eq!(range.to_string(), "192.168.1.1");
    }

    #[test]
    fn test_range_is_restartable() {
        let range = IpRange::parse("172.16.0.1", "172.16.0.4").unwrap();
        let first: Vec<_> = range.iter().collect();
        let second: Vec<_> = range.into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_top_of_address_space_does_not_wrap() {
        let range = IpRange::parse("255.255.255.254", "255.255.255.255").unwrap();
        let addrs: Vec<_> = range.iter().collect();
        assert_eq!(addrs, vec![Ipv4Addr::new(255, 255, 255, 254), Ipv4Addr::BROADCAST]);
    }

    #[test]
    fn test_full_space_length() {
        let range = IpRange::parse("0.0.0.0", "255.255.255.255").unwrap();
        assert_eq!(range.len(), 1u64 << 32);
        let mut iter = range.iter();
        assert_eq!(iter.next(), Some(Ipv4Addr::UNSPECIFIED));
        assert_eq!(iter.next(), Some(Ipv4Addr::new(0, 0, 0, 1)));
    }

    #[test]
    fn test_size_hint_tracks_progress() {
        let range = IpRange::parse("10.0.0.1", "10.0.0.3").unwrap();
        let mut iter = range.iter();
        assert_eq!(iter.size_hint(), (3, Some(3)));
        iter.next();
        assert_eq!(iter.size_hint(), (2, Some(2)));
        iter.by_ref().for_each(drop);
        assert_eq!(iter.size_hint(), (0, Some(0)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = IpRange::parse("10.0.0.2", "10.0.0.1").unwrap_err();
        assert_eq!(
            err,
            ValidationError::RangeInverted {
                start: Ipv4Addr::new(10, 0, 0, 2),
                end: Ipv4Addr::new(10, 0, 0, 1),
            }
        );
    }

    #[test]
    fn test_malformed_addresses_rejected() {
        for bad in ["", "10.0.0", "10.0.0.256", "a.b.c.d", "10.0.0.1/24", "::1"] {
            let err = IpRange::parse(bad, "10.0.0.1").unwrap_err();
            assert!(
                matches!(err, ValidationError::MalformedAddress(_)),
                "{bad:?} should be malformed"
            );
        }
        assert!(matches!(
            IpRange::parse("10.0.0.1", "nope"),
            Err(ValidationError::MalformedAddress(s)) if s == "nope"
        ));
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        let range = IpRange::parse(" 10.0.0.1\n", "10.0.0.2 ").unwrap();
        assert_eq!(range.start(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(range.to_string(), "10.0.0.1-10.0.0.2");
    }
}
