//! Sequential IPv4 subnet allocation inside a network block.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use stackwright_common::error::{Result, StackwrightError};

/// Carves aligned subnets out of a parent block, in request order.
///
/// Each block starts at or after the end of the previous one; gaps left by
/// alignment are never reused.
#[derive(Debug, Clone)]
pub struct CidrAllocator {
    parent: Ipv4Net,
    /// Lowest address the next block may start at; `None` once the end of
    /// the address space has been handed out.
    cursor: Option<Ipv4Addr>,
}

impl CidrAllocator {
    /// Creates an allocator over `parent` (e.g. `10.0.0.0/16`).
    ///
    /// Host bits in `parent` are cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is not valid CIDR notation.
    pub fn new(parent: &str) -> Result<Self> {
        let parent = parent
            .parse::<Ipv4Net>()
            .map_err(|e| StackwrightError::Graph {
                message: format!("invalid CIDR block \"{parent}\": {e}"),
            })?
            .trunc();
        Ok(Self {
            parent,
            cursor: Some(parent.network()),
        })
    }

    /// Allocates the next block with prefix length `prefix`, aligned to its size.
    ///
    /// # Errors
    ///
    /// Returns an error if `prefix` cannot be carved out of the parent
    /// block, or a configuration error if the parent block is exhausted.
    pub fn allocate(&mut self, prefix: u8) -> Result<Ipv4Net> {
        let exhausted = || {
            StackwrightError::config(
                "network.addressing.maxAvailabilityZones",
                format!("a subnet plan that fits within {}", self.parent),
            )
        };
        let cursor = self.cursor.ok_or_else(exhausted)?;
        let block = self
            .parent
            .subnets(prefix)
            .map_err(|_| StackwrightError::Graph {
                message: format!("prefix length /{prefix} does not fit in {}", self.parent),
            })?
            .find(|net| net.network() >= cursor)
            .ok_or_else(exhausted)?;

        self.cursor = u32::from(block.broadcast()).checked_add(1).map(Ipv4Addr::from);
        Ok(block)
    }

    /// The parent block.
    #[must_use]
    pub const fn parent(&self) -> Ipv4Net {
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv4Net {
        s.parse().unwrap()
    }

    #[test]
    fn allocates_sequential_aligned_blocks() {
        let mut alloc = CidrAllocator::new("10.0.0.0/16").unwrap();
        assert_eq!(alloc.allocate(24).unwrap(), net("10.0.0.0/24"));
        assert_eq!(alloc.allocate(24).unwrap(), net("10.0.1.0/24"));
        assert_eq!(alloc.allocate(28).unwrap(), net("10.0.2.0/28"));
        assert_eq!(alloc.allocate(28).unwrap(), net("10.0.2.16/28"));
        assert_eq!(alloc.allocate(24).unwrap(), net("10.0.3.0/24"));
    }

    #[test]
    fn exhaustion_is_config_error() {
        let mut alloc = CidrAllocator::new("10.0.0.0/23").unwrap();
        assert!(alloc.allocate(24).is_ok());
        assert!(alloc.allocate(24).is_ok());
        let err = alloc.allocate(24).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn end_of_address_space_is_exhausted_not_wrapped() {
        let mut alloc = CidrAllocator::new("255.255.255.0/24").unwrap();
        assert_eq!(alloc.allocate(24).unwrap(), net("255.255.255.0/24"));
        assert!(alloc.allocate(28).unwrap_err().is_config());
    }

    #[test]
    fn unaligned_parent_is_normalized() {
        let alloc = CidrAllocator::new("10.0.3.7/16").unwrap();
        assert_eq!(alloc.parent(), net("10.0.0.0/16"));
    }

    #[test]
    fn out_of_range_prefix_is_an_error() {
        let mut alloc = CidrAllocator::new("10.0.0.0/16").unwrap();
        assert!(alloc.allocate(33).is_err());
        assert!(alloc.allocate(8).is_err());
        assert_eq!(alloc.allocate(24).unwrap(), net("10.0.0.0/24"));
    }

    #[test]
    fn rejects_invalid_parent() {
        assert!(CidrAllocator::new("10.0.0.0").is_err());
        assert!(CidrAllocator::new("10.0.0.0/40").is_err());
        assert!(CidrAllocator::new("ten/16").is_err());
    }
}
