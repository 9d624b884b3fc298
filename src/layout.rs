use std::ops::RangeInclusive;

use crate::error::{Result, VhdError};
use crate::{FOOTER_SIZE, SECTOR_SIZE};

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Converts a size in GiB to bytes, refusing to wrap.
pub fn capacity_from_gib(gib: u64) -> Result<u64> {
    gib.checked_mul(GIB)
        .ok_or(VhdError::CapacityOverflow { gib })
}

/// Caller-side limits applied before a disk is laid out in a page blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPolicy {
    pub max_capacity: u64,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            max_capacity: 2040 * GIB,
        }
    }
}

/// Placement of a fixed VHD inside a page blob: the raw disk followed by its footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBlobLayout {
    pub capacity: u64,
    pub blob_size: u64,
}

impl PageBlobLayout {
    pub fn new(capacity: u64, policy: &LayoutPolicy) -> Result<Self> {
        if capacity % SECTOR_SIZE != 0 {
            return Err(VhdError::UnalignedCapacity(capacity));
        }
        if capacity > policy.max_capacity {
            return Err(VhdError::CapacityTooLarge {
                capacity,
                max: policy.max_capacity,
            });
        }
        let blob_size = capacity
            .checked_add(FOOTER_SIZE as u64)
            .ok_or(VhdError::CapacityTooLarge {
                capacity,
                max: u64::MAX - FOOTER_SIZE as u64,
            })?;

        Ok(Self {
            capacity,
            blob_size,
        })
    }

    /// Inclusive byte range of the footer, as used for page writes.
    pub fn footer_range(&self) -> RangeInclusive<u64> {
        self.capacity..=self.blob_size - 1
    }
}
