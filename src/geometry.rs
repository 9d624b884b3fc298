use bytemuck::{Pod, Zeroable};

use crate::SECTOR_SIZE;

/// Cylinder/head/sector triple stored in the footer's disk geometry field.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct RawGeometry {
    pub cylinders: [u8; 2],
    pub heads: u8,
    pub sectors_per_track: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskGeometry {
    pub cylinders: u16,
    pub heads: u8,
    pub sectors_per_track: u8,
}

/// How the encoder fills in the geometry field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeometryPolicy {
    /// Always write [`DiskGeometry::LEGACY`], regardless of capacity.
    #[default]
    Legacy,
    /// Derive CHS values from the capacity.
    Derived,
}

impl DiskGeometry {
    /// 2080 cylinders, 16 heads, 63 sectors per track. Only matches a 1 GiB disk.
    pub const LEGACY: DiskGeometry = DiskGeometry {
        cylinders: 0x0820,
        heads: 0x10,
        sectors_per_track: 0x3f,
    };

    const MAX_SECTORS: u64 = 65535 * 16 * 255;

    /// CHS approximation from Microsoft's VHD image format document (appendix "CHS Calculation").
    pub fn from_capacity(capacity: u64) -> Self {
        let total_sectors = (capacity / SECTOR_SIZE).min(Self::MAX_SECTORS);

        let (sectors_per_track, heads, cylinder_times_heads) = if total_sectors >= 65535 * 16 * 63 {
            (255u64, 16u64, total_sectors / 255)
        } else {
            let mut spt = 17;
            let mut cth = total_sectors / spt;
            let mut heads = ((cth + 1023) / 1024).max(4);

            if cth >= heads * 1024 || heads > 16 {
                spt = 31;
                heads = 16;
                cth = total_sectors / spt;
            }
            if cth >= heads * 1024 {
                spt = 63;
                heads = 16;
                cth = total_sectors / spt;
            }
            (spt, heads, cth)
        };

        Self {
            cylinders: (cylinder_times_heads / heads) as u16,
            heads: heads as u8,
            sectors_per_track: sectors_per_track as u8,
        }
    }

    pub fn for_policy(policy: GeometryPolicy, capacity: u64) -> Self {
        match policy {
            GeometryPolicy::Legacy => Self::LEGACY,
            GeometryPolicy::Derived => Self::from_capacity(capacity),
        }
    }

    /// Number of bytes addressable through this geometry.
    pub fn capacity(&self) -> u64 {
        self.cylinders as u64 * self.heads as u64 * self.sectors_per_track as u64 * SECTOR_SIZE
    }

    /// Packed field value: cylinders (big-endian), heads, sectors per track.
    pub fn to_bytes(self) -> [u8; 4] {
        bytemuck::cast(self.to_raw())
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::from_raw(bytemuck::cast(bytes))
    }

    pub fn to_raw(self) -> RawGeometry {
        RawGeometry {
            cylinders: self.cylinders.to_be_bytes(),
            heads: self.heads,
            sectors_per_track: self.sectors_per_track,
        }
    }

    pub fn from_raw(raw: RawGeometry) -> Self {
        Self {
            cylinders: u16::from_be_bytes(raw.cylinders),
            heads: raw.heads,
            sectors_per_track: raw.sectors_per_track,
        }
    }
}
