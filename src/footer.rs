use std::time::SystemTime;

use bytemuck::{Pod, Zeroable};
use uuid::Uuid;

use crate::error::{Result, VhdError};
use crate::geometry::{DiskGeometry, GeometryPolicy, RawGeometry};
use crate::timestamp::{timestamp_to_system_time, vhd_timestamp};
use crate::util::{BeU32, BeU64};

pub const FOOTER_SIZE: usize = 512;
pub const CHECKSUM_OFFSET: usize = 64;

/// On-disk layout of the 512-byte VHD footer. All integers are big-endian.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct VhdFooter {
    pub cookie: [u8; 8],
    pub features: BeU32,
    pub format_version: BeU32,
    pub data_offset: BeU64,
    pub timestamp: BeU32,
    pub creator_app: [u8; 4],
    pub creator_version: BeU32,
    pub creator_os: [u8; 4],
    pub original_size: BeU64,
    pub current_size: BeU64,
    pub geometry: RawGeometry,
    pub disk_type: BeU32,
    pub checksum: BeU32,
    pub unique_id: Uuid,
    pub saved_state: u8,
    pub reserved: [u8; 427],
}

const _: () = assert!(std::mem::size_of::<VhdFooter>() == FOOTER_SIZE);

impl VhdFooter {
    pub const COOKIE: [u8; 8] = *b"conectix";
    /// Only the "reserved" bit, which the format requires to be set.
    pub const FEATURES: u32 = 0x0000_0002;
    pub const FORMAT_VERSION: u32 = 0x0001_0000;
    /// Fixed disks have no dynamic header.
    pub const FIXED_DATA_OFFSET: u64 = u64::MAX;
    pub const DISK_TYPE_FIXED: u32 = 2;

    /// Builds a sealed fixed-disk footer from explicit values.
    pub fn new_fixed(
        capacity: u64,
        options: &FooterOptions,
        timestamp: u32,
        unique_id: Uuid,
    ) -> Self {
        let mut footer = Self {
            cookie: Self::COOKIE,
            features: BeU32::new(Self::FEATURES),
            format_version: BeU32::new(Self::FORMAT_VERSION),
            data_offset: BeU64::new(Self::FIXED_DATA_OFFSET),
            timestamp: BeU32::new(timestamp),
            creator_app: options.creator_app,
            creator_version: BeU32::new(options.creator_version),
            creator_os: options.creator_os,
            original_size: BeU64::new(capacity),
            current_size: BeU64::new(capacity),
            geometry: DiskGeometry::for_policy(options.geometry, capacity).to_raw(),
            disk_type: BeU32::new(Self::DISK_TYPE_FIXED),
            checksum: BeU32::new(0),
            unique_id,
            saved_state: 0,
            reserved: [0; 427],
        };
        footer.seal();
        footer
    }

    /// Builds a footer stamped with the current time and a random v4 unique id.
    pub fn fresh(capacity: u64, options: &FooterOptions) -> Self {
        Self::new_fixed(
            capacity,
            options,
            vhd_timestamp(SystemTime::now()),
            Uuid::new_v4(),
        )
    }

    /// Recomputes the checksum field over the current contents.
    pub fn seal(&mut self) {
        self.checksum = BeU32::new(footer_checksum(&self.to_bytes()));
    }

    /// Decodes and validates a fixed-disk footer.
    pub fn parse(bytes: &[u8; FOOTER_SIZE]) -> Result<Self> {
        let footer: VhdFooter = bytemuck::pod_read_unaligned(bytes);

        if footer.cookie != Self::COOKIE {
            return Err(VhdError::InvalidCookie);
        }

        let computed = footer_checksum(bytes);
        if footer.checksum() != computed {
            return Err(VhdError::ChecksumMismatch {
                stored: footer.checksum(),
                computed,
            });
        }

        if footer.disk_type.get() != Self::DISK_TYPE_FIXED {
            return Err(VhdError::UnsupportedDiskType(footer.disk_type.get()));
        }

        if footer.original_size != footer.current_size {
            return Err(VhdError::SizeMismatch {
                original: footer.original_size.get(),
                current: footer.current_size.get(),
            });
        }

        Ok(footer)
    }

    pub fn to_bytes(&self) -> [u8; FOOTER_SIZE] {
        bytemuck::cast(*self)
    }

    pub fn capacity(&self) -> u64 {
        self.current_size.get()
    }

    /// Stored checksum, as written in the footer.
    pub fn checksum(&self) -> u32 {
        self.checksum.get()
    }

    pub fn geometry(&self) -> DiskGeometry {
        DiskGeometry::from_raw(self.geometry)
    }

    pub fn created_at(&self) -> SystemTime {
        timestamp_to_system_time(self.timestamp.get())
    }

    pub fn is_checksum_valid(&self) -> bool {
        footer_checksum(&self.to_bytes()) == self.checksum()
    }
}

/// Creator fields and geometry policy written into generated footers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterOptions {
    pub creator_app: [u8; 4],
    pub creator_version: u32,
    pub creator_os: [u8; 4],
    pub geometry: GeometryPolicy,
}

impl Default for FooterOptions {
    fn default() -> Self {
        Self {
            // "wa": windows azure
            creator_app: *b"wa\0\0",
            creator_version: 0x0007_0000,
            creator_os: *b"Wi2k",
            geometry: GeometryPolicy::Legacy,
        }
    }
}

/// One's complement of the byte sum, with the checksum field read as zero.
pub fn footer_checksum(bytes: &[u8; FOOTER_SIZE]) -> u32 {
    let sum = bytes
        .iter()
        .enumerate()
        .filter(|(i, _)| !(CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4).contains(i))
        .fold(0u32, |acc, (_, &b)| acc.wrapping_add(b as u32));
    !sum
}

/// Generates a fixed-disk footer for a disk of `capacity` bytes with the default creator fields.
pub fn generate_footer(capacity: u64) -> [u8; FOOTER_SIZE] {
    generate_footer_with(capacity, &FooterOptions::default())
}

pub fn generate_footer_with(capacity: u64, options: &FooterOptions) -> [u8; FOOTER_SIZE] {
    let footer = VhdFooter::fresh(capacity, options);
    tracing::debug!(
        capacity,
        unique_id = %footer.unique_id,
        checksum = footer.checksum(),
        "generated VHD footer"
    );
    footer.to_bytes()
}
