use thiserror::Error;

#[derive(Error, Debug)]
pub enum VhdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid VHD footer cookie")]
    InvalidCookie,
    #[error("VHD footer checksum mismatch (stored {stored:#010x}, computed {computed:#010x})")]
    ChecksumMismatch { stored: u32, computed: u32 },
    #[error("Unsupported VHD disk type: {0}")]
    UnsupportedDiskType(u32),
    #[error("Original size {original} does not match current size {current}")]
    SizeMismatch { original: u64, current: u64 },
    #[error("Capacity of {gib} GiB does not fit in 64 bits")]
    CapacityOverflow { gib: u64 },
    #[error("Capacity {capacity} exceeds the maximum of {max} bytes")]
    CapacityTooLarge { capacity: u64, max: u64 },
    #[error("Capacity {0} is not a multiple of 512 bytes")]
    UnalignedCapacity(u64),
    #[error("Image of {len} bytes is too short to hold a VHD footer")]
    MissingFooter { len: u64 },
    #[error("Image of {len} bytes cannot hold a {capacity} byte disk and its footer")]
    ImageTooSmall { len: u64, capacity: u64 },
    #[error("Footer at offset {footer_offset} describes a {capacity} byte disk")]
    FooterOffsetMismatch { capacity: u64, footer_offset: u64 },
}

pub type Result<T> = std::result::Result<T, VhdError>;
