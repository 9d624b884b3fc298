use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between 1970-01-01T00:00:00Z and 2000-01-01T00:00:00Z.
pub const VHD_EPOCH_OFFSET: u64 = 946_684_800;

/// Encodes `time` as seconds since 2000-01-01T00:00:00Z.
///
/// The footer field is 32 bits wide and stops being able to represent the
/// clock in February 2136. Times past that point saturate at `u32::MAX`,
/// and times before 2000 encode as 0.
pub fn vhd_timestamp(time: SystemTime) -> u32 {
    let unix = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let since_2000 = unix.saturating_sub(VHD_EPOCH_OFFSET);
    u32::try_from(since_2000).unwrap_or(u32::MAX)
}

pub fn timestamp_to_system_time(timestamp: u32) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(VHD_EPOCH_OFFSET + timestamp as u64)
}
