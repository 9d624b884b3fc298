use std::io::{Read, Seek, SeekFrom, Write};

use crate::SECTOR_SIZE;
use crate::error::Result;
use crate::footer::{FooterOptions, VhdFooter};
use crate::layout::PageBlobLayout;

/// Streams a raw disk image into `writer` as a fixed VHD.
///
/// The payload is zero-padded up to the next sector boundary and the footer
/// describes the padded size.
pub fn wrap_raw<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    options: &FooterOptions,
) -> Result<VhdFooter> {
    let mut capacity = std::io::copy(reader, writer)?;

    let remainder = capacity % SECTOR_SIZE;
    if remainder != 0 {
        let pad = vec![0u8; (SECTOR_SIZE - remainder) as usize];
        writer.write_all(&pad)?;
        capacity += SECTOR_SIZE - remainder;
    }

    let footer = VhdFooter::fresh(capacity, options);
    writer.write_all(&footer.to_bytes())?;
    writer.flush()?;

    tracing::debug!(capacity, "wrapped raw image as VHD");
    Ok(footer)
}

/// Lays out an empty fixed VHD: the footer is written at the end of the
/// disk area, leaving the payload untouched (sparse on most filesystems).
pub fn create_blank<W: Write + Seek>(
    writer: &mut W,
    layout: &PageBlobLayout,
    options: &FooterOptions,
) -> Result<VhdFooter> {
    let footer = VhdFooter::fresh(layout.capacity, options);
    writer.seek(SeekFrom::Start(*layout.footer_range().start()))?;
    writer.write_all(&footer.to_bytes())?;
    writer.flush()?;

    tracing::debug!(
        capacity = layout.capacity,
        blob_size = layout.blob_size,
        "created blank fixed VHD"
    );
    Ok(footer)
}
