use positioned_io2::ReadAt;
use std::io::{Read, Write};
use util::ReadAtExt;

pub use error::{Result, VhdError};
pub use footer::{
    FOOTER_SIZE, FooterOptions, VhdFooter, footer_checksum, generate_footer, generate_footer_with,
};
pub use geometry::{DiskGeometry, GeometryPolicy};
pub use layout::{LayoutPolicy, PageBlobLayout, capacity_from_gib};
pub use wrap::{create_blank, wrap_raw};

pub mod error;
pub mod footer;
pub mod geometry;
pub mod layout;
pub mod timestamp;
mod util;
pub mod wrap;

pub const SECTOR_SIZE: u64 = 512;

/// A fixed-format VHD image: raw disk bytes followed by a 512-byte footer.
///
/// Reads only ever see the disk payload, never the footer.
pub struct FixedVhd<R: ReadAt> {
    footer: VhdFooter,
    reader: R,
    position: u64,
}

impl FixedVhd<std::fs::File> {
    pub fn open_file(file: std::fs::File) -> Result<Self> {
        let len = file.metadata()?.len();
        Self::open(file, len)
    }
}

impl<R: ReadAt> FixedVhd<R> {
    pub fn open(reader: R, image_len: u64) -> Result<Self> {
        let Some(footer_offset) = image_len.checked_sub(FOOTER_SIZE as u64) else {
            return Err(VhdError::MissingFooter { len: image_len });
        };

        let raw = reader.read_pod_at::<[u8; FOOTER_SIZE]>(footer_offset)?;
        let footer = VhdFooter::parse(&raw)?;
        // The payload must end exactly where the footer starts.
        match footer.capacity().cmp(&footer_offset) {
            std::cmp::Ordering::Greater => {
                return Err(VhdError::ImageTooSmall {
                    len: image_len,
                    capacity: footer.capacity(),
                });
            }
            std::cmp::Ordering::Less => {
                return Err(VhdError::FooterOffsetMismatch {
                    capacity: footer.capacity(),
                    footer_offset,
                });
            }
            std::cmp::Ordering::Equal => {}
        }

        tracing::debug!(
            capacity = footer.capacity(),
            footer_offset,
            unique_id = %footer.unique_id,
            "opened fixed VHD"
        );

        Ok(Self {
            footer,
            reader,
            position: 0,
        })
    }

    pub fn footer(&self) -> &VhdFooter {
        &self.footer
    }

    pub fn capacity(&self) -> u64 {
        self.footer.capacity()
    }

    /// Offset of the footer within the backing image; equal to the capacity.
    pub fn footer_offset(&self) -> u64 {
        self.footer.capacity()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Copies the raw disk payload into `writer`, returning the number of bytes written.
    pub fn unwrap_to<W: Write>(&self, writer: &mut W) -> Result<u64> {
        let mut buf = vec![0u8; 1024 * 1024];
        let mut pos = 0;
        while pos < self.capacity() {
            let n = self.read_at(pos, &mut buf)?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n])?;
            pos += n as u64;
        }
        tracing::trace!(bytes = pos, "unwrapped VHD payload");
        Ok(pos)
    }
}

impl<R: ReadAt> ReadAt for FixedVhd<R> {
    fn read_at(&self, pos: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        if pos >= self.capacity() {
            return Ok(0); // EOF
        }
        let to_read = std::cmp::min(buf.len() as u64, self.capacity() - pos) as usize;
        self.reader.read_at(pos, &mut buf[..to_read])
    }
}

impl<R: ReadAt> Read for FixedVhd<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.read_at(self.position, buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: ReadAt> Write for FixedVhd<R> {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "fixed VHD images are opened read-only; build new ones with wrap_raw or create_blank",
        ))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<R: ReadAt> std::io::Seek for FixedVhd<R> {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        let new_pos = match pos {
            std::io::SeekFrom::Start(offset) => Some(offset),
            std::io::SeekFrom::End(offset) => self.capacity().checked_add_signed(offset),
            std::io::SeekFrom::Current(offset) => self.position.checked_add_signed(offset),
        };

        match new_pos {
            Some(new_pos) if new_pos <= self.capacity() => {
                self.position = new_pos;
                Ok(self.position)
            }
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Tried to seek beyond end of the disk",
            )),
        }
    }
}
