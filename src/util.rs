use bytemuck::{Pod, Zeroable};
use positioned_io2::ReadAt;

#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct BeU32([u8; 4]);

impl BeU32 {
    pub const fn new(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    pub const fn get(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct BeU64([u8; 8]);

impl BeU64 {
    pub const fn new(value: u64) -> Self {
        Self(value.to_be_bytes())
    }

    pub const fn get(self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

pub trait ReadAtExt {
    fn read_pod_at<T: Pod>(&self, offset: u64) -> std::io::Result<T>;
}

impl<R: ReadAt> ReadAtExt for R {
    fn read_pod_at<T: Pod>(&self, offset: u64) -> std::io::Result<T> {
        let mut buf = vec![0u8; std::mem::size_of::<T>()];
        self.read_exact_at(offset, &mut buf)?;
        Ok(bytemuck::pod_read_unaligned::<T>(&buf))
    }
}
