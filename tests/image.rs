use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use positioned_io2::ReadAt;
use vhd::{
    FixedVhd, FooterOptions, LayoutPolicy, PageBlobLayout, VhdError, create_blank, wrap_raw,
};

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn wrapped_file(raw: &[u8]) -> (tempfile::NamedTempFile, vhd::VhdFooter) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let footer = wrap_raw(&mut &raw[..], file.as_file_mut(), &FooterOptions::default()).unwrap();
    (file, footer)
}

#[test]
fn open_wrapped_image() {
    let raw = pattern(4096);
    let (file, footer) = wrapped_file(&raw);

    let disk = FixedVhd::open_file(File::open(file.path()).unwrap()).unwrap();
    assert_eq!(disk.capacity(), 4096);
    assert_eq!(disk.footer(), &footer);
    assert_eq!(disk.footer_offset(), 4096);
}

#[test]
fn reads_stop_at_footer() {
    let raw = pattern(1000);
    let (file, _) = wrapped_file(&raw);
    let mut disk = FixedVhd::open_file(File::open(file.path()).unwrap()).unwrap();

    let mut contents = Vec::new();
    disk.read_to_end(&mut contents).unwrap();
    assert_eq!(contents.len(), 1024);
    assert_eq!(&contents[..1000], raw.as_slice());
    assert!(contents[1000..].iter().all(|&b| b == 0));

    let mut buf = [0u8; 64];
    assert_eq!(disk.read_at(1024, &mut buf).unwrap(), 0);
    assert_eq!(disk.read_at(1000, &mut buf).unwrap(), 24);
}

#[test]
fn seek_within_disk() {
    let raw = pattern(2048);
    let (file, _) = wrapped_file(&raw);
    let mut disk = FixedVhd::open_file(File::open(file.path()).unwrap()).unwrap();

    assert_eq!(disk.seek(SeekFrom::Start(100)).unwrap(), 100);
    let mut buf = [0u8; 4];
    disk.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, &raw[100..104]);

    assert_eq!(disk.seek(SeekFrom::End(-4)).unwrap(), 2044);
    disk.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, &raw[2044..2048]);

    assert_eq!(disk.seek(SeekFrom::Current(-8)).unwrap(), 2040);
    assert!(disk.seek(SeekFrom::End(1)).is_err());
    assert!(disk.seek(SeekFrom::Current(-5000)).is_err());
    assert_eq!(disk.stream_position().unwrap(), 2040);
}

#[test]
fn writes_are_rejected() {
    let (file, _) = wrapped_file(&pattern(512));
    let mut disk = FixedVhd::open_file(File::open(file.path()).unwrap()).unwrap();
    let err = disk.write(&[1, 2, 3]).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
    assert!(err.to_string().contains("read-only"));
}

#[test]
fn unwrap_restores_payload() {
    let raw = pattern(3072);
    let (file, _) = wrapped_file(&raw);
    let disk = FixedVhd::open_file(File::open(file.path()).unwrap()).unwrap();

    let mut out = Vec::new();
    assert_eq!(disk.unwrap_to(&mut out).unwrap(), 3072);
    assert_eq!(out, raw);
}

#[test]
fn blank_image_opens() {
    let layout = PageBlobLayout::new(1 << 20, &LayoutPolicy::default()).unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let footer = create_blank(file.as_file_mut(), &layout, &FooterOptions::default()).unwrap();
    assert_eq!(file.as_file().metadata().unwrap().len(), layout.blob_size);

    let disk = FixedVhd::open_file(File::open(file.path()).unwrap()).unwrap();
    assert_eq!(disk.footer(), &footer);

    let mut buf = [0xffu8; 512];
    assert_eq!(disk.read_at(4096, &mut buf).unwrap(), 512);
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn rejects_truncated_image() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0u8; 100]).unwrap();
    file.flush().unwrap();
    assert!(matches!(
        FixedVhd::open_file(File::open(file.path()).unwrap()),
        Err(VhdError::MissingFooter { len: 100 })
    ));
}

#[test]
fn rejects_footer_larger_than_image() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&vhd::generate_footer(1 << 20)).unwrap();
    file.flush().unwrap();
    assert!(matches!(
        FixedVhd::open_file(File::open(file.path()).unwrap()),
        Err(VhdError::ImageTooSmall {
            len: 512,
            capacity: 1048576
        })
    ));
}

#[test]
fn rejects_footer_smaller_than_payload() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&pattern(4096)).unwrap();
    file.write_all(&vhd::generate_footer(1024)).unwrap();
    file.flush().unwrap();
    assert!(matches!(
        FixedVhd::open_file(File::open(file.path()).unwrap()),
        Err(VhdError::FooterOffsetMismatch {
            capacity: 1024,
            footer_offset: 4096
        })
    ));
}

#[test]
fn missing_footer_message() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let err = FixedVhd::open_file(File::open(file.path()).unwrap())
        .err()
        .unwrap();
    assert_eq!(
        err.to_string(),
        "Image of 0 bytes is too short to hold a VHD footer"
    );
}

#[test]
fn rejects_raw_image() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&pattern(4096)).unwrap();
    file.flush().unwrap();
    assert!(matches!(
        FixedVhd::open_file(File::open(file.path()).unwrap()),
        Err(VhdError::InvalidCookie)
    ));
}
