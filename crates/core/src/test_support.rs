//! Byte-level fixtures shared by unit tests.

use chrono::{DateTime, Local, TimeZone, Utc};
use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use filetime::FileTime;
use std::io::Cursor;
use std::path::Path;

const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

/// A JPEG whose only content is an APP1 segment holding the given ASCII tags.
pub fn jpeg_with_exif(tags: &[(Tag, &str)]) -> Vec<u8> {
    let fields: Vec<Field> = tags
        .iter()
        .map(|(tag, value)| Field {
            tag: *tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![value.as_bytes().to_vec()]),
        })
        .collect();

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).expect("write exif");
    let tiff = tiff.into_inner();

    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    let segment_len = u16::try_from(2 + 6 + tiff.len()).expect("segment fits");
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

fn riff_chunk(id: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 9);
    out.extend_from_slice(id);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn riff_list(list_type: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let mut data = list_type.to_vec();
    for child in children {
        data.extend_from_slice(child);
    }
    riff_chunk(b"LIST", &data)
}

/// An AVI with `IDIT` nested inside `hdrl`, followed by a `movi` list.
pub fn avi_with_idit(idit: &str) -> Vec<u8> {
    let mut idit_bytes = idit.as_bytes().to_vec();
    idit_bytes.push(0);

    let hdrl = riff_list(
        b"hdrl",
        &[riff_chunk(b"avih", &[0u8; 56]), riff_chunk(b"IDIT", &idit_bytes)],
    );
    let movi = riff_list(b"movi", &[riff_chunk(b"00dc", &[1, 2, 3, 4])]);

    let mut body = b"AVI ".to_vec();
    body.extend_from_slice(&hdrl);
    body.extend_from_slice(&movi);
    riff_chunk(b"RIFF", &body)
}

fn qt_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend_from_slice(&((payload.len() + 8) as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

fn mac_seconds(created: DateTime<Utc>) -> i64 {
    created.timestamp() + MAC_EPOCH_OFFSET
}

fn mp4_with_mvhd(mvhd: Vec<u8>) -> Vec<u8> {
    let mut out = qt_box(b"ftyp", b"isom\0\0\x02\0isomiso2mp41");
    let trak = qt_box(b"trak", &qt_box(b"tkhd", &[0u8; 84]));
    let mut moov_payload = qt_box(b"mvhd", &mvhd);
    moov_payload.extend_from_slice(&trak);
    out.extend_from_slice(&qt_box(b"moov", &moov_payload));
    out.extend_from_slice(&qt_box(b"mdat", &[0u8; 16]));
    out
}

/// An MP4 with a version 0 `mvhd` carrying `created`.
pub fn mp4_with_created(created: DateTime<Utc>) -> Vec<u8> {
    let mut mvhd = vec![0u8, 0, 0, 0];
    mvhd.extend_from_slice(&(mac_seconds(created) as u32).to_be_bytes());
    mvhd.extend_from_slice(&(mac_seconds(created) as u32).to_be_bytes());
    mvhd.extend_from_slice(&[0u8; 92]);
    mp4_with_mvhd(mvhd)
}

/// A QuickTime file with a version 1 (64-bit) `mvhd`.
pub fn mp4_with_created_v1(created: DateTime<Utc>) -> Vec<u8> {
    let mut mvhd = vec![1u8, 0, 0, 0];
    mvhd.extend_from_slice(&(mac_seconds(created) as u64).to_be_bytes());
    mvhd.extend_from_slice(&(mac_seconds(created) as u64).to_be_bytes());
    mvhd.extend_from_slice(&[0u8; 96]);
    mp4_with_mvhd(mvhd)
}

pub fn local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("unambiguous local time")
}

pub fn set_mtime(path: &Path, date: DateTime<Local>) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(date.timestamp(), 0))
        .expect("set mtime");
}
