//! Minimal readers for the date fields of AVI (RIFF) and QuickTime/MP4 files.

use chrono::{DateTime, TimeZone, Utc};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use thiserror::Error;

const MAX_LIST_DEPTH: usize = 4;
const MAX_IDIT_LEN: u64 = 256;
/// Seconds between 1904-01-01 and 1970-01-01.
const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;
const QUICKTIME_TOP_LEVEL: &[&[u8; 4]] = &[
    b"ftyp", b"moov", b"mdat", b"wide", b"free", b"skip", b"pnot", b"uuid",
];

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("未対応のコンテナ形式です")]
    UnknownFormat,
    #[error("{0} が途中で切れています")]
    Truncated(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDates {
    /// Text of the RIFF `IDIT` chunk.
    pub avi_original: Option<String>,
    /// `mvhd` creation time.
    pub movie_created: Option<DateTime<Utc>>,
}

pub fn read_container_dates(path: &Path) -> Result<ContainerDates, ContainerError> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len < 12 {
        return Err(ContainerError::UnknownFormat);
    }

    let mut reader = BufReader::new(file);
    let mut head = [0u8; 12];
    reader.read_exact(&mut head)?;

    if &head[0..4] == b"RIFF" && &head[8..12] == b"AVI " {
        let declared = u32::from_le_bytes([head[4], head[5], head[6], head[7]]) as u64;
        let end = declared.saturating_add(8).min(len);
        let idit = find_riff_chunk(&mut reader, 12, end, b"IDIT", 0)?;
        return Ok(ContainerDates {
            avi_original: idit.map(|bytes| String::from_utf8_lossy(&bytes).to_string()),
            movie_created: None,
        });
    }

    if QUICKTIME_TOP_LEVEL.iter().any(|kind| &head[4..8] == kind.as_slice()) {
        return Ok(ContainerDates {
            avi_original: None,
            movie_created: read_movie_created(&mut reader, len)?,
        });
    }

    Err(ContainerError::UnknownFormat)
}

fn find_riff_chunk<R: Read + Seek>(
    reader: &mut R,
    mut pos: u64,
    end: u64,
    target: &[u8; 4],
    depth: usize,
) -> Result<Option<Vec<u8>>, ContainerError> {
    while pos + 8 <= end {
        reader.seek(SeekFrom::Start(pos))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as u64;
        let data_start = pos + 8;
        let data_end = data_start
            .checked_add(size)
            .filter(|v| *v <= end)
            .ok_or(ContainerError::Truncated("RIFFチャンク"))?;

        if &header[0..4] == target {
            let mut data = vec![0u8; size.min(MAX_IDIT_LEN) as usize];
            reader.read_exact(&mut data)?;
            return Ok(Some(data));
        }

        if &header[0..4] == b"LIST" && size >= 4 && depth < MAX_LIST_DEPTH {
            let mut list_type = [0u8; 4];
            reader.read_exact(&mut list_type)?;
            // movi holds the stream data and never carries IDIT
            if &list_type != b"movi" {
                if let Some(found) =
                    find_riff_chunk(reader, data_start + 4, data_end, target, depth + 1)?
                {
                    return Ok(Some(found));
                }
            }
        }

        pos = data_end + (size & 1);
    }
    Ok(None)
}

fn read_movie_created<R: Read + Seek>(
    reader: &mut R,
    len: u64,
) -> Result<Option<DateTime<Utc>>, ContainerError> {
    let Some((moov_start, moov_end)) = find_box(reader, 0, len, b"moov")? else {
        return Ok(None);
    };
    let Some((mvhd_start, mvhd_end)) = find_box(reader, moov_start, moov_end, b"mvhd")? else {
        return Ok(None);
    };

    reader.seek(SeekFrom::Start(mvhd_start))?;
    let mut version_flags = [0u8; 4];
    reader.read_exact(&mut version_flags)?;

    let seconds = if version_flags[0] == 1 {
        if mvhd_start + 12 > mvhd_end {
            return Err(ContainerError::Truncated("mvhd"));
        }
        let mut raw = [0u8; 8];
        reader.read_exact(&mut raw)?;
        u64::from_be_bytes(raw)
    } else {
        if mvhd_start + 8 > mvhd_end {
            return Err(ContainerError::Truncated("mvhd"));
        }
        let mut raw = [0u8; 4];
        reader.read_exact(&mut raw)?;
        u32::from_be_bytes(raw) as u64
    };

    Ok(mac_seconds_to_utc(seconds))
}

/// Returns the payload range of the first `target` box between `pos` and `end`.
fn find_box<R: Read + Seek>(
    reader: &mut R,
    mut pos: u64,
    end: u64,
    target: &[u8; 4],
) -> Result<Option<(u64, u64)>, ContainerError> {
    while pos + 8 <= end {
        reader.seek(SeekFrom::Start(pos))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);

        let (header_len, box_size) = match size {
            0 => (8, end - pos),
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large)?;
                (16, u64::from_be_bytes(large))
            }
            n => (8, n as u64),
        };
        if box_size < header_len {
            return Err(ContainerError::Truncated("QuickTimeボックス"));
        }
        let box_end = pos
            .checked_add(box_size)
            .filter(|v| *v <= end)
            .ok_or(ContainerError::Truncated("QuickTimeボックス"))?;

        if &header[4..8] == target {
            return Ok(Some((pos + header_len, box_end)));
        }
        pos = box_end;
    }
    Ok(None)
}

fn mac_seconds_to_utc(seconds: u64) -> Option<DateTime<Utc>> {
    if seconds == 0 {
        return None;
    }
    let unix = i64::try_from(seconds).ok()?.checked_sub(MAC_EPOCH_OFFSET)?;
    Utc.timestamp_opt(unix, 0).single()
}
