//! Image dimension probing for downloaded cover art.
//!
//! Library covers must be exactly 600×900 pixels, so candidates are
//! checked before anything is written to the grid directory. Dimensions
//! are sniffed from the container headers alone (PNG `IHDR`, JPEG SOF
//! markers); no pixel data is decoded.

// ============================================================
// CONSTANTS
// ============================================================

/// Required cover width for the grid view
pub const COVER_WIDTH: u32 = 600;

/// Required cover height for the grid view
pub const COVER_HEIGHT: u32 = 900;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8];

/// Error types for dimension probing
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("not a PNG or JPEG image")]
    UnsupportedFormat,
    #[error("image header truncated or malformed")]
    Truncated,
}

// ============================================================
// PROBING
// ============================================================

/// Sniff `(width, height)` from the first bytes of an image file.
///
/// Supports PNG and JPEG, the two formats the cover service delivers.
pub fn probe_dimensions(data: &[u8]) -> Result<(u32, u32), ProbeError> {
    if data.starts_with(PNG_SIGNATURE) {
        probe_png(data)
    } else if data.starts_with(JPEG_SIGNATURE) {
        probe_jpeg(data)
    } else {
        Err(ProbeError::UnsupportedFormat)
    }
}

/// Whether the bytes hold an image with the exact cover dimensions.
#[must_use]
pub fn is_cover_sized(data: &[u8]) -> bool {
    matches!(probe_dimensions(data), Ok((COVER_WIDTH, COVER_HEIGHT)))
}

fn probe_png(data: &[u8]) -> Result<(u32, u32), ProbeError> {
    if data.len() >= 24 && &data[12..16] == b"IHDR" {
        Ok((read_be_u32(data, 16)?, read_be_u32(data, 20)?))
    } else if data.len() >= 16 {
        // Chunk layout without the IHDR tag, seen in very old encoders
        Ok((read_be_u32(data, 8)?, read_be_u32(data, 12)?))
    } else {
        Err(ProbeError::Truncated)
    }
}

/// Walk the JPEG marker segments to the first SOF frame header.
fn probe_jpeg(data: &[u8]) -> Result<(u32, u32), ProbeError> {
    let mut index: usize = 0;
    let mut size: usize = 2;
    loop {
        index = index.checked_add(size).ok_or(ProbeError::Truncated)?;
        while *data.get(index).ok_or(ProbeError::Truncated)? == 0xFF {
            index += 1;
        }
        let marker = *data.get(index).ok_or(ProbeError::Truncated)?;
        index += 1;
        size = read_be_u16(data, index)? as usize;
        // A segment length counts its own two bytes; anything shorter is
        // malformed and would stall the walk
        if size < 2 {
            return Err(ProbeError::Truncated);
        }

        if matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            // SOFn: skip the length bytes and the precision byte
            let height = read_be_u16(data, index + 3)?;
            let width = read_be_u16(data, index + 5)?;
            return Ok((u32::from(width), u32::from(height)));
        }
    }
}

fn read_be_u16(data: &[u8], offset: usize) -> Result<u16, ProbeError> {
    data.get(offset..offset + 2)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u16::from_be_bytes)
        .ok_or(ProbeError::Truncated)
}

fn read_be_u32(data: &[u8], offset: usize) -> Result<u32, ProbeError> {
    data.get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or(ProbeError::Truncated)
}

// ============================================================
// TESTS
// ============================================================
