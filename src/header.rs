use std::io::Read;

use crate::{bytes_ext::ReadBytesExt, error::HeaderError};

pub const MAGIC: &[u8; 16] = b"HuVIDEO         ";

/// Size of the header block on disc, trailer included. The palette follows it.
pub const HEADER_SIZE: u64 = 0x20;

const MAX_DIMENSION: u16 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Bg = 0,
    Spr = 1,
}

impl TryFrom<u8> for Format {
    type Error = HeaderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Format::Bg),
            1 => Ok(Format::Spr),
            v => Err(HeaderError::InvalidFormat(v)),
        }
    }
}

/// Which trailer follows the fixed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HeaderLayout {
    /// No trailer is read.
    Bare,
    /// 8 opaque bytes.
    Opaque,
    /// ADPCM length followed by 6 opaque bytes.
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trailer {
    None,
    Opaque([u16; 4]),
    Audio { adpcm_len: u16, unknown: [u16; 3] },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipHeader {
    pub frame_count: u16,
    pub width: u16,
    pub height: u16,
    pub palette_flag: u8,
    pub format: Format,
    pub trailer: Trailer,
}

impl ClipHeader {
    pub fn adpcm_len(&self) -> u16 {
        match self.trailer {
            Trailer::Audio { adpcm_len, .. } => adpcm_len,
            _ => 0,
        }
    }

    /// Opaque trailer words, not counting the ADPCM length.
    pub fn unknown(&self) -> &[u16] {
        match &self.trailer {
            Trailer::None => &[],
            Trailer::Opaque(words) => words,
            Trailer::Audio { unknown, .. } => unknown,
        }
    }

    /// Planar payload bytes per frame, 4 bits per pixel.
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 4 / 8
    }
}

fn field_u8<R: Read>(r: &mut R, name: &'static str) -> Result<u8, HeaderError> {
    r.read_u8().map_err(|_| HeaderError::Truncated(name))
}

fn field_u16<R: Read>(r: &mut R, name: &'static str) -> Result<u16, HeaderError> {
    r.read_le_u16().map_err(|_| HeaderError::Truncated(name))
}

/// Parses a header at the reader's current position. On failure the reader
/// is left wherever the failing read stopped.
pub fn parse_header<R: Read>(r: &mut R, layout: HeaderLayout) -> Result<ClipHeader, HeaderError> {
    let mut id = [0u8; 16];
    r.read_exact(&mut id)
        .map_err(|_| HeaderError::Truncated("header ID"))?;
    if &id != MAGIC {
        return Err(HeaderError::BadMagic);
    }

    let frame_count = field_u16(r, "frame count")?;
    let width = field_u16(r, "frame width")?;
    let height = field_u16(r, "frame height")?;
    if !(1..=MAX_DIMENSION).contains(&width) || !(1..=MAX_DIMENSION).contains(&height) {
        return Err(HeaderError::InvalidDimension { width, height });
    }
    let palette_flag = field_u8(r, "palette flag")?;
    let format = Format::try_from(field_u8(r, "format")?)?;

    let trailer = match layout {
        HeaderLayout::Bare => Trailer::None,
        HeaderLayout::Opaque => {
            let mut words = [0u16; 4];
            for w in words.iter_mut() {
                *w = field_u16(r, "trailer")?;
            }
            Trailer::Opaque(words)
        }
        HeaderLayout::Audio => {
            let adpcm_len = field_u16(r, "ADPCM length")?;
            let mut unknown = [0u16; 3];
            for w in unknown.iter_mut() {
                *w = field_u16(r, "trailer")?;
            }
            Trailer::Audio { adpcm_len, unknown }
        }
    };

    Ok(ClipHeader {
        frame_count,
        width,
        height,
        palette_flag,
        format,
        trailer,
    })
}

#[cfg(test)]
pub(crate) fn header_bytes(
    frame_count: u16,
    width: u16,
    height: u16,
    format: u8,
    trailer: [u8; 8],
) -> Vec<u8> {
    let mut v = MAGIC.to_vec();
    v.extend_from_slice(&frame_count.to_le_bytes());
    v.extend_from_slice(&width.to_le_bytes());
    v.extend_from_slice(&height.to_le_bytes());
    v.push(0x01);
    v.push(format);
    v.extend_from_slice(&trailer);
    v
}
