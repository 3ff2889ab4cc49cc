use std::io::{Read, Seek, SeekFrom};

use crate::{bytes_ext::ReadBytesExt, error::AudioError, sector::SectorLayout};

/// Header and palette occupy the start of the first audio sector.
pub const AUDIO_SUBHEADER_SIZE: usize = 0x40;

/// Collects `len` bytes of ADPCM payload from the clip starting at `base`.
///
/// Each sector is addressed from `base` directly, so the reader position on
/// entry does not matter. The payload itself is not decoded.
pub fn extract_audio<R: Read + Seek>(
    r: &mut R,
    layout: &SectorLayout,
    base: u64,
    len: usize,
) -> Result<Vec<u8>, AudioError> {
    let mut data = vec![0u8; len];
    let mut done = 0;
    let mut sector = 0u64;

    while done < len {
        let skip = if sector == 0 { AUDIO_SUBHEADER_SIZE } else { 0 };
        let chunk = (len - done).min(layout.payload_size - skip);

        r.seek(SeekFrom::Start(
            base + sector * layout.sector_size as u64 + skip as u64,
        ))?;
        let got = r.read_up_to(&mut data[done..done + chunk]);
        done += got;
        if got < chunk {
            return Err(AudioError::ShortRead {
                expected: len,
                got: done,
            });
        }
        sector += 1;
    }

    Ok(data)
}
