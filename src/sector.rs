use std::io::{Read, Seek, SeekFrom};

use log::warn;

use crate::bytes_ext::ReadBytesExt;

/// Physical geometry of the gapped stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorLayout {
    pub sector_size: usize,
    /// Usable bytes at the start of each sector.
    pub payload_size: usize,
    /// Bytes skipped after a full payload chunk.
    pub gap_size: usize,
}

impl SectorLayout {
    /// Raw 2352-byte mode-1 sectors. The 0x130 gap is EDC/ECC plus the next
    /// sector's sync and header.
    pub const CD_MODE1: SectorLayout = SectorLayout {
        sector_size: 0x930,
        payload_size: 0x800,
        gap_size: 0x130,
    };

    /// Physical bytes consumed when demultiplexing `logical_len` bytes.
    pub fn physical_len(&self, logical_len: usize) -> u64 {
        (logical_len.div_ceil(self.payload_size) * self.sector_size) as u64
    }
}

/// Reassembles `dst.len()` logical bytes from the gapped stream starting at
/// the reader's position, leaving the reader at the start of the next
/// sector.
///
/// A short read or a failed seek does not fail: the rest of `dst` is zeroed
/// and the number of bytes actually recovered is returned.
pub fn demux<R: Read + Seek>(r: &mut R, layout: &SectorLayout, dst: &mut [u8]) -> usize {
    let total = dst.len();
    let mut done = 0;

    while done < total {
        let remaining = total - done;
        let (chunk, skip) = if remaining >= layout.payload_size {
            (layout.payload_size, layout.gap_size)
        } else {
            // A partial chunk still owns its whole sector.
            (remaining, layout.sector_size - remaining)
        };

        let got = r.read_up_to(&mut dst[done..done + chunk]);
        done += got;
        if got < chunk {
            warn!(
                "short read: recovered {} of {} payload bytes, zero-filling the rest",
                done, total
            );
            dst[done..].fill(0);
            return done;
        }

        if let Err(e) = r.seek(SeekFrom::Current(skip as i64)) {
            warn!(
                "seek failed after {} of {} payload bytes, zero-filling the rest: {}",
                done, total, e
            );
            dst[done..].fill(0);
            return done;
        }
    }

    done
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LAYOUT: SectorLayout = SectorLayout::CD_MODE1;

    /// Builds `sectors` physical sectors whose payload bytes count up from
    /// `seed`, staying below 0xe0. Each gap is filled with its own
    /// sentinel, `0xe0 + sector`.
    fn gapped(sectors: usize, seed: u8) -> (Vec<u8>, Vec<u8>) {
        let mut physical = Vec::new();
        let mut logical = Vec::new();
        for s in 0..sectors {
            let chunk = (0..LAYOUT.payload_size)
                .map(|i| ((seed as usize + i + s * 7) % 0xe0) as u8)
                .collect::<Vec<_>>();
            physical.extend_from_slice(&chunk);
            physical.extend(std::iter::repeat(0xe0 + s as u8).take(LAYOUT.gap_size));
            logical.extend_from_slice(&chunk);
        }
        (physical, logical)
    }

    #[test]
    fn strips_gaps_between_full_chunks() {
        let (physical, logical) = gapped(3, 1);
        let mut r = Cursor::new(physical.as_slice());
        let mut dst = vec![0u8; logical.len()];

        assert_eq!(demux(&mut r, &LAYOUT, &mut dst), logical.len());
        assert_eq!(dst, logical);
        assert!(dst.iter().all(|&b| b < 0xe0));
        assert_eq!(r.position(), 3 * LAYOUT.sector_size as u64);
    }

    #[test]
    fn partial_chunk_skips_rest_of_sector() {
        let (mut physical, logical) = gapped(2, 9);
        physical.extend(std::iter::repeat(0x55).take(LAYOUT.sector_size));
        let wanted = LAYOUT.payload_size + 100;
        let mut r = Cursor::new(physical.as_slice());
        let mut dst = vec![0u8; wanted];

        demux(&mut r, &LAYOUT, &mut dst);
        assert_eq!(dst, logical[..wanted]);
        assert_eq!(r.position(), 2 * LAYOUT.sector_size as u64);
        assert_eq!(r.position(), LAYOUT.physical_len(wanted));

        let mut next = [0u8; 1];
        r.read_exact(&mut next).unwrap();
        assert_eq!(next[0], 0x55);
    }

    #[test]
    fn custom_gap_is_honoured() {
        let layout = SectorLayout {
            sector_size: 6,
            payload_size: 4,
            gap_size: 2,
        };
        let physical = [1u8, 2, 3, 4, 0, 0, 5, 6, 7, 8, 0, 0, 9, 0xff, 0xff, 0xff];
        let mut r = Cursor::new(&physical[..]);
        let mut dst = [0u8; 9];
        demux(&mut r, &layout, &mut dst);
        assert_eq!(dst, [1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(r.position(), 18);
    }

    #[test]
    fn truncated_stream_is_zero_filled() {
        let (physical, logical) = gapped(2, 3);
        let cut = LAYOUT.sector_size + 10;
        let mut r = Cursor::new(&physical[..cut]);
        let mut dst = vec![0xaau8; 2 * LAYOUT.payload_size];

        let got = demux(&mut r, &LAYOUT, &mut dst);
        assert_eq!(got, LAYOUT.payload_size + 10);
        assert_eq!(dst[..got], logical[..got]);
        assert!(dst[got..].iter().all(|&b| b == 0));
    }

    /// Reads normally but refuses every seek.
    struct NoSeek<'a>(Cursor<&'a [u8]>);

    impl Read for NoSeek<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Seek for NoSeek<'_> {
        fn seek(&mut self, _: SeekFrom) -> std::io::Result<u64> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "seek refused"))
        }
    }

    #[test]
    fn failed_seek_is_zero_filled() {
        let (physical, logical) = gapped(2, 5);
        let mut r = NoSeek(Cursor::new(physical.as_slice()));
        let mut dst = vec![0xaau8; 2 * LAYOUT.payload_size];

        let got = demux(&mut r, &LAYOUT, &mut dst);
        assert_eq!(got, LAYOUT.payload_size);
        assert_eq!(dst[..got], logical[..got]);
        assert!(dst[got..].iter().all(|&b| b == 0));
    }
}
