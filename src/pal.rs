use std::io::Read;

use crate::error::Error;

pub const PALETTE_BLOCK_SIZE: usize = 0x20;

/// 16 RGB8 colors decoded from a packed 9-bit GRB palette block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette([u8; 48]);

fn scale_3bit_to_8bit(c: u8) -> u8 {
    // Truncating on purpose: 3/7 gives 109, not 110.
    (255 * (c as u16) / 7) as u8
}

impl Palette {
    pub fn decode(block: &[u8; PALETTE_BLOCK_SIZE]) -> Self {
        let mut pal = [0u8; 48];
        for i in 0..16 {
            let lo = block[2 * i];
            let hi = block[2 * i + 1];
            let r = (lo >> 3) & 0x07;
            // Green straddles both bytes. Masked to the 3 bits a hardware color
            // carries: the unmasked 5-bit value wraps, (0xff, 0xff) would give 105.
            let g = (((lo >> 6) & 0x07) | ((hi & 0x07) << 2)) & 0x07;
            let b = lo & 0x07;
            pal[3 * i] = scale_3bit_to_8bit(r);
            pal[3 * i + 1] = scale_3bit_to_8bit(g);
            pal[3 * i + 2] = scale_3bit_to_8bit(b);
        }
        Palette(pal)
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, Error> {
        let mut block = [0u8; PALETTE_BLOCK_SIZE];
        r.read_exact(&mut block)
            .map_err(|_| Error::PaletteTruncated)?;
        Ok(Self::decode(&block))
    }

    /// The RGB triple for color index `i`, ready to copy into a frame.
    #[inline]
    pub fn rgb(&self, i: u8) -> &[u8] {
        let i = (i & 0x0f) as usize;
        &self.0[3 * i..3 * i + 3]
    }

    pub fn as_slice(&self) -> &[u8; 48] {
        &self.0
    }
}
