use itertools::iproduct;

use crate::{frame::Frame, pal::Palette};

pub const TILE_SIZE: usize = 8;
const TILE_BYTES: usize = 32;

/// Converts planar 8x8 background tiles to RGB8.
///
/// Each 32-byte tile holds bitplanes 0-1 as 8 byte pairs followed by
/// bitplanes 2-3 as 8 more. Tiles are stored row-major.
pub fn draw_tiles(frame: &mut Frame, src: &[u8], pal: &Palette) {
    let tiles_w = frame.width() / TILE_SIZE;
    let tiles_h = frame.height() / TILE_SIZE;

    for (ty, tx) in iproduct!(0..tiles_h, 0..tiles_w) {
        let tile = &src[(ty * tiles_w + tx) * TILE_BYTES..][..TILE_BYTES];
        for y in 0..TILE_SIZE {
            let mut planes = [tile[2 * y], tile[2 * y + 1], tile[16 + 2 * y], tile[17 + 2 * y]];
            let py = ty * TILE_SIZE + y;

            // Lowest bit is the rightmost pixel.
            for x in (0..TILE_SIZE).rev() {
                let index = (planes[0] & 1)
                    | ((planes[1] & 1) << 1)
                    | ((planes[2] & 1) << 2)
                    | ((planes[3] & 1) << 3);
                frame.write_pixel(tx * TILE_SIZE + x, py, pal.rgb(index));
                for p in planes.iter_mut() {
                    *p >>= 1;
                }
            }
        }
    }
}
