use crate::{frame::Frame, pal::Palette};

pub const CELL_SIZE: usize = 16;
const CELL_BYTES: usize = 0x80;

fn cell_word(cell: &[u8], i: usize) -> u16 {
    u16::from_le_bytes([cell[2 * i], cell[2 * i + 1]])
}

/// Top-left pixel of the cell stored at position `i` of macro column `j`.
///
/// Storage neighbours pair up side by side into 32x16 blocks, which then
/// stack downwards before moving to the next 32-pixel column.
pub fn cell_origin(i: usize, j: usize) -> (usize, usize) {
    ((i & 1) * CELL_SIZE + j * 2 * CELL_SIZE, (i >> 1) * CELL_SIZE)
}

fn draw_cell(frame: &mut Frame, cell: &[u8], u: usize, v: usize, pal: &Palette) {
    for y in 0..CELL_SIZE {
        // Plane words sit 16 words apart.
        let mut planes = [
            cell_word(cell, y),
            cell_word(cell, 16 + y),
            cell_word(cell, 32 + y),
            cell_word(cell, 48 + y),
        ];

        for x in (0..CELL_SIZE).rev() {
            let index = (planes[0] & 1)
                | ((planes[1] & 1) << 1)
                | ((planes[2] & 1) << 2)
                | ((planes[3] & 1) << 3);
            frame.write_pixel(u + x, v + y, pal.rgb(index as u8));
            for p in planes.iter_mut() {
                *p >>= 1;
            }
        }
    }
}

/// Converts 16x16 sprite cells (0x80 bytes each) to RGB8.
///
/// When the width is an odd number of cells, the cells left over after the
/// last full macro column are stacked down a single 16-pixel column.
pub fn draw_sprites(frame: &mut Frame, src: &[u8], pal: &Palette) {
    let cells_w = frame.width() / CELL_SIZE;
    let cells_h = frame.height() / CELL_SIZE;
    let column_cells = 2 * cells_h;
    let full_columns = cells_w / 2;
    let paired = full_columns * column_cells;

    for (k, cell) in src
        .chunks_exact(CELL_BYTES)
        .take(cells_w * cells_h)
        .enumerate()
    {
        let (u, v) = if k < paired {
            cell_origin(k % column_cells, k / column_cells)
        } else {
            (full_columns * 2 * CELL_SIZE, (k - paired) * CELL_SIZE)
        };
        draw_cell(frame, cell, u, v, pal);
    }
}
