use std::{fs::File, io::BufWriter, path::Path};

use crate::error::Error;

/// One decoded RGB8 frame, row-major with no row padding.
pub struct Frame {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        let data = vec![0u8; width * height * 3];
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn write_pixel(&mut self, x: usize, y: usize, rgb: &[u8]) {
        if x < self.width && y < self.height {
            let i = 3 * (y * self.width + x);
            self.data[i..i + 3].copy_from_slice(rgb);
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let i = 3 * (y * self.width + x);
        &self.data[i..i + 3]
    }

    pub fn write_png(&self, path: &Path) -> Result<(), Error> {
        let file = File::create(path)?;
        let w = &mut BufWriter::new(file);

        let mut encoder = png::Encoder::new(w, self.width as u32, self.height as u32);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(self.data())?;

        Ok(())
    }
}
