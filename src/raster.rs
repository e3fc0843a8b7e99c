//! Raster accumulation and colour handling.

use crate::modes::Target;

/// Decoded image raster.
///
/// Three channels per pixel, stored as wide integers: pixel averages can
/// reach 256 at full white and the PD colour conversion needs signed
/// headroom. Values are clamped to the 8 bit range on the way out.
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<i32>,
}

impl Raster {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    pub fn get(&self, row: usize, x: usize, channel: usize) -> i32 {
        self.data[(row * self.width + x) * 3 + channel]
    }

    pub fn set(&mut self, target: Target, value: i32) {
        self.data[(target.row * self.width + target.x) * 3 + target.channel] = value;
    }

    /// In-place YCbCr to RGB conversion for PD rasters.
    ///
    /// Channels hold luminance, Cr and Cb until this runs. Same integer
    /// coefficients the PD encoders use, clamped to avoid overflow artefacts
    /// on noisy input.
    pub fn ycbcr_to_rgb(&mut self) {
        for row in 0..self.height {
            for col in 0..self.width {
                let y = self.get(row, col, 0);
                let cr = self.get(row, col, 1) - 128;
                let cb = self.get(row, col, 2) - 128;

                let r = y + 45 * cr / 32;
                let g = y - (11 * cb + 23 * cr) / 32;
                let b = y + 113 * cb / 64;

                self.set(Target { row, x: col, channel: 0 }, clamp(r));
                self.set(Target { row, x: col, channel: 1 }, clamp(g));
                self.set(Target { row, x: col, channel: 2 }, clamp(b));
            }
        }
    }

    /// Convert to an 8 bit RGB image, clamping each channel.
    pub fn to_image(&self) -> image::RgbImage {
        let mut img = image::RgbImage::new(self.width as u32, self.height as u32);

        for row in 0..self.height {
            for col in 0..self.width {
                img.put_pixel(
                    col as u32,
                    row as u32,
                    image::Rgb([
                        clamp(self.get(row, col, 0)) as u8,
                        clamp(self.get(row, col, 1)) as u8,
                        clamp(self.get(row, col, 2)) as u8,
                    ]),
                );
            }
        }

        img
    }
}

fn clamp(value: i32) -> i32 {
    value.max(0).min(255)
}
