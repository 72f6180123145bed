//! Image container (C6)
//!
//! An [`Image`] owns its profile exclusively and holds exactly one of three
//! pixel buffer layouts at a time (spec.md §3, §9 "Heterogeneous pixel
//! buffers"). Rust lets us enforce that with an enum instead of the tagged
//! union + "authoritative flag" dance the C source uses in `image.c`.

use crate::error::{Error, Result};
use crate::pixelmath;
use crate::profile::Profile;

/// Which of the three pixel layouts an [`Image`] currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8 bits per channel, RGBA, row-major.
    U8,
    /// 16 bits per channel, RGBA, row-major.
    U16,
    /// 32-bit float per channel, RGBA, row-major.
    F32,
}

impl PixelFormat {
    /// Bytes per channel for this layout.
    pub fn bytes_per_channel(&self) -> usize {
        match self {
            PixelFormat::U8 => 1,
            PixelFormat::U16 => 2,
            PixelFormat::F32 => 4,
        }
    }
}

/// The single authoritative pixel buffer, always 4 channels (RGBA).
#[derive(Debug, Clone)]
pub enum PixelBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl PixelBuffer {
    /// The [`PixelFormat`] this buffer is currently in.
    pub fn format(&self) -> PixelFormat {
        match self {
            PixelBuffer::U8(_) => PixelFormat::U8,
            PixelBuffer::U16(_) => PixelFormat::U16,
            PixelBuffer::F32(_) => PixelFormat::F32,
        }
    }

    /// Number of RGBA pixels in the buffer.
    pub fn pixel_count(&self) -> usize {
        match self {
            PixelBuffer::U8(v) => v.len() / 4,
            PixelBuffer::U16(v) => v.len() / 4,
            PixelBuffer::F32(v) => v.len() / 4,
        }
    }
}

/// A decoded, in-memory image: dimensions, bit depth, profile, and pixels.
///
/// Invariant: `pixels.pixel_count() == width * height`.
#[derive(Debug, Clone)]
pub struct Image {
    width: u32,
    height: u32,
    /// Bits per channel as authored (8..16, or 32 for float); independent of
    /// which `PixelBuffer` variant currently holds the data, since a U16
    /// buffer may carry e.g. 10-bit samples left-justified in 16 bits.
    depth: u8,
    profile: Profile,
    pixels: PixelBuffer,
}

impl Image {
    /// Create a new image, cloning `profile` if given or building stock sRGB
    /// otherwise (spec.md §4.6 `create`).
    pub fn create(width: u32, height: u32, depth: u8, profile: Option<&Profile>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Validation(
                "image dimensions must be positive".into(),
            ));
        }
        let profile = match profile {
            Some(p) => p.clone(),
            None => Profile::create_stock("srgb")?,
        };
        let count = width as usize * height as usize;
        let pixels = if depth == 32 {
            PixelBuffer::F32(vec![0.0; count * 4])
        } else if depth <= 8 {
            PixelBuffer::U8(vec![0u8; count * 4])
        } else {
            PixelBuffer::U16(vec![0u16; count * 4])
        };
        Ok(Self {
            width,
            height,
            depth,
            profile,
            pixels,
        })
    }

    /// Build an image directly from a pre-populated pixel buffer.
    pub fn from_pixels(
        width: u32,
        height: u32,
        depth: u8,
        profile: Profile,
        pixels: PixelBuffer,
    ) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.pixel_count() != expected {
            return Err(Error::BufferSize {
                expected: expected * 4,
                actual: pixels.pixel_count() * 4,
            });
        }
        Ok(Self {
            width,
            height,
            depth,
            profile,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = profile;
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut PixelBuffer {
        &mut self.pixels
    }

    /// Set a single pixel's RGBA from normalized floats in [0, 1].
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [f32; 4]) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::Validation(format!(
                "pixel ({x},{y}) out of bounds for {}x{}",
                self.width, self.height
            )));
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        match &mut self.pixels {
            PixelBuffer::U8(buf) => {
                let max = 255.0f32;
                for c in 0..4 {
                    buf[idx + c] = pixelmath::round_half_even(rgba[c].clamp(0.0, 1.0) * max) as u8;
                }
            }
            PixelBuffer::U16(buf) => {
                let max = ((1u32 << self.depth.clamp(1, 16)) - 1) as f32;
                for c in 0..4 {
                    buf[idx + c] =
                        pixelmath::round_half_even(rgba[c].clamp(0.0, 1.0) * max) as u16;
                }
            }
            PixelBuffer::F32(buf) => {
                buf[idx..idx + 4].copy_from_slice(&rgba);
            }
        }
        Ok(())
    }

    /// Clip `(x, y, w, h)` against the image bounds, returning the clipped
    /// rect, or `None` if the intersection is empty (spec.md §4.6 `adjustRect`).
    pub fn adjust_rect(&self, x: i64, y: i64, w: i64, h: i64) -> Option<(u32, u32, u32, u32)> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i64);
        let y1 = (y + h).min(self.height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }

    /// Crop to `(x, y, w, h)`, replacing this image's pixels and dimensions.
    /// `keep_src` mirrors the C API's "don't destroy the original on failure"
    /// flag; in Rust this is simply: on an empty intersection, leave `self`
    /// untouched and return `Ok(false)`.
    pub fn crop(&mut self, x: i64, y: i64, w: i64, h: i64) -> Result<bool> {
        let Some((cx, cy, cw, ch)) = self.adjust_rect(x, y, w, h) else {
            return Ok(false);
        };
        let cropped = self.to_f32();
        let mut out = vec![0.0f32; cw as usize * ch as usize * 4];
        for row in 0..ch as usize {
            let src_row = (cy as usize + row) * self.width as usize + cx as usize;
            let dst_row = row * cw as usize;
            let src_off = src_row * 4;
            let dst_off = dst_row * 4;
            out[dst_off..dst_off + cw as usize * 4]
                .copy_from_slice(&cropped[src_off..src_off + cw as usize * 4]);
        }
        self.width = cw;
        self.height = ch;
        self.pixels = pixelmath::f32_buffer_to_depth(&out, self.depth);
        Ok(true)
    }

    /// Rotate the image by `turns` 90-degree clockwise quarter-turns
    /// (0..=3; negative values rotate counter-clockwise).
    pub fn rotate(&mut self, turns: i32) {
        let turns = turns.rem_euclid(4);
        if turns == 0 {
            return;
        }
        let src = self.to_f32();
        let (w, h) = (self.width as usize, self.height as usize);
        let (nw, nh) = if turns % 2 == 0 { (w, h) } else { (h, w) };
        let mut out = vec![0.0f32; nw * nh * 4];
        for y in 0..h {
            for x in 0..w {
                let (nx, ny) = match turns {
                    1 => (h - 1 - y, x),
                    2 => (w - 1 - x, h - 1 - y),
                    3 => (y, w - 1 - x),
                    _ => unreachable!(),
                };
                let src_off = (y * w + x) * 4;
                let dst_off = (ny * nw + nx) * 4;
                out[dst_off..dst_off + 4].copy_from_slice(&src[src_off..src_off + 4]);
            }
        }
        self.width = nw as u32;
        self.height = nh as u32;
        self.pixels = pixelmath::f32_buffer_to_depth(&out, self.depth);
    }

    /// Materialize the pixel buffer as normalized f32 RGBA, converting from
    /// whatever layout is currently authoritative ("prepare-read", spec.md §4.6).
    pub fn to_f32(&self) -> Vec<f32> {
        match &self.pixels {
            PixelBuffer::F32(buf) => buf.clone(),
            PixelBuffer::U8(buf) => pixelmath::unorm_to_float_u8(buf),
            PixelBuffer::U16(buf) => pixelmath::unorm_to_float_u16(buf, self.depth),
        }
    }

    /// Move the authoritative buffer to `fmt` ("prepare-write", spec.md §4.6),
    /// converting in place if it isn't already in that layout.
    pub fn prepare_write(&mut self, fmt: PixelFormat) {
        if self.pixels.format() == fmt {
            return;
        }
        let floats = self.to_f32();
        self.pixels = match fmt {
            PixelFormat::F32 => PixelBuffer::F32(floats),
            PixelFormat::U8 => PixelBuffer::U8(pixelmath::float_to_unorm_u8(&floats)),
            PixelFormat::U16 => PixelBuffer::U16(pixelmath::float_to_unorm_u16(&floats, self.depth)),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults_to_srgb() {
        let img = Image::create(4, 4, 8, None).unwrap();
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 4);
        assert!(matches!(img.pixels(), PixelBuffer::U8(_)));
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(Image::create(0, 4, 8, None).is_err());
    }

    #[test]
    fn adjust_rect_clips_to_bounds() {
        let img = Image::create(10, 10, 8, None).unwrap();
        assert_eq!(img.adjust_rect(-2, -2, 5, 5), Some((0, 0, 3, 3)));
        assert_eq!(img.adjust_rect(8, 8, 5, 5), Some((8, 8, 2, 2)));
        assert_eq!(img.adjust_rect(20, 20, 5, 5), None);
    }

    #[test]
    fn rotate_cw_swaps_dimensions() {
        let mut img = Image::create(4, 2, 8, None).unwrap();
        img.set_pixel(0, 0, [1.0, 0.0, 0.0, 1.0]).unwrap();
        img.rotate(1);
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 4);
    }

    #[test]
    fn crop_shrinks_image() {
        let mut img = Image::create(10, 10, 8, None).unwrap();
        assert!(img.crop(2, 2, 4, 4).unwrap());
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 4);
    }
}
