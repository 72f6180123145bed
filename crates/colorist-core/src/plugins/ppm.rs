//! Uncompressed NetPBM PPM (P6) codec plugin.
//!
//! PPM carries no alpha channel and no embedded ICC profile, so reads always
//! assume alpha=1.0 and stock sRGB, and writes silently drop alpha. This is
//! the simplest possible format for proving the plugin trait and the planner
//! sequence actually move bytes end to end; it is not meant to be a
//! general-purpose image format.

use crate::error::{Error, Result};
use crate::image::{Image, PixelBuffer};
use crate::profile::Profile;
use crate::registry::{DepthPolicy, FormatPlugin, WriteParams};

pub struct PpmPlugin;

impl FormatPlugin for PpmPlugin {
    fn name(&self) -> &'static str {
        "ppm"
    }

    fn description(&self) -> &'static str {
        "Uncompressed NetPBM PPM (P6), 8-bit RGB, no alpha"
    }

    fn mime_type(&self) -> &'static str {
        "image/x-portable-pixmap"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ppm", "pnm"]
    }

    fn depth_policy(&self) -> DepthPolicy {
        DepthPolicy::Fixed(8)
    }

    fn detect(&self, header: &[u8]) -> bool {
        header.starts_with(b"P6")
    }

    fn read(&self, raw: &[u8]) -> Result<Image> {
        let mut cursor = Cursor::new(raw);
        let magic = cursor.token()?;
        if magic != "P6" {
            return Err(Error::Input(format!("not a PPM (P6) file: magic {magic:?}")));
        }
        let width: u32 = cursor
            .token()?
            .parse()
            .map_err(|_| Error::Input("bad PPM width".into()))?;
        let height: u32 = cursor
            .token()?
            .parse()
            .map_err(|_| Error::Input("bad PPM height".into()))?;
        let maxval: u32 = cursor
            .token()?
            .parse()
            .map_err(|_| Error::Input("bad PPM maxval".into()))?;
        if maxval != 255 {
            return Err(Error::Unsupported(format!(
                "only maxval=255 PPM is supported, got {maxval}"
            )));
        }
        // Exactly one whitespace byte separates the header from binary data.
        let body = cursor.remainder_after_single_space()?;
        let expected = width as usize * height as usize * 3;
        if body.len() < expected {
            return Err(Error::Input(format!(
                "PPM body truncated: expected {expected} bytes, got {}",
                body.len()
            )));
        }

        let mut rgba = vec![0u8; width as usize * height as usize * 4];
        for i in 0..(width as usize * height as usize) {
            rgba[i * 4] = body[i * 3];
            rgba[i * 4 + 1] = body[i * 3 + 1];
            rgba[i * 4 + 2] = body[i * 3 + 2];
            rgba[i * 4 + 3] = 255;
        }

        Image::from_pixels(
            width,
            height,
            8,
            Profile::create_stock("srgb")?,
            PixelBuffer::U8(rgba),
        )
    }

    fn write(&self, image: &Image, _params: &WriteParams, out: &mut Vec<u8>) -> Result<()> {
        let mut image = image.clone();
        image.prepare_write(crate::image::PixelFormat::U8);
        let PixelBuffer::U8(rgba) = image.pixels() else {
            unreachable!("prepare_write(U8) always yields a U8 buffer");
        };

        out.extend_from_slice(
            format!("P6\n{} {}\n255\n", image.width(), image.height()).as_bytes(),
        );
        out.reserve(rgba.len() / 4 * 3);
        for px in rgba.chunks_exact(4) {
            out.push(px[0]);
            out.push(px[1]);
            out.push(px[2]);
        }
        Ok(())
    }
}

/// Minimal whitespace/comment-skipping tokenizer for the PPM ASCII header.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.pos < self.data.len() && self.data[self.pos] == b'#' {
                while self.pos < self.data.len() && self.data[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    fn token(&mut self) -> Result<String> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self.pos < self.data.len() && !self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(Error::Input("unexpected end of PPM header".into()));
        }
        Ok(String::from_utf8_lossy(&self.data[start..self.pos]).into_owned())
    }

    fn remainder_after_single_space(&mut self) -> Result<&'a [u8]> {
        if self.pos >= self.data.len() {
            return Err(Error::Input("PPM header has no pixel data".into()));
        }
        Ok(&self.data[self.pos + 1..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_roundtrips() {
        let mut img = Image::create(2, 1, 8, None).unwrap();
        img.set_pixel(0, 0, [1.0, 0.0, 0.0, 1.0]).unwrap();
        img.set_pixel(1, 0, [0.0, 1.0, 0.0, 1.0]).unwrap();

        let plugin = PpmPlugin;
        let mut bytes = Vec::new();
        plugin.write(&img, &WriteParams::default(), &mut bytes).unwrap();

        let decoded = plugin.read(&bytes).unwrap();
        assert_eq!(decoded.width(), 2);
        assert_eq!(decoded.height(), 1);
        let PixelBuffer::U8(px) = decoded.pixels() else {
            panic!("expected U8 buffer");
        };
        assert_eq!(&px[0..4], &[255, 0, 0, 255]);
        assert_eq!(&px[4..8], &[0, 255, 0, 255]);
    }

    #[test]
    fn detect_matches_p6_magic() {
        assert!(PpmPlugin.detect(b"P6\n2 2\n255\n"));
        assert!(!PpmPlugin.detect(b"\x89PNG"));
    }

    #[test]
    fn rejects_non_255_maxval() {
        let plugin = PpmPlugin;
        let data = b"P6\n1 1\n65535\n\x00\x00".to_vec();
        assert!(plugin.read(&data).is_err());
    }
}
