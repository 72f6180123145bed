//! Pixel-level math (C5): depth conversion, luminance scaling, HALD CLUT
//! lookup, resize filters, and color grading.
//!
//! Grounded in `math/interpolation.rs`'s `trilinear_interp`/`tetrahedral_interp`
//! for the CLUT lookup, and in the teacher's `multiversion`-dispatched hot
//! loops for the unorm<->float conversions (generalized here to RGBA and
//! arbitrary depth).

use multiversion::multiversion;

use crate::image::PixelBuffer;
use crate::math::interpolation::trilinear_interp;

/// Round to nearest, ties to even -- matches `lrint`'s default rounding mode,
/// which the original CCMM kernel relies on for unorm<->float conversion.
#[inline]
pub fn round_half_even(x: f32) -> f32 {
    let floor = x.floor();
    let diff = x - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}

/// Convert 8-bit unorm RGBA samples to normalized f32 RGBA.
#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
pub fn unorm_to_float_u8(samples: &[u8]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 255.0).collect()
}

/// Convert `depth`-bit (<=16) unorm RGBA samples, stored in u16 cells, to
/// normalized f32 RGBA.
#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
pub fn unorm_to_float_u16(samples: &[u16], depth: u8) -> Vec<f32> {
    let max = ((1u32 << depth.clamp(1, 16)) - 1) as f32;
    samples.iter().map(|&s| s as f32 / max).collect()
}

/// Convert normalized f32 RGBA samples to 8-bit unorm.
#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
pub fn float_to_unorm_u8(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .map(|&s| round_half_even(s.clamp(0.0, 1.0) * 255.0) as u8)
        .collect()
}

/// Convert normalized f32 RGBA samples to `depth`-bit unorm stored in u16 cells.
#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
pub fn float_to_unorm_u16(samples: &[f32], depth: u8) -> Vec<u16> {
    let max = ((1u32 << depth.clamp(1, 16)) - 1) as f32;
    samples
        .iter()
        .map(|&s| round_half_even(s.clamp(0.0, 1.0) * max) as u16)
        .collect()
}

/// Build whichever [`PixelBuffer`] variant `depth` implies from a float buffer.
pub fn f32_buffer_to_depth(samples: &[f32], depth: u8) -> PixelBuffer {
    if depth == 32 {
        PixelBuffer::F32(samples.to_vec())
    } else if depth <= 8 {
        PixelBuffer::U8(float_to_unorm_u8(samples))
    } else {
        PixelBuffer::U16(float_to_unorm_u16(samples, depth))
    }
}

/// Scale a linear-light RGB triple by `scale`, clamping to non-negative
/// (spec.md §4.5 `scaleLuminance`, used when reconciling PQ/HLG nominal peak
/// luminance against a profile's declared `maxLuminance`).
#[inline]
pub fn scale_luminance(rgb: [f64; 3], scale: f64) -> [f64; 3] {
    [
        (rgb[0] * scale).max(0.0),
        (rgb[1] * scale).max(0.0),
        (rgb[2] * scale).max(0.0),
    ]
}

/// A HALD color lookup table: a CLUT of `level^3` RGB triples, addressed as a
/// cube of `level` steps per axis (spec.md §4.5 `haldLookup`, §8 "HALD
/// dimensional validity").
#[derive(Debug, Clone)]
pub struct HaldClut {
    level: usize,
    data: Vec<f64>,
}

impl HaldClut {
    /// Build a CLUT from a flat `level^3 * 3` RGB table in canonical HALD
    /// ordering (R fastest, then G, then B).
    pub fn new(level: usize, data: Vec<f64>) -> Option<Self> {
        if level < 2 || data.len() != level * level * level * 3 {
            return None;
        }
        Some(Self { level, data })
    }

    /// Square HALD image side length this CLUT corresponds to, i.e.
    /// `level^1.5` rounded -- a square HALD PNG is `level^3` pixels laid out
    /// as a square of side `level * sqrt(level)`.
    pub fn image_side(&self) -> usize {
        ((self.level * self.level * self.level) as f64).sqrt().round() as usize
    }

    /// Trilinearly sample the CLUT at a normalized `[r, g, b]` input.
    pub fn lookup(&self, rgb: [f64; 3]) -> [f64; 3] {
        trilinear_interp(&self.data, self.level, rgb)
    }
}

/// Resampling filter kernel for [`resize`] (spec.md §4.5 `resize`), mirroring
/// the original's `CL_FILTER_*` set (`context.c:302-315`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFilter {
    /// Resolved per resize to CatmullRom (enlarging) or Mitchell (shrinking).
    Auto,
    Nearest,
    Box,
    Triangle,
    /// Cubic B-spline (Mitchell-Netravali `b=1, c=0`).
    Cubic,
    CatmullRom,
    Mitchell,
}

impl ResizeFilter {
    /// Resolve `Auto` against the overall resize direction; every other
    /// variant passes through unchanged (spec.md §4.5 "CatmullRom when
    /// enlarging and Mitchell when shrinking").
    fn resolve(self, src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> ResizeFilter {
        match self {
            ResizeFilter::Auto => {
                if dst_w * dst_h >= src_w * src_h {
                    ResizeFilter::CatmullRom
                } else {
                    ResizeFilter::Mitchell
                }
            }
            other => other,
        }
    }

    /// Nominal filter support radius in source-pixel units.
    fn support(&self) -> f64 {
        match self {
            ResizeFilter::Auto => unreachable!("Auto must be resolved before use"),
            ResizeFilter::Nearest => 0.5,
            ResizeFilter::Box => 0.5,
            ResizeFilter::Triangle => 1.0,
            ResizeFilter::Cubic | ResizeFilter::CatmullRom | ResizeFilter::Mitchell => 2.0,
        }
    }

    /// Filter weight at distance `x` (in source-pixel units) from center.
    fn weight(&self, x: f64) -> f64 {
        let x = x.abs();
        match self {
            ResizeFilter::Auto => unreachable!("Auto must be resolved before use"),
            ResizeFilter::Nearest => {
                if x < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            ResizeFilter::Box => {
                if x <= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            ResizeFilter::Triangle => (1.0 - x).max(0.0),
            ResizeFilter::Cubic => cubic_weight(x, 1.0, 0.0),
            ResizeFilter::CatmullRom => cubic_weight(x, 0.0, 0.5),
            ResizeFilter::Mitchell => cubic_weight(x, 1.0 / 3.0, 1.0 / 3.0),
        }
    }
}

/// Mitchell-Netravali family cubic convolution weight (Mitchell & Netravali,
/// 1988); `b=c=1/3` gives Mitchell, `b=0, c=0.5` gives Catmull-Rom.
fn cubic_weight(x: f64, b: f64, c: f64) -> f64 {
    let x2 = x * x;
    let x3 = x2 * x;
    if x < 1.0 {
        ((12.0 - 9.0 * b - 6.0 * c) * x3
            + (-18.0 + 12.0 * b + 6.0 * c) * x2
            + (6.0 - 2.0 * b))
            / 6.0
    } else if x < 2.0 {
        ((-b - 6.0 * c) * x3
            + (6.0 * b + 30.0 * c) * x2
            + (-12.0 * b - 48.0 * c) * x
            + (8.0 * b + 24.0 * c))
            / 6.0
    } else {
        0.0
    }
}

/// Separable RGBA resize of a normalized f32 buffer from `(src_w, src_h)` to
/// `(dst_w, dst_h)`.
pub fn resize(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    filter: ResizeFilter,
) -> Vec<f32> {
    let filter = filter.resolve(src_w, src_h, dst_w, dst_h);
    let horiz = resize_axis(src, src_w, src_h, dst_w, filter, Axis::Horizontal);
    resize_axis(&horiz, dst_w, src_h, dst_h, filter, Axis::Vertical)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn resize_axis(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    dst_len: usize,
    filter: ResizeFilter,
    axis: Axis,
) -> Vec<f32> {
    let (src_len, other_len) = match axis {
        Axis::Horizontal => (src_w, src_h),
        Axis::Vertical => (src_h, src_w),
    };
    let scale = src_len as f64 / dst_len as f64;
    let support = filter.support() * scale.max(1.0);

    let (out_w, out_h) = match axis {
        Axis::Horizontal => (dst_len, src_h),
        Axis::Vertical => (src_w, dst_len),
    };
    let mut out = vec![0.0f32; out_w * out_h * 4];

    for d in 0..dst_len {
        let center = (d as f64 + 0.5) * scale;
        let lo = ((center - support).floor() as i64).max(0) as usize;
        let hi = (((center + support).ceil() as i64) as usize).min(src_len.saturating_sub(1));

        let mut weights = Vec::with_capacity(hi - lo + 1);
        let mut total = 0.0f64;
        for s in lo..=hi {
            let dist = (s as f64 + 0.5 - center) / scale.max(1.0);
            let w = filter.weight(dist);
            weights.push(w);
            total += w;
        }
        if total <= 0.0 {
            total = 1.0;
        }

        for o in 0..other_len {
            let mut acc = [0.0f64; 4];
            for (i, &w) in weights.iter().enumerate() {
                let s = lo + i;
                let (x, y) = match axis {
                    Axis::Horizontal => (s, o),
                    Axis::Vertical => (o, s),
                };
                let idx = (y * src_w + x) * 4;
                for c in 0..4 {
                    acc[c] += src[idx + c] as f64 * w;
                }
            }
            let (dx, dy) = match axis {
                Axis::Horizontal => (d, o),
                Axis::Vertical => (o, d),
            };
            let out_idx = (dy * out_w + dx) * 4;
            for c in 0..4 {
                out[out_idx + c] = (acc[c] / total) as f32;
            }
        }
    }

    out
}

/// Derive a destination max luminance and gamma from the source image's
/// already-linearized RGBA pixels, without touching the pixels themselves
/// (spec.md §4.5/§4.7 step 14 `colorGrade`; grounded in
/// `examples/original_source/lib/src/pixelmath_grade.c`'s
/// `clPixelMathColorGrade`, which only ever reads `pixels`).
///
/// `pixels` is the linear (EOTF-decoded) RGBA f32 buffer, matching what the
/// original passes in as `linearFloatsPixels`. `requested_luminance == 0`
/// means "derive it"; any other value is returned unchanged, and likewise
/// for `requested_gamma == 0.0`, mirroring the C function's in/out
/// `*outLuminance`/`*outGamma` contract.
pub fn color_grade(
    pixels: &[f32],
    src_luminance: u32,
    dst_depth: u8,
    requested_luminance: u32,
    requested_gamma: f64,
) -> (u32, f64) {
    let luminance = if requested_luminance == 0 {
        let max_channel = pixels
            .chunks_exact(4)
            .flat_map(|px| &px[..3])
            .fold(0.0f32, |acc, &v| acc.max(v));
        ((max_channel as f64 * src_luminance as f64).round() as i64).clamp(0, src_luminance as i64) as u32
    } else {
        requested_luminance
    };

    let gamma = if requested_gamma == 0.0 {
        let luminance_scale = src_luminance as f64 / luminance.max(1) as f64;
        let max_code = if dst_depth == 16 { 65535.0 } else { 255.0 };
        let mut best_gamma = 2.0;
        let mut best_error = f64::INFINITY;
        // gamma in {2.0, 2.1, ..., 5.0}, 31 steps, matching the original's
        // `for (gammaInt = 20; gammaInt <= 50; ++gammaInt)`.
        for step in 20..=50 {
            let gamma_attempt = step as f64 / 10.0;
            let inv_gamma = 1.0 / gamma_attempt;
            let mut error = 0.0f64;
            for px in pixels.chunks_exact(4) {
                for &c in &px[..3] {
                    let scaled = (c as f64 * luminance_scale).clamp(0.0, 1.0);
                    let quantized = (scaled.powf(inv_gamma) * max_code).round() / max_code;
                    error += (scaled - quantized.powf(gamma_attempt)).abs();
                }
            }
            if error < best_error {
                best_error = error;
                best_gamma = gamma_attempt;
            }
        }
        best_gamma
    } else {
        requested_gamma
    };

    (luminance, gamma)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_half_even_ties() {
        assert_eq!(round_half_even(0.5), 0.0);
        assert_eq!(round_half_even(1.5), 2.0);
        assert_eq!(round_half_even(2.5), 2.0);
    }

    #[test]
    fn unorm_roundtrip_u8() {
        let floats = unorm_to_float_u8(&[0, 128, 255]);
        let back = float_to_unorm_u8(&floats);
        assert_eq!(back, vec![0, 128, 255]);
    }

    #[test]
    fn unorm_roundtrip_u16_depth10() {
        let samples = [0u16, 512, 1023];
        let floats = unorm_to_float_u16(&samples, 10);
        let back = float_to_unorm_u16(&floats, 10);
        assert_eq!(back, samples);
    }

    #[test]
    fn hald_rejects_wrong_length() {
        assert!(HaldClut::new(4, vec![0.0; 10]).is_none());
    }

    #[test]
    fn hald_identity_is_passthrough() {
        let level = 4usize;
        let mut data = vec![0.0f64; level * level * level * 3];
        for b in 0..level {
            for g in 0..level {
                for r in 0..level {
                    let idx = (b * level * level + g * level + r) * 3;
                    data[idx] = r as f64 / (level - 1) as f64;
                    data[idx + 1] = g as f64 / (level - 1) as f64;
                    data[idx + 2] = b as f64 / (level - 1) as f64;
                }
            }
        }
        let clut = HaldClut::new(level, data).unwrap();
        let out = clut.lookup([0.5, 0.25, 0.75]);
        assert!((out[0] - 0.5).abs() < 0.05);
        assert!((out[1] - 0.25).abs() < 0.05);
        assert!((out[2] - 0.75).abs() < 0.05);
    }

    #[test]
    fn resize_nearest_preserves_corner_pixel() {
        let src = vec![1.0f32, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let out = resize(&src, 2, 1, 4, 1, ResizeFilter::Nearest);
        assert_eq!(out.len(), 16);
    }

    #[test]
    fn auto_resolves_to_catmullrom_enlarging_mitchell_shrinking() {
        assert_eq!(ResizeFilter::Auto.resolve(2, 2, 4, 4), ResizeFilter::CatmullRom);
        assert_eq!(ResizeFilter::Auto.resolve(4, 4, 2, 2), ResizeFilter::Mitchell);
    }

    #[test]
    fn cubic_matches_mitchell_netravali_b1_c0() {
        assert_eq!(ResizeFilter::Cubic.weight(0.0), cubic_weight(0.0, 1.0, 0.0));
        assert_eq!(ResizeFilter::Cubic.support(), 2.0);
    }

    #[test]
    fn color_grade_derives_luminance_without_mutating_pixels() {
        // One RGBA pixel, max linear channel 0.5, srcLuminance 10000 -> spec.md
        // §8 scenario 6 expects outLuminance = 5000.
        let pixels = vec![0.5f32, 0.25, 0.1, 1.0];
        let before = pixels.clone();
        let (luminance, gamma) = color_grade(&pixels, 10000, 8, 0, 0.0);
        assert_eq!(pixels, before, "color_grade must not mutate pixel data");
        assert_eq!(luminance, 5000);
        assert!((2.0..=5.0).contains(&gamma));
    }

    #[test]
    fn color_grade_honors_requested_luminance_and_gamma() {
        let pixels = vec![0.5f32, 0.25, 0.1, 1.0];
        let (luminance, gamma) = color_grade(&pixels, 10000, 8, 300, 2.4);
        assert_eq!(luminance, 300);
        assert_eq!(gamma, 2.4);
    }
}
