//! Transform engine (C4) — the heart of the library.
//!
//! An unprepared [`Transform`] just records the two profiles and the
//! tone-mapping request. [`Transform::prepare`] derives the matrices and
//! scale factors once, explicitly, into a [`PreparedTransform`] that the
//! per-pixel kernel and [`PreparedTransform::convert`] then consume —
//! matching spec.md §4.4's Build/Prepare/Execute split, but as an explicit
//! value handed back to the caller rather than memoized behind interior
//! mutability (see DESIGN.md).

use crate::color::Xyz;
use crate::error::{Error, Result};
use crate::image::{Image, PixelBuffer, PixelFormat};
use crate::math::matrix::Matrix3x3;
use crate::profile::{CurveType, Primaries, Profile};
use crate::task::TaskPool;

/// How aggressively to engage highlight roll-off (spec.md §4.4 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneMapMode {
    /// Engage tone mapping only when source luminance materially exceeds
    /// destination luminance.
    #[default]
    Auto,
    /// Always tone map.
    On,
    /// Never tone map.
    Off,
}

/// Extended-Reinhard knobs (spec.md §6.1 `-t/--tonemap`). The default
/// operator is plain Reinhard `Y/(1+Y)`; these fields are accepted and
/// carried through so the CLI surface can parse them, but the extended
/// curve they'd parameterize is not implemented (see DESIGN.md — no
/// grounding source specifies the extended-Reinhard shape).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneMapParams {
    pub contrast: f64,
    pub clip_point: f64,
    pub speed: f64,
    pub power: f64,
}

impl Default for ToneMapParams {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            clip_point: 1.0,
            speed: 1.0,
            power: 1.0,
        }
    }
}

/// An unprepared request to convert pixels authored under `src_profile` to
/// pixels authored under `dst_profile` (spec.md §4.4 "Build").
pub struct Transform<'a> {
    src_profile: &'a Profile,
    dst_profile: &'a Profile,
    tonemap: ToneMapMode,
    tonemap_params: ToneMapParams,
}

impl<'a> Transform<'a> {
    pub fn new(
        src_profile: &'a Profile,
        dst_profile: &'a Profile,
        tonemap: ToneMapMode,
        tonemap_params: ToneMapParams,
    ) -> Self {
        Self {
            src_profile,
            dst_profile,
            tonemap,
            tonemap_params,
        }
    }

    /// Resolve matrices, curves, and luminance-scale flags (spec.md §4.4
    /// "Prepare"). `default_luminance` backs the `COLORIST_DEFAULT_LUMINANCE`
    /// fallback used when a profile's `maxLuminance` is unspecified (0).
    pub fn prepare(&self, default_luminance: u32) -> Result<PreparedTransform> {
        let reformat_only = Profile::matches(self.src_profile, self.dst_profile);

        let mut src_primaries = self.src_profile.primaries();
        let dst_primaries = self.dst_profile.primaries();
        // step 6: snap source primaries onto destination's when they match,
        // so srcToXYZ . XYZToDst is provably identity (spec.md §4.2).
        if src_primaries.approx_eq(&dst_primaries, 1e-4) {
            src_primaries = dst_primaries;
        }

        let white = resolve_white(&dst_primaries, &src_primaries);

        let src_lum = self.src_profile.effective_luminance(default_luminance) as f64;
        let dst_lum = self.dst_profile.effective_luminance(default_luminance) as f64;
        let src_curve = self.src_profile.curve();
        let dst_curve = self.dst_profile.curve();
        let src_curve_scale = src_curve.implicit_scale(src_lum);
        let dst_curve_scale = dst_curve.implicit_scale(dst_lum);

        // Folds "multiply by srcCurveScale, then srcLum/dstLum, then divide
        // by dstCurveScale" (spec.md §4.4 step 3) into one scalar applied to
        // Y during the per-pixel kernel.
        let luminance_scale = (src_lum * src_curve_scale) / (dst_lum * dst_curve_scale);

        let tonemap_enabled = match self.tonemap {
            ToneMapMode::On => true,
            ToneMapMode::Off => false,
            ToneMapMode::Auto => luminance_scale > 1.001,
        };
        let luminance_scale_enabled = tonemap_enabled || (luminance_scale - 1.0).abs() > 1e-6;

        let src_to_xyz = rgb_to_xyz_matrix(&src_primaries)?;
        let dst_to_xyz = rgb_to_xyz_matrix(&dst_primaries)?;
        let xyz_to_dst = dst_to_xyz
            .inverse()
            .ok_or_else(|| Error::SingularMatrix("destination primaries matrix is singular".into()))?;

        Ok(PreparedTransform {
            src_to_xyz,
            xyz_to_dst,
            white,
            src_curve,
            dst_curve,
            luminance_scale,
            tonemap_enabled,
            luminance_scale_enabled,
            reformat_only,
            tonemap_params: self.tonemap_params,
            dst_profile: self.dst_profile.clone(),
        })
    }
}

/// spec.md §4.2: white point chromaticity preferring destination, then
/// source, then D65 (0.3127, 0.3290). Both profiles carry validated
/// (non-zero) primaries, so the destination branch always applies in
/// practice; the fallback chain is kept for robustness against a
/// degenerate caller-constructed profile.
fn resolve_white(dst: &Primaries, src: &Primaries) -> (f64, f64) {
    if dst.wx != 0.0 && dst.wy != 0.0 {
        (dst.wx, dst.wy)
    } else if src.wx != 0.0 && src.wy != 0.0 {
        (src.wx, src.wy)
    } else {
        (0.3127, 0.3290)
    }
}

/// Derive the RGB→XYZ matrix for `primaries` (spec.md §4.2). Primaries and
/// white are used as raw `(x, y, 1-x-y)` triples (not pre-normalized by
/// `y`); the `D = diag(U/Wy)` step folds in the normalization, which is
/// algebraically identical to the more common "divide each primary by its
/// own y" derivation.
pub(crate) fn rgb_to_xyz_matrix(p: &Primaries) -> Result<Matrix3x3> {
    let triple = |x: f64, y: f64| [x, y, 1.0 - x - y];
    let pr = triple(p.rx, p.ry);
    let pg = triple(p.gx, p.gy);
    let pb = triple(p.bx, p.by);
    let w = triple(p.wx, p.wy);

    let primary_matrix = Matrix3x3::new([
        [pr[0], pg[0], pb[0]],
        [pr[1], pg[1], pb[1]],
        [pr[2], pg[2], pb[2]],
    ]);
    let inv = primary_matrix
        .inverse()
        .ok_or_else(|| Error::SingularMatrix("primaries matrix is singular".into()))?;
    let u = inv.multiply_vec(w);

    if p.wy.abs() < 1e-12 {
        return Err(Error::Transform("white point y-chromaticity is zero".into()));
    }
    let d = Matrix3x3::diagonal(u[0] / p.wy, u[1] / p.wy, u[2] / p.wy);
    Ok(primary_matrix.multiply(&d))
}

/// A fully resolved transform, ready to run (spec.md §4.4 "Prepare").
/// Immutable and read-only after construction — safe to share across
/// worker threads during [`Self::convert`].
pub struct PreparedTransform {
    src_to_xyz: Matrix3x3,
    xyz_to_dst: Matrix3x3,
    white: (f64, f64),
    src_curve: CurveType,
    dst_curve: CurveType,
    luminance_scale: f64,
    tonemap_enabled: bool,
    luminance_scale_enabled: bool,
    reformat_only: bool,
    tonemap_params: ToneMapParams,
    dst_profile: Profile,
}

impl PreparedTransform {
    pub fn tonemap_enabled(&self) -> bool {
        self.tonemap_enabled
    }

    pub fn luminance_scale_enabled(&self) -> bool {
        self.luminance_scale_enabled
    }

    pub fn is_reformat_only(&self) -> bool {
        self.reformat_only
    }

    pub fn tonemap_params(&self) -> ToneMapParams {
        self.tonemap_params
    }

    /// Run the prepared transform over `src`, producing a new image at
    /// `dst_depth` (spec.md §4.4 "Format dispatch"/"Concurrency").
    pub fn convert(&self, src: &Image, dst_depth: u8, jobs: usize) -> Result<Image> {
        let src_pixels = src.to_f32();

        let dst_floats = if self.reformat_only {
            // Reformat kernel: profiles match exactly, so only depth/format
            // changes. No color math runs, which is what makes the
            // round-trip-identity property bit-exact.
            src_pixels
        } else {
            let mut out = vec![0.0f32; src_pixels.len()];
            let pool = TaskPool::new(jobs)?;
            pool.run_pixels(&src_pixels, &mut out, 4, |s, d| {
                for (src_px, dst_px) in s.chunks_exact(4).zip(d.chunks_exact_mut(4)) {
                    let rgba = [src_px[0], src_px[1], src_px[2], src_px[3]];
                    dst_px.copy_from_slice(&self.transform_pixel(rgba));
                }
            });
            out
        };

        let depth = if dst_depth == 32 { 32 } else { dst_depth };
        let pixels = crate::pixelmath::f32_buffer_to_depth(&dst_floats, depth);
        Image::from_pixels(src.width(), src.height(), depth, self.dst_profile.clone(), pixels)
    }

    /// Transform one normalized-float RGBA pixel (spec.md §4.4 "Execute per
    /// pixel"). Alpha passes through untouched.
    fn transform_pixel(&self, rgba: [f32; 4]) -> [f32; 4] {
        let lin = [
            self.src_curve.decode(rgba[0] as f64),
            self.src_curve.decode(rgba[1] as f64),
            self.src_curve.decode(rgba[2] as f64),
        ];

        let mut xyz = self.src_to_xyz.multiply_vec(lin);

        if self.luminance_scale_enabled {
            xyz = self.scale_luminance(xyz);
        }

        let mut dst_lin = self.xyz_to_dst.multiply_vec(xyz);
        for v in dst_lin.iter_mut() {
            *v = v.clamp(0.0, 1.0);
        }

        [
            self.dst_curve.encode(dst_lin[0]) as f32,
            self.dst_curve.encode(dst_lin[1]) as f32,
            self.dst_curve.encode(dst_lin[2]) as f32,
            rgba[3],
        ]
    }

    /// spec.md §4.4 step 3: XYZ → xyY, scale Y, optional Reinhard, xyY → XYZ.
    fn scale_luminance(&self, xyz: [f64; 3]) -> [f64; 3] {
        let sum = xyz[0] + xyz[1] + xyz[2];
        let (x, y, yv) = if sum <= 0.0 {
            (self.white.0, self.white.1, 0.0)
        } else {
            Xyz::new(xyz[0], xyz[1], xyz[2]).to_xyy()
        };

        let mut yv = yv * self.luminance_scale;
        if self.tonemap_enabled {
            yv = yv / (1.0 + yv);
        }

        Xyz::from_xyy(x, y, yv).to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn srgb() -> Profile {
        Profile::create_stock("srgb").unwrap()
    }

    #[test]
    fn identical_profiles_use_reformat_kernel() {
        let p = srgb();
        let t = Transform::new(&p, &p, ToneMapMode::Off, ToneMapParams::default());
        let prepared = t.prepare(300).unwrap();
        assert!(prepared.is_reformat_only());
        assert!(!prepared.luminance_scale_enabled());
    }

    #[test]
    fn matrix_round_trips_through_inverse() {
        let p = Primaries::BT709;
        let m = rgb_to_xyz_matrix(&p).unwrap();
        let inv = m.inverse().unwrap();
        let product = m.multiply(&inv);
        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((product.m[r][c] - expected).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn no_op_scale_when_luminance_and_curve_scale_match() {
        let p = Profile::create(Primaries::BT709, CurveType::Gamma(2.2), 100, "a").unwrap();
        let q = Profile::create(Primaries::BT2020, CurveType::Gamma(2.2), 100, "b").unwrap();
        let t = Transform::new(&p, &q, ToneMapMode::Off, ToneMapParams::default());
        let prepared = t.prepare(300).unwrap();
        assert!(!prepared.luminance_scale_enabled());
    }

    #[test]
    fn tonemap_auto_enables_when_source_much_brighter() {
        let p = Profile::create_stock("bt2020-pq").unwrap();
        let q = Profile::create_stock("srgb").unwrap();
        let t = Transform::new(&p, &q, ToneMapMode::Auto, ToneMapParams::default());
        let prepared = t.prepare(300).unwrap();
        assert!(prepared.tonemap_enabled());
    }

    #[test]
    fn convert_round_trips_identity_on_equal_profiles() {
        let profile = srgb();
        let mut img = Image::create(2, 2, 8, Some(&profile)).unwrap();
        img.set_pixel(0, 0, [1.0, 0.5, 0.25, 1.0]).unwrap();
        let t = Transform::new(&profile, &profile, ToneMapMode::Off, ToneMapParams::default());
        let prepared = t.prepare(300).unwrap();
        let out = prepared.convert(&img, 8, 1).unwrap();
        match (img.pixels(), out.pixels()) {
            (PixelBuffer::U8(a), PixelBuffer::U8(b)) => assert_eq!(a, b),
            _ => panic!("expected U8 buffers"),
        }
    }

    #[test]
    fn convert_produces_requested_depth() {
        let src_profile = Profile::create_stock("srgb").unwrap();
        let dst_profile =
            Profile::create(Primaries::BT2020, CurveType::Gamma(2.4), 100, "wide").unwrap();
        let mut img = Image::create(2, 2, 8, Some(&src_profile)).unwrap();
        img.set_pixel(0, 0, [0.8, 0.1, 0.1, 1.0]).unwrap();
        let t = Transform::new(&src_profile, &dst_profile, ToneMapMode::Off, ToneMapParams::default());
        let prepared = t.prepare(300).unwrap();
        let out = prepared.convert(&img, 16, 2).unwrap();
        assert_eq!(out.depth(), 16);
        assert!(matches!(out.pixels(), PixelBuffer::U16(_)));
    }

    #[test]
    fn pixel_format_bytes_per_channel_still_exposed() {
        assert_eq!(PixelFormat::U8.bytes_per_channel(), 1);
    }

    /// spec.md §8: Reinhard `x/(1+x)` is strictly increasing on x>=0, checked
    /// over a grid of 1,024 samples.
    #[test]
    fn reinhard_tonemap_is_monotonic_over_grid() {
        let samples: Vec<f64> = (0..1024).map(|i| i as f64 / 1024.0 * 100.0).collect();
        let mut prev = -1.0f64;
        for x in samples {
            let y = x / (1.0 + x);
            assert!(y > prev, "reinhard(x) must strictly increase with x");
            prev = y;
        }
    }
}
