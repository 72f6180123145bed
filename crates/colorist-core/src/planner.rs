//! Conversion planner (C7): the straight-line `convert` sequence from
//! spec.md §4.7, plus the smaller `identify`/`generate`/`calc` actions the
//! CLI exposes alongside it.
//!
//! Grounded in `original_source/bin/colorist/main.c`'s `actionConvert` et al: a long
//! run of guarded steps between file load and file write, each one either a
//! no-op or a well-defined transformation, never mutual recursion.

use std::path::{Path, PathBuf};

use crate::color::Xyz;
use crate::context::Context;
use crate::dsl;
use crate::error::{Error, Result};
use crate::image::Image;
use crate::pixelmath::{self, HaldClut, ResizeFilter};
use crate::profile::{CurveType, Primaries, Profile};
use crate::registry::WriteParams;
use crate::transform::{PreparedTransform, ToneMapMode, ToneMapParams, Transform};

/// `-g/--gamma` (spec.md §6.1): "pq"/"hlg" pick a curve family, "s"/"source"
/// copies the source curve verbatim, otherwise an explicit positive gamma.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GammaOverride {
    Pq,
    Hlg,
    Source,
    Value(f64),
}

/// `-l/--luminance` (spec.md §6.1): an explicit nits value, "s" to copy the
/// source's, or "u" to mark unspecified (stored as 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LuminanceOverride {
    Nits(u32),
    Source,
    Unspecified,
}

/// `-p/--primaries` (spec.md §6.1): a stock name or eight explicit floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimariesOverride {
    Stock(Primaries),
    Explicit(Primaries),
}

/// Compositing blend parameters (spec.md §6.1 `--composite*`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeParams {
    pub gamma: f64,
    pub tonemap: ToneMapMode,
    pub premultiplied: bool,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self { gamma: 2.2, tonemap: ToneMapMode::Auto, premultiplied: false }
    }
}

/// All planner-level parameters for a single `convert` invocation (spec.md
/// §4.7, §6.1). Fields mirror CLI flags one-to-one; a thin CLI layer parses
/// flag text into these typed values.
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: Option<String>,
    pub icc_override_in: Option<PathBuf>,
    pub icc_override_out: Option<PathBuf>,
    pub noprofile: bool,
    pub bpc: Option<u8>,
    pub primaries: Option<PrimariesOverride>,
    pub luminance: Option<LuminanceOverride>,
    pub gamma: Option<GammaOverride>,
    pub autograde: bool,
    pub resize: Option<(i64, i64, ResizeFilter)>,
    pub crop: Option<(i64, i64, i64, i64)>,
    pub composite: Option<PathBuf>,
    pub composite_params: CompositeParams,
    pub hald: Option<PathBuf>,
    pub tonemap: ToneMapMode,
    pub tonemap_params: ToneMapParams,
    pub stats: bool,
    pub quality: Option<u8>,
    pub rate: Option<u32>,
    pub description: Option<String>,
}

/// Linear/gamma=2.2 MSE/PSNR pair (spec.md §4.7 step 20, §8 "Planner
/// idempotence").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertStats {
    pub mse_linear: f64,
    pub psnr_linear: f64,
    pub mse_gamma: f64,
    pub psnr_gamma: f64,
}

/// Summary of a completed `convert` run, the planner surface's return value.
#[derive(Debug, Clone)]
pub struct ConvertReport {
    pub action: String,
    pub width: u32,
    pub height: u32,
    pub depth: u8,
    pub format: String,
    pub stats: Option<ConvertStats>,
}

/// Run the full `convert` sequence (spec.md §4.7, steps numbered in comments).
pub fn convert(ctx: &Context, req: &ConvertRequest) -> Result<ConvertReport> {
    // 1. Resolve destination format.
    let output_str = req.output.to_string_lossy();
    let dst_plugin = ctx
        .registry()
        .resolve(&output_str, req.format.as_deref(), None)?;

    // 3. Load source image.
    let input_str = req.input.to_string_lossy();
    let raw = std::fs::read(&req.input)?;
    let src_plugin = ctx
        .registry()
        .resolve(&input_str, None, Some(&raw))?;
    let mut image = src_plugin.read(&raw)?;

    if let Some(icc_in) = &req.icc_override_in {
        let overridden = Profile::read_file(icc_in)?;
        image.set_profile(overridden);
    }

    // 4. Early bail: destination is a bare ICC profile dump.
    if dst_plugin.name() == "icc" {
        image.profile().write_file(&req.output)?;
        return Ok(ConvertReport {
            action: "convert (icc passthrough)".into(),
            width: image.width(),
            height: image.height(),
            depth: image.depth(),
            format: dst_plugin.name().into(),
            stats: None,
        });
    }

    // 5. Optional HALD CLUT load.
    let hald = match &req.hald {
        Some(path) => Some(load_hald(ctx, path)?),
        None => None,
    };

    // 6. Optional crop.
    if let Some((x, y, w, h)) = req.crop {
        image.crop(x, y, w, h)?;
    }

    // 7. Source info.
    let (src_primaries, src_curve, src_luminance) = image.profile().query();

    // 8. Seed destination info from source; autoGrade resets gamma/luminance.
    let mut dst_primaries = src_primaries;
    let mut dst_curve = src_curve;
    let mut dst_luminance = src_luminance;
    if req.autograde {
        dst_curve = CurveType::Gamma(2.2);
        dst_luminance = 0;
    }

    let mut dst_profile_override: Option<Profile> = None;

    // 9. iccOverrideOut.
    if let Some(icc_out) = &req.icc_override_out {
        if req.autograde {
            return Err(Error::Validation(
                "--iccout cannot be combined with --autograde".into(),
            ));
        }
        dst_profile_override = Some(Profile::read_file(icc_out)?);
    } else {
        // 10. Explicit overrides.
        if let Some(p) = req.primaries {
            dst_primaries = match p {
                PrimariesOverride::Stock(p) | PrimariesOverride::Explicit(p) => p,
            };
        }
        if let Some(l) = req.luminance {
            dst_luminance = match l {
                LuminanceOverride::Nits(n) => n,
                LuminanceOverride::Source => src_luminance,
                LuminanceOverride::Unspecified => 0,
            };
        }
        if let Some(g) = req.gamma {
            dst_curve = match g {
                GammaOverride::Pq => CurveType::Pq,
                GammaOverride::Hlg => CurveType::Hlg,
                GammaOverride::Source => src_curve,
                GammaOverride::Value(v) => CurveType::Gamma(v),
            };
        }
    }

    // 11. Resize target, deriving the missing dimension from aspect ratio.
    let (target_w, target_h) = resolve_resize_target(&req.resize, image.width(), image.height());

    // 12. Destination depth.
    let requested_depth = req.bpc.unwrap_or(image.depth());
    let dst_depth = dst_plugin.depth_policy().best_depth(requested_depth);

    // 13. Resize pass.
    if target_w != image.width() || target_h != image.height() {
        let filter = req.resize.map(|(_, _, f)| f).unwrap_or(ResizeFilter::Auto);
        let floats = image.to_f32();
        let resized = pixelmath::resize(
            &floats,
            image.width() as usize,
            image.height() as usize,
            target_w as usize,
            target_h as usize,
            filter,
        );
        let pixels = pixelmath::f32_buffer_to_depth(&resized, image.depth());
        image = Image::from_pixels(target_w, target_h, image.depth(), image.profile().clone(), pixels)?;
    }

    // 14. Auto-grade: derive destination luminance/gamma metadata only.
    // `colorGrade` is a pure function of the existing pixel data (spec.md
    // §4.7 step 14 / §4.5) — it never rewrites the image's pixels.
    if req.autograde {
        let encoded = image.to_f32();
        let mut linear = vec![0.0f32; encoded.len()];
        for (dst, src) in linear.chunks_exact_mut(4).zip(encoded.chunks_exact(4)) {
            dst[0] = src_curve.decode(src[0] as f64) as f32;
            dst[1] = src_curve.decode(src[1] as f64) as f32;
            dst[2] = src_curve.decode(src[2] as f64) as f32;
            dst[3] = src[3];
        }
        let (luminance, gamma) = pixelmath::color_grade(&linear, src_luminance, dst_depth, dst_luminance, 0.0);
        dst_luminance = luminance;
        dst_curve = CurveType::Gamma(gamma);
    }

    // 15. Build (or reuse) the destination profile.
    let dst_profile = match dst_profile_override {
        Some(p) => p,
        None => {
            let differs = dst_primaries != src_primaries
                || !curve_eq(dst_curve, src_curve)
                || dst_luminance != src_luminance;
            let mut profile = if differs {
                Profile::create(
                    dst_primaries,
                    dst_curve,
                    dst_luminance,
                    req.description.clone().unwrap_or_else(|| "Colorist".into()),
                )?
            } else {
                image.profile().clone()
            };
            if let Some(desc) = &req.description {
                profile.set_description(desc.clone());
            }
            profile
        }
    };

    // 16. Build and run the transform.
    let dst_profile = if req.noprofile { dst_profile.without_icc() } else { dst_profile };
    let transform = Transform::new(image.profile(), &dst_profile, req.tonemap, req.tonemap_params);
    let prepared: PreparedTransform = transform.prepare(ctx.default_luminance())?;
    let mut out_image = prepared.convert(&image, dst_depth, ctx.effective_jobs())?;

    // 17. Composite.
    if let Some(composite_path) = &req.composite {
        let raw = std::fs::read(composite_path)?;
        let path_str = composite_path.to_string_lossy();
        let plugin = ctx.registry().resolve(&path_str, None, Some(&raw))?;
        let overlay = plugin.read(&raw)?;
        composite_source_over(&mut out_image, &overlay, &req.composite_params)?;
    }

    // 18. HALD post-process.
    if let Some(clut) = &hald {
        apply_hald(&mut out_image, clut);
    }

    // 19. Write.
    let write_params = WriteParams { quality: req.quality, rate: req.rate };
    let mut bytes = Vec::new();
    dst_plugin.write(&out_image, &write_params, &mut bytes)?;
    std::fs::write(&req.output, &bytes)?;

    // 20. Stats.
    let stats = if req.stats {
        let reloaded_raw = std::fs::read(&req.output)?;
        let reloaded = dst_plugin.read(&reloaded_raw)?;
        Some(compute_stats(&out_image, &reloaded))
    } else {
        None
    };

    Ok(ConvertReport {
        action: "convert".into(),
        width: out_image.width(),
        height: out_image.height(),
        depth: out_image.depth(),
        format: dst_plugin.name().into(),
        stats,
    })
}

fn curve_eq(a: CurveType, b: CurveType) -> bool {
    match (a, b) {
        (CurveType::Gamma(x), CurveType::Gamma(y)) => (x - y).abs() < 1e-4,
        (CurveType::Pq, CurveType::Pq) | (CurveType::Hlg, CurveType::Hlg) => true,
        (CurveType::Complex(x), CurveType::Complex(y)) => (x - y).abs() < 1e-4,
        _ => false,
    }
}

fn resolve_resize_target(resize: &Option<(i64, i64, ResizeFilter)>, src_w: u32, src_h: u32) -> (u32, u32) {
    let Some((w, h, _)) = resize else {
        return (src_w, src_h);
    };
    match (*w, *h) {
        (w, h) if w > 0 && h > 0 => (w as u32, h as u32),
        (w, _) if w > 0 => {
            let h = (w as f64 * src_h as f64 / src_w as f64).round().max(1.0) as u32;
            (w as u32, h)
        }
        (_, h) if *h > 0 => {
            let w = (h as f64 * src_w as f64 / src_h as f64).round().max(1.0) as u32;
            (w, h as u32)
        }
        _ => (src_w, src_h),
    }
}

fn load_hald(ctx: &Context, path: &Path) -> Result<HaldClut> {
    let raw = std::fs::read(path)?;
    let path_str = path.to_string_lossy();
    let plugin = ctx.registry().resolve(&path_str, None, Some(&raw))?;
    let image = plugin.read(&raw)?;
    if image.width() != image.height() {
        return Err(Error::Unsupported(
            "HALD image must be square".into(),
        ));
    }
    let side = image.width() as usize;
    let level = hald_level_for_side(side).ok_or_else(|| {
        Error::Unsupported(format!("HALD image side {side} is not a valid CLUT dimension"))
    })?;
    let floats = image.to_f32();
    let data: Vec<f64> = floats
        .chunks_exact(4)
        .flat_map(|px| [px[0] as f64, px[1] as f64, px[2] as f64])
        .collect();
    HaldClut::new(level, data).ok_or_else(|| Error::Unsupported("malformed HALD data".into()))
}

/// The CLUT `level` whose square packed image side (spec.md §8 "HALD
/// dimensional validity") matches `side`, i.e. `round(sqrt(level^3)) == side`.
fn hald_level_for_side(side: usize) -> Option<usize> {
    (2..=256usize).find(|&level| {
        let expected = ((level * level * level) as f64).sqrt().round() as usize;
        expected == side
    })
}

fn apply_hald(image: &mut Image, clut: &HaldClut) {
    let mut floats = image.to_f32();
    for px in floats.chunks_exact_mut(4) {
        let looked_up = clut.lookup([px[0] as f64, px[1] as f64, px[2] as f64]);
        px[0] = looked_up[0] as f32;
        px[1] = looked_up[1] as f32;
        px[2] = looked_up[2] as f32;
    }
    let pixels = pixelmath::f32_buffer_to_depth(&floats, image.depth());
    *image = Image::from_pixels(image.width(), image.height(), image.depth(), image.profile().clone(), pixels)
        .expect("same dimensions as source");
}

/// Source-over blend of `overlay` onto `base` (spec.md §6.1 `--composite*`).
fn composite_source_over(base: &mut Image, overlay: &Image, params: &CompositeParams) -> Result<()> {
    if base.width() != overlay.width() || base.height() != overlay.height() {
        return Err(Error::Validation(
            "composite image dimensions must match".into(),
        ));
    }
    let mut dst = base.to_f32();
    let src = overlay.to_f32();
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = if params.premultiplied { 1.0 } else { s[3] };
        for c in 0..3 {
            let sv = if params.premultiplied { s[c] } else { s[c] * s[3] };
            let dv = to_linear_gamma(d[c], params.gamma);
            let sv_lin = to_linear_gamma(sv / sa.max(1e-6), params.gamma) * sa;
            let blended = sv_lin + dv * (1.0 - s[3]);
            d[c] = from_linear_gamma(blended, params.gamma);
        }
        d[3] = s[3] + d[3] * (1.0 - s[3]);
    }
    let pixels = pixelmath::f32_buffer_to_depth(&dst, base.depth());
    *base = Image::from_pixels(base.width(), base.height(), base.depth(), base.profile().clone(), pixels)?;
    Ok(())
}

fn to_linear_gamma(v: f32, gamma: f64) -> f32 {
    (v.max(0.0) as f64).powf(gamma) as f32
}

fn from_linear_gamma(v: f32, gamma: f64) -> f32 {
    (v.max(0.0) as f64).powf(1.0 / gamma) as f32
}

fn compute_stats(reference: &Image, candidate: &Image) -> ConvertStats {
    let a = reference.to_f32();
    let b = candidate.to_f32();
    let n = a.len().min(b.len());

    let mut se_linear = 0.0f64;
    let mut se_gamma = 0.0f64;
    let gamma = 2.2;
    for i in 0..n {
        let diff_gamma = (a[i] - b[i]) as f64;
        se_gamma += diff_gamma * diff_gamma;

        let la = (a[i].max(0.0) as f64).powf(gamma);
        let lb = (b[i].max(0.0) as f64).powf(gamma);
        se_linear += (la - lb).powi(2);
    }
    let mse_linear = se_linear / n as f64;
    let mse_gamma = se_gamma / n as f64;
    ConvertStats {
        mse_linear,
        psnr_linear: psnr(mse_linear),
        mse_gamma,
        psnr_gamma: psnr(mse_gamma),
    }
}

/// PSNR against a max value of 1.0 (normalized float samples).
fn psnr(mse: f64) -> f64 {
    if mse <= 0.0 {
        f64::INFINITY
    } else {
        -10.0 * mse.log10()
    }
}

/// Everything `identify` reports about a loaded image (spec.md §6.1 `identify`).
#[derive(Debug, Clone)]
pub struct IdentifyReport {
    pub width: u32,
    pub height: u32,
    pub depth: u8,
    pub primaries: Primaries,
    pub curve: CurveType,
    pub luminance: u32,
    pub description: String,
}

/// Load an image and report its dimensions/profile without converting it.
pub fn identify(ctx: &Context, path: &Path) -> Result<IdentifyReport> {
    let raw = std::fs::read(path)?;
    let path_str = path.to_string_lossy();
    let plugin = ctx.registry().resolve(&path_str, None, Some(&raw))?;
    let image = plugin.read(&raw)?;
    let (primaries, curve, luminance) = image.profile().query();
    Ok(IdentifyReport {
        width: image.width(),
        height: image.height(),
        depth: image.depth(),
        primaries,
        curve,
        luminance,
        description: image.profile().description().to_string(),
    })
}

/// Synthesize an image from a DSL string and write it out (spec.md §6.1
/// `generate`, §6.2).
pub fn generate(ctx: &Context, spec: &str, profile: &Profile, output: &Path, format: Option<&str>) -> Result<ConvertReport> {
    let image = dsl::parse_image(spec, profile)?;
    let output_str = output.to_string_lossy();
    let plugin = ctx.registry().resolve(&output_str, format, None)?;
    let mut bytes = Vec::new();
    plugin.write(&image, &WriteParams::default(), &mut bytes)?;
    std::fs::write(output, &bytes)?;
    Ok(ConvertReport {
        action: "generate".into(),
        width: image.width(),
        height: image.height(),
        depth: image.depth(),
        format: plugin.name().into(),
        stats: None,
    })
}

/// Convert a single color literal between two profiles (spec.md §6.1 `calc`).
pub fn calc(spec: &str, src_profile: &Profile, dst_profile: &Profile, default_luminance: u32) -> Result<[f32; 4]> {
    let image = dsl::parse_image(spec, src_profile)?;
    let transform = Transform::new(src_profile, dst_profile, ToneMapMode::Auto, ToneMapParams::default());
    let prepared = transform.prepare(default_luminance)?;
    let out = prepared.convert(&image, 32, 1)?;
    let floats = out.to_f32();
    Ok([floats[0], floats[1], floats[2], floats[3]])
}

/// Convert an XYZ triple to a profile's encoded RGBA, used by `calc xyz(...)`
/// and by report/diagnostic paths that need the same conversion `dsl::parse_image`
/// performs for `xyz(...)`/`xyy(...)` tokens.
pub fn xyz_to_rgba(xyz: Xyz, profile: &Profile) -> Result<[f32; 4]> {
    dsl::parse_image(&format!("xyz({},{},{})", xyz.x, xyz.y, xyz.z), profile)
        .map(|img| {
            let floats = img.to_f32();
            [floats[0], floats[1], floats[2], floats[3]]
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn srgb() -> Profile {
        Profile::create_stock("srgb").unwrap()
    }

    #[test]
    fn resize_target_derives_missing_dimension() {
        assert_eq!(resolve_resize_target(&Some((200, -1, ResizeFilter::Box)), 400, 200), (200, 100));
        assert_eq!(resolve_resize_target(&Some((-1, 50, ResizeFilter::Box)), 400, 200), (100, 50));
        assert_eq!(resolve_resize_target(&None, 400, 200), (400, 200));
    }

    #[test]
    fn autograde_convert_succeeds_and_derives_gamma() {
        let dir = std::env::temp_dir();
        let input = dir.join(format!("colorist-planner-autograde-in-{}.ppm", std::process::id()));
        let output = dir.join(format!("colorist-planner-autograde-out-{}.ppm", std::process::id()));

        let ctx = Context::new();
        let image = dsl::parse_image("2x2,#804020..#a0c0ff", &srgb()).unwrap();
        let plugin = ctx.registry().by_name("ppm").unwrap();
        let mut bytes = Vec::new();
        plugin.write(&image, &WriteParams::default(), &mut bytes).unwrap();
        std::fs::write(&input, &bytes).unwrap();

        let req = ConvertRequest {
            input: input.clone(),
            output: output.clone(),
            autograde: true,
            ..Default::default()
        };
        let report = convert(&ctx, &req).unwrap();
        assert_eq!((report.width, report.height), (2, 2));

        std::fs::remove_file(&input).ok();
        std::fs::remove_file(&output).ok();
    }

    #[test]
    fn hald_level_lookup_matches_known_size() {
        let side = ((8 * 8 * 8) as f64).sqrt().round() as usize;
        assert_eq!(hald_level_for_side(side), Some(8));
        assert_eq!(hald_level_for_side(7), None);
    }

    #[test]
    fn convert_round_trip_through_ppm() {
        let dir = std::env::temp_dir();
        let input = dir.join(format!("colorist-planner-in-{}.ppm", std::process::id()));
        let output = dir.join(format!("colorist-planner-out-{}.ppm", std::process::id()));

        let ctx = Context::new();
        let image = dsl::parse_image("4x4,#ff0000", &srgb()).unwrap();
        let plugin = ctx.registry().by_name("ppm").unwrap();
        let mut bytes = Vec::new();
        plugin.write(&image, &WriteParams::default(), &mut bytes).unwrap();
        std::fs::write(&input, &bytes).unwrap();

        let req = ConvertRequest {
            input: input.clone(),
            output: output.clone(),
            ..Default::default()
        };
        let report = convert(&ctx, &req).unwrap();
        assert_eq!((report.width, report.height), (4, 4));

        std::fs::remove_file(&input).ok();
        std::fs::remove_file(&output).ok();
    }

    #[test]
    fn identify_reports_dimensions() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("colorist-planner-identify-{}.ppm", std::process::id()));
        let ctx = Context::new();
        let image = dsl::parse_image("3x2,#00ff00", &srgb()).unwrap();
        let plugin = ctx.registry().by_name("ppm").unwrap();
        let mut bytes = Vec::new();
        plugin.write(&image, &WriteParams::default(), &mut bytes).unwrap();
        std::fs::write(&path, &bytes).unwrap();

        let report = identify(&ctx, &path).unwrap();
        assert_eq!((report.width, report.height), (3, 2));

        std::fs::remove_file(&path).ok();
    }
}
