//! Integration tests for the full `convert`/`identify`/`generate`/`calc`
//! planner sequence (spec.md §4.7, §8) driven entirely through the public
//! API, the way a CLI invocation would exercise it end to end.

use colorist_core::context::Context;
use colorist_core::dsl;
use colorist_core::planner::{self, ConvertRequest};
use colorist_core::profile::{CurveType, Primaries, Profile};
use colorist_core::registry::WriteParams;

fn temp_path(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("colorist-core-it-{tag}-{}.ppm", std::process::id()))
}

/// spec.md §8 "Planner idempotence on identity convert": running `convert`
/// with identical in/out profile and format round-trips bit-exact through
/// the reformat kernel (no color math applied).
#[test]
fn identity_convert_round_trips_bit_exact() {
    let ctx = Context::new();
    let profile = Profile::create_stock("srgb").unwrap();
    let image = dsl::parse_image("4x4,#3366ff..#ffcc00", &profile).unwrap();

    let input = temp_path("identity-in");
    let output = temp_path("identity-out");
    let plugin = ctx.registry().by_name("ppm").unwrap();
    let mut bytes = Vec::new();
    plugin.write(&image, &WriteParams::default(), &mut bytes).unwrap();
    std::fs::write(&input, &bytes).unwrap();

    let req = ConvertRequest {
        input: input.clone(),
        output: output.clone(),
        ..Default::default()
    };
    let report = planner::convert(&ctx, &req).unwrap();
    assert_eq!((report.width, report.height), (4, 4));

    let written = std::fs::read(&output).unwrap();
    assert_eq!(written, bytes, "identity convert must be bit-exact through the reformat kernel");

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();
}

/// spec.md §4.7 steps 7-16: an explicit gamma override forces a real
/// transform (not the reformat kernel), so round-tripping the same bytes
/// back through an inverse-gamma convert recovers the original image.
#[test]
fn gamma_override_convert_changes_pixel_bytes() {
    let ctx = Context::new();
    let src_profile = Profile::create(Primaries::BT709, CurveType::Gamma(2.2), 100, "src").unwrap();
    let image = dsl::parse_image("2x2,#804020..#a0c0ff", &src_profile).unwrap();

    let input = temp_path("gamma-in");
    let output = temp_path("gamma-out");
    let plugin = ctx.registry().by_name("ppm").unwrap();
    let mut bytes = Vec::new();
    plugin.write(&image, &WriteParams::default(), &mut bytes).unwrap();
    std::fs::write(&input, &bytes).unwrap();

    let req = ConvertRequest {
        input: input.clone(),
        output: output.clone(),
        gamma: Some(colorist_core::planner::GammaOverride::Value(1.8)),
        ..Default::default()
    };
    let report = planner::convert(&ctx, &req).unwrap();
    assert_eq!((report.width, report.height), (2, 2));

    let written = std::fs::read(&output).unwrap();
    assert_ne!(written, bytes, "a differing destination gamma must not take the reformat shortcut");

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();
}

/// spec.md §4.7 step 20 / §8: re-running `stats` on an identity convert of a
/// lossless format reports effectively infinite PSNR.
#[test]
fn identity_convert_stats_report_infinite_psnr() {
    let ctx = Context::new();
    let profile = Profile::create_stock("srgb").unwrap();
    let image = dsl::parse_image("2x2,#112233..#eeddcc", &profile).unwrap();

    let input = temp_path("stats-in");
    let output = temp_path("stats-out");
    let plugin = ctx.registry().by_name("ppm").unwrap();
    let mut bytes = Vec::new();
    plugin.write(&image, &WriteParams::default(), &mut bytes).unwrap();
    std::fs::write(&input, &bytes).unwrap();

    let req = ConvertRequest {
        input: input.clone(),
        output: output.clone(),
        stats: true,
        ..Default::default()
    };
    let report = planner::convert(&ctx, &req).unwrap();
    let stats = report.stats.expect("stats requested");
    assert!(stats.psnr_linear.is_infinite() || stats.psnr_linear > 80.0);
    assert!(stats.psnr_gamma.is_infinite() || stats.psnr_gamma > 80.0);

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();
}

/// spec.md §6.2 DSL + `identify`: a generated image's reported dimensions
/// and description match what was written.
#[test]
fn identify_reports_generated_image_dimensions() {
    let ctx = Context::new();
    let profile = Profile::create_stock("srgb").unwrap();
    let path = temp_path("identify");

    let report = planner::generate(&ctx, "5x3,#ff0000", &profile, &path, Some("ppm")).unwrap();
    assert_eq!((report.width, report.height), (5, 3));

    let identify = planner::identify(&ctx, &path).unwrap();
    assert_eq!((identify.width, identify.height), (5, 3));

    std::fs::remove_file(&path).ok();
}

/// spec.md §8 scenario 1: sRGB `#FFFFFF` at 80 nits converted to a
/// PQ/BT.2020 destination at 10,000 nits encodes to PQ-OETF(80/10000) on
/// every channel (white stays achromatic across a shared D65 white point).
#[test]
fn calc_white_to_pq_matches_expected_encoding() {
    let src = Profile::create(Primaries::BT709, CurveType::Gamma(2.4), 80, "src").unwrap();
    let dst = Profile::create(Primaries::BT2020, CurveType::Pq, 10000, "dst").unwrap();

    let rgba = planner::calc("#ffffff", &src, &dst, 100).unwrap();
    let expected = colorist_core::math::pq_oetf(80.0 / 10000.0) as f32;
    assert!((rgba[0] - expected).abs() < 0.01);
    assert!((rgba[1] - expected).abs() < 0.01);
    assert!((rgba[2] - expected).abs() < 0.01);
}
