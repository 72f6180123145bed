//! `colorist` binary entry point: argument parsing, logging setup, and
//! wiring user input into `colorist_core::planner` (spec.md §6.1, §6.4).

mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser;
use colorist_core::context::Context;
use colorist_core::planner::{self, ConvertRequest};
use colorist_core::profile::Profile;
use colorist_core::transform::{ToneMapMode, ToneMapParams};
use colorist_core::Image;

use cli::{Cli, Command};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut ctx = Context::new();
    ctx.set_jobs(cli.jobs);
    ctx.set_default_luminance(cli.deflum);

    match run(&ctx, &cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(ctx: &Context, cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Convert(args) | Command::Modify(args) => run_convert(ctx, args, cli.verbose),
        Command::Identify(args) => run_identify(ctx, args, false),
        Command::Report(args) => run_identify(ctx, args, true),
        Command::Generate(args) => run_generate(ctx, args),
        Command::Calc(args) => run_calc(args, ctx.default_luminance()),
        Command::Hald(args) => run_hald(ctx, args),
        Command::Highlight(args) => run_highlight(ctx, args),
    }
}

fn run_convert(ctx: &Context, args: &cli::ConvertArgs, verbose: bool) -> Result<()> {
    let (tonemap, tonemap_params) = args.tonemap;
    let req = ConvertRequest {
        input: args.input.clone(),
        output: args.output.clone(),
        format: args.format.clone(),
        icc_override_in: args.icc_in.clone(),
        icc_override_out: args.icc_out.clone(),
        noprofile: args.noprofile,
        bpc: args.bpc,
        primaries: args.primaries,
        luminance: args.luminance,
        gamma: args.gamma,
        autograde: args.autograde,
        resize: args.resize,
        crop: args.crop,
        composite: args.composite.clone(),
        composite_params: args.composite_params(),
        hald: args.hald.clone(),
        tonemap,
        tonemap_params,
        stats: args.stats,
        quality: args.quality,
        rate: args.rate,
        description: args.description.clone(),
    };

    let report = planner::convert(ctx, &req).context("convert failed")?;
    if verbose {
        eprintln!(
            "action: {} -> {}x{} depth={} format={}",
            report.action, report.width, report.height, report.depth, report.format
        );
    }
    if let Some(stats) = report.stats {
        println!(
            "PSNR linear={:.2}dB gamma={:.2}dB (MSE linear={:.6} gamma={:.6})",
            stats.psnr_linear, stats.psnr_gamma, stats.mse_linear, stats.mse_gamma
        );
    }
    println!("{}: {}x{} -> {}", report.action, report.width, report.height, args.output.display());
    Ok(())
}

fn run_identify(ctx: &Context, args: &cli::IdentifyArgs, verbose: bool) -> Result<()> {
    let report = planner::identify(ctx, &args.input).context("identify failed")?;
    println!("{}: {}x{}", args.input.display(), report.width, report.height);
    println!("  depth: {}", report.depth);
    println!("  description: {}", report.description);
    println!("  luminance: {} nits", report.luminance);
    if verbose {
        let p = report.primaries;
        println!(
            "  primaries: r=({:.4},{:.4}) g=({:.4},{:.4}) b=({:.4},{:.4}) w=({:.4},{:.4})",
            p.rx, p.ry, p.gx, p.gy, p.bx, p.by, p.wx, p.wy
        );
        println!("  curve: {:?}", report.curve);
    }
    Ok(())
}

fn run_generate(ctx: &Context, args: &cli::GenerateArgs) -> Result<()> {
    let primaries = match args.primaries {
        Some(colorist_core::planner::PrimariesOverride::Stock(p))
        | Some(colorist_core::planner::PrimariesOverride::Explicit(p)) => p,
        None => colorist_core::profile::Primaries::BT709,
    };
    let gamma = match args.gamma {
        Some(colorist_core::planner::GammaOverride::Value(g)) => {
            colorist_core::profile::CurveType::Gamma(g)
        }
        Some(colorist_core::planner::GammaOverride::Pq) => colorist_core::profile::CurveType::Pq,
        Some(colorist_core::planner::GammaOverride::Hlg) => colorist_core::profile::CurveType::Hlg,
        _ => colorist_core::profile::CurveType::Gamma(2.4),
    };
    let profile = Profile::create(primaries, gamma, 300, "Generated")?;

    let report = planner::generate(ctx, &args.spec, &profile, &args.output, args.format.as_deref())
        .context("generate failed")?;
    println!("generate: {}x{} -> {}", report.width, report.height, args.output.display());
    Ok(())
}

fn run_calc(args: &cli::CalcArgs, default_luminance: u32) -> Result<()> {
    let src_primaries = match args.src_primaries {
        Some(colorist_core::planner::PrimariesOverride::Stock(p))
        | Some(colorist_core::planner::PrimariesOverride::Explicit(p)) => p,
        None => colorist_core::profile::Primaries::BT709,
    };
    let dst_primaries = match args.dst_primaries {
        Some(colorist_core::planner::PrimariesOverride::Stock(p))
        | Some(colorist_core::planner::PrimariesOverride::Explicit(p)) => p,
        None => src_primaries,
    };
    let src_gamma = match args.src_gamma {
        Some(colorist_core::planner::GammaOverride::Value(g)) => {
            colorist_core::profile::CurveType::Gamma(g)
        }
        _ => colorist_core::profile::CurveType::Gamma(2.2),
    };
    let dst_gamma = match args.dst_gamma {
        Some(colorist_core::planner::GammaOverride::Value(g)) => {
            colorist_core::profile::CurveType::Gamma(g)
        }
        _ => src_gamma,
    };

    let src = Profile::create(src_primaries, src_gamma, 0, "calc-src")?;
    let dst = Profile::create(dst_primaries, dst_gamma, 0, "calc-dst")?;
    let rgba = planner::calc(&args.color, &src, &dst, default_luminance)?;
    println!(
        "{} -> rgba({:.6}, {:.6}, {:.6}, {:.6})",
        args.color, rgba[0], rgba[1], rgba[2], rgba[3]
    );
    Ok(())
}

fn run_hald(ctx: &Context, args: &cli::HaldArgs) -> Result<()> {
    let req = ConvertRequest {
        input: args.input.clone(),
        output: args.output.clone(),
        hald: Some(args.hald_file.clone()),
        tonemap: ToneMapMode::Off,
        tonemap_params: ToneMapParams::default(),
        ..Default::default()
    };
    let report = planner::convert(ctx, &req).context("hald apply failed")?;
    println!("hald: {}x{} -> {}", report.width, report.height, args.output.display());
    Ok(())
}

fn run_highlight(ctx: &Context, args: &cli::HighlightArgs) -> Result<()> {
    let a = load_image(ctx, &args.a)?;
    let b = load_image(ctx, &args.b)?;
    if a.width() != b.width() || a.height() != b.height() {
        anyhow::bail!("highlight: images must have matching dimensions");
    }

    let identity = Profile::create_stock("srgb")?;

    let fa = a.to_f32();
    let fb = b.to_f32();
    let mut diff = vec![0.0f32; fa.len()];
    for (d, (x, y)) in diff.chunks_exact_mut(4).zip(fa.chunks_exact(4).zip(fb.chunks_exact(4))) {
        let mut max_channel_diff = 0.0f32;
        for c in 0..3 {
            max_channel_diff = max_channel_diff.max((x[c] - y[c]).abs());
        }
        let flagged = max_channel_diff > args.threshold as f32;
        d[0] = if flagged { 1.0 } else { 0.0 };
        d[1] = if flagged { 0.0 } else { max_channel_diff };
        d[2] = 0.0;
        d[3] = 1.0;
    }

    let pixels = colorist_core::pixelmath::f32_buffer_to_depth(&diff, 8);
    let out_image = Image::from_pixels(a.width(), a.height(), 8, identity, pixels)?;

    let output_str = args.output.to_string_lossy();
    let plugin = ctx.registry().resolve(&output_str, None, None)?;
    let mut bytes = Vec::new();
    plugin.write(&out_image, &Default::default(), &mut bytes)?;
    std::fs::write(&args.output, &bytes)?;
    println!("highlight: wrote {}", args.output.display());
    Ok(())
}

fn load_image(ctx: &Context, path: &Path) -> Result<Image> {
    let raw = std::fs::read(path)?;
    let path_str = path.to_string_lossy();
    let plugin = ctx.registry().resolve(&path_str, None, Some(&raw))?;
    Ok(plugin.read(&raw)?)
}
