//! Command-line argument surface (A3), mirroring `original_source/bin/colorist/main.c`'s
//! hand-rolled flag loop one verb/flag at a time via `clap`'s derive API
//! (spec.md §6.1).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colorist_core::pixelmath::ResizeFilter;
use colorist_core::planner::{CompositeParams, GammaOverride, LuminanceOverride, PrimariesOverride};
use colorist_core::profile::Primaries;
use colorist_core::transform::{ToneMapMode, ToneMapParams};

/// Color-accurate image conversion, built on `colorist-core`.
#[derive(Debug, Parser)]
#[command(name = "colorist", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Worker count; 0 means "use all logical CPUs" (spec.md §6.1 `-j/--jobs`).
    #[arg(short = 'j', long, global = true, default_value_t = 0)]
    pub jobs: usize,

    /// Nits assumed when a profile's luminance is unspecified (`--deflum`).
    #[arg(long, global = true, default_value_t = colorist_core::context::DEFAULT_LUMINANCE)]
    pub deflum: u32,

    /// Print per-step decisions and estimated source parameters.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert an image from one format/profile to another.
    Convert(ConvertArgs),
    /// Print an image's dimensions and color profile.
    Identify(IdentifyArgs),
    /// Synthesize an image from the DSL (spec.md §6.2).
    Generate(GenerateArgs),
    /// Convert a single DSL color literal between two profiles.
    Calc(CalcArgs),
    /// Apply a HALD CLUT image to another image.
    Hald(HaldArgs),
    /// Re-encode an image in place with the same flags as `convert`.
    Modify(ConvertArgs),
    /// Identify plus a verbose, human-readable profile report.
    Report(IdentifyArgs),
    /// Diff two images and write a false-color difference map.
    Highlight(HighlightArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    pub input: PathBuf,
    pub output: PathBuf,

    /// Force output format (must be registered).
    #[arg(short = 'f', long)]
    pub format: Option<String>,

    /// Destination bits per channel.
    #[arg(short = 'b', long)]
    pub bpc: Option<u8>,

    /// ICC string description tag.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Stock name (bt709, bt2020, p3) or 8 comma-separated floats
    /// `rx,ry,gx,gy,bx,by,wx,wy`.
    #[arg(short = 'p', long, value_parser = parse_primaries)]
    pub primaries: Option<PrimariesOverride>,

    /// "pq", "hlg", "s"/"source", or a positive float.
    #[arg(short = 'g', long, value_parser = parse_gamma)]
    pub gamma: Option<GammaOverride>,

    /// Integer nits, "s" = source, "u" = unspecified.
    #[arg(short = 'l', long, value_parser = parse_luminance)]
    pub luminance: Option<LuminanceOverride>,

    /// Enable autograde.
    #[arg(short = 'a', long)]
    pub autograde: bool,

    /// `W,H[,filter]`; either dimension may be 0 to derive from aspect ratio.
    #[arg(long, value_parser = parse_resize)]
    pub resize: Option<(i64, i64, ResizeFilter)>,

    /// `x,y,w,h` crop rectangle.
    #[arg(short = 'z', long = "rect", alias = "crop", value_parser = parse_rect)]
    pub crop: Option<(i64, i64, i64, i64)>,

    /// `auto|on|off[,contrast=...,clip=...,speed=...,power=...]`.
    #[arg(short = 't', long, value_parser = parse_tonemap, default_value = "auto")]
    pub tonemap: (ToneMapMode, ToneMapParams),

    #[arg(short = 'i', long = "iccin")]
    pub icc_in: Option<PathBuf>,

    #[arg(short = 'o', long = "iccout")]
    pub icc_out: Option<PathBuf>,

    #[arg(long)]
    pub composite: Option<PathBuf>,

    #[arg(long = "composite-gamma", default_value_t = 2.2)]
    pub composite_gamma: f64,

    #[arg(long = "composite-tonemap", value_parser = parse_tonemap_mode, default_value = "auto")]
    pub composite_tonemap: ToneMapMode,

    #[arg(long = "composite-premultiplied")]
    pub composite_premultiplied: bool,

    #[arg(long)]
    pub hald: Option<PathBuf>,

    #[arg(long)]
    pub stats: bool,

    /// Drop any embedded ICC profile from the output instead of
    /// passing/writing one.
    #[arg(short = 'n', long)]
    pub noprofile: bool,

    #[arg(short = 'q', long)]
    pub quality: Option<u8>,

    #[arg(short = 'r', long)]
    pub rate: Option<u32>,
}

impl ConvertArgs {
    pub fn composite_params(&self) -> CompositeParams {
        CompositeParams {
            gamma: self.composite_gamma,
            tonemap: self.composite_tonemap,
            premultiplied: self.composite_premultiplied,
        }
    }
}

#[derive(Debug, Args)]
pub struct IdentifyArgs {
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// The image DSL string (spec.md §6.2).
    pub spec: String,
    pub output: PathBuf,

    #[arg(short = 'f', long)]
    pub format: Option<String>,

    #[arg(short = 'p', long, value_parser = parse_primaries)]
    pub primaries: Option<PrimariesOverride>,

    #[arg(short = 'g', long, value_parser = parse_gamma)]
    pub gamma: Option<GammaOverride>,
}

#[derive(Debug, Args)]
pub struct CalcArgs {
    /// A single DSL color literal.
    pub color: String,

    #[arg(long, value_parser = parse_primaries)]
    pub src_primaries: Option<PrimariesOverride>,
    #[arg(long, value_parser = parse_gamma)]
    pub src_gamma: Option<GammaOverride>,

    #[arg(long, value_parser = parse_primaries)]
    pub dst_primaries: Option<PrimariesOverride>,
    #[arg(long, value_parser = parse_gamma)]
    pub dst_gamma: Option<GammaOverride>,
}

#[derive(Debug, Args)]
pub struct HaldArgs {
    pub hald_file: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct HighlightArgs {
    pub a: PathBuf,
    pub b: PathBuf,
    pub output: PathBuf,

    /// Per-channel difference threshold (0..1) below which a pixel is
    /// considered matching.
    #[arg(long, default_value_t = 0.02)]
    pub threshold: f64,
}

fn parse_primaries(s: &str) -> Result<PrimariesOverride, String> {
    if let Some(stock) = Primaries::from_stock_name(s) {
        return Ok(PrimariesOverride::Stock(stock));
    }
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("invalid primaries {s:?}: expected a stock name or 8 floats"))?;
    if parts.len() != 8 {
        return Err(format!(
            "invalid primaries {s:?}: expected 8 comma-separated floats, got {}",
            parts.len()
        ));
    }
    Ok(PrimariesOverride::Explicit(Primaries {
        rx: parts[0],
        ry: parts[1],
        gx: parts[2],
        gy: parts[3],
        bx: parts[4],
        by: parts[5],
        wx: parts[6],
        wy: parts[7],
    }))
}

fn parse_gamma(s: &str) -> Result<GammaOverride, String> {
    match s.to_ascii_lowercase().as_str() {
        "pq" => Ok(GammaOverride::Pq),
        "hlg" => Ok(GammaOverride::Hlg),
        "s" | "source" => Ok(GammaOverride::Source),
        other => other
            .parse::<f64>()
            .map(GammaOverride::Value)
            .map_err(|_| format!("invalid gamma {s:?}: expected pq, hlg, s/source, or a positive float")),
    }
}

fn parse_luminance(s: &str) -> Result<LuminanceOverride, String> {
    match s.to_ascii_lowercase().as_str() {
        "s" | "source" => Ok(LuminanceOverride::Source),
        "u" | "unspecified" => Ok(LuminanceOverride::Unspecified),
        other => other
            .parse::<u32>()
            .map(LuminanceOverride::Nits)
            .map_err(|_| format!("invalid luminance {s:?}: expected an integer, s, or u")),
    }
}

fn parse_resize(s: &str) -> Result<(i64, i64, ResizeFilter), String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("invalid --resize {s:?}: expected W,H[,filter]"));
    }
    let w: i64 = parts[0].parse().map_err(|_| format!("invalid resize width {:?}", parts[0]))?;
    let h: i64 = parts[1].parse().map_err(|_| format!("invalid resize height {:?}", parts[1]))?;
    let filter = if parts.len() == 3 {
        parse_resize_filter(parts[2])?
    } else {
        ResizeFilter::Auto
    };
    Ok((w, h, filter))
}

fn parse_resize_filter(s: &str) -> Result<ResizeFilter, String> {
    match s.to_ascii_lowercase().as_str() {
        "auto" => Ok(ResizeFilter::Auto),
        "nearest" => Ok(ResizeFilter::Nearest),
        "box" => Ok(ResizeFilter::Box),
        "triangle" | "linear" | "bilinear" => Ok(ResizeFilter::Triangle),
        "cubic" => Ok(ResizeFilter::Cubic),
        "catmullrom" | "catmull-rom" => Ok(ResizeFilter::CatmullRom),
        "mitchell" => Ok(ResizeFilter::Mitchell),
        other => Err(format!("unknown resize filter {other:?}")),
    }
}

fn parse_rect(s: &str) -> Result<(i64, i64, i64, i64), String> {
    let parts: Vec<i64> = s
        .split(',')
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("invalid rect {s:?}: expected x,y,w,h"))?;
    if parts.len() != 4 {
        return Err(format!("invalid rect {s:?}: expected exactly 4 components"));
    }
    Ok((parts[0], parts[1], parts[2], parts[3]))
}

fn parse_tonemap_mode(s: &str) -> Result<ToneMapMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "auto" => Ok(ToneMapMode::Auto),
        "on" => Ok(ToneMapMode::On),
        "off" => Ok(ToneMapMode::Off),
        other => Err(format!("unknown tonemap mode {other:?}")),
    }
}

fn parse_tonemap(s: &str) -> Result<(ToneMapMode, ToneMapParams), String> {
    let mut parts = s.split(',');
    let mode = parse_tonemap_mode(parts.next().unwrap_or("auto"))?;
    let mut params = ToneMapParams::default();
    for kv in parts {
        let (key, value) = kv
            .split_once('=')
            .ok_or_else(|| format!("invalid tonemap option {kv:?}: expected key=value"))?;
        let value: f64 = value
            .parse()
            .map_err(|_| format!("invalid tonemap value {value:?} for {key:?}"))?;
        match key {
            "contrast" => params.contrast = value,
            "clip" => params.clip_point = value,
            "speed" => params.speed = value,
            "power" => params.power = value,
            other => return Err(format!("unknown tonemap option {other:?}")),
        }
    }
    Ok((mode, params))
}
