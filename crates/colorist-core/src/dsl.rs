//! Image string DSL (spec.md §6.2), grounded in
//! `original_source/lib/src/image.c`'s `clImageParseString`: a compact
//! textual notation for synthesizing a test image from the command line
//! without needing a real input file (`generate`/`modify`/`highlight`
//! verbs, spec.md §6.1).
//!
//! Top-level tokens are comma-separated (`|` and `/` are accepted as
//! equivalent separators, since this crate lays every token out along one
//! sequence rather than distinct vertical stripes — see DESIGN.md). Each
//! token is a color literal, a gradient, or a directive (`WxH`, `xN`,
//! `cw`/`ccw`, `@file`).

use crate::color::Xyz;
use crate::error::{Error, Result};
use crate::image::Image;
use crate::profile::Profile;

/// Parse `spec` into a raster image, encoding every color literal for
/// `profile` (spec.md §4.6 `parseString`).
pub fn parse_image(spec: &str, profile: &Profile) -> Result<Image> {
    let expanded = expand_response_files(spec, 0)?;
    let tokens = split_top_level(&expanded);

    let mut colors: Vec<[f32; 4]> = Vec::new();
    let mut size: Option<(u32, u32)> = None;
    let mut turns: i32 = 0;

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some(wh) = parse_size(token)? {
            size = Some(wh);
            continue;
        }
        if token.eq_ignore_ascii_case("cw") {
            turns += 1;
            continue;
        }
        if token.eq_ignore_ascii_case("ccw") {
            turns -= 1;
            continue;
        }
        if let Some(count) = parse_repeat(token)? {
            let last = *colors
                .last()
                .ok_or_else(|| Error::Validation(format!("{token:?} has no preceding color to repeat")))?;
            for _ in 0..count {
                colors.push(last);
            }
            continue;
        }
        if let Some((a, b, count)) = parse_gradient(token)? {
            let start = parse_color(&a, profile)?;
            let end = parse_color(&b, profile)?;
            for i in 0..count {
                let t = if count <= 1 { 0.0 } else { i as f32 / (count - 1) as f32 };
                colors.push(lerp_color(start, end, t));
            }
            continue;
        }
        colors.push(parse_color(token, profile)?);
    }

    if colors.is_empty() {
        return Err(Error::Validation("image DSL produced no colors".into()));
    }

    let (w, h) = size.unwrap_or((colors.len() as u32, 1));
    if w == 0 || h == 0 {
        return Err(Error::Validation("image DSL size must be positive".into()));
    }
    let total = w as usize * h as usize;

    let mut image = Image::create(w, h, 8, Some(profile))?;
    for i in 0..total {
        let color = colors[i % colors.len()];
        let x = (i % w as usize) as u32;
        let y = (i / w as usize) as u32;
        image.set_pixel(x, y, color)?;
    }

    if turns != 0 {
        image.rotate(turns);
    }

    Ok(image)
}

fn lerp_color(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

/// Recursively splice `@file` response files into the DSL text.
fn expand_response_files(spec: &str, depth: u32) -> Result<String> {
    if depth > 8 {
        return Err(Error::Validation("@file response-file nesting too deep".into()));
    }
    let tokens = split_top_level(spec);
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let trimmed = token.trim();
        if let Some(path) = trimmed.strip_prefix('@') {
            let contents = std::fs::read_to_string(path)?;
            out.push(expand_response_files(contents.trim(), depth + 1)?);
        } else {
            out.push(token.to_string());
        }
    }
    Ok(out.join(","))
}

/// Split on top-level `,`, `|`, `/`, ignoring separators inside parentheses.
fn split_top_level(spec: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    for c in spec.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' | '|' | '/' if depth == 0 => {
                tokens.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// `WxH` size directive; distinguished from the `xN` repeat directive by
/// requiring the token to *start* with a digit.
fn parse_size(token: &str) -> Result<Option<(u32, u32)>> {
    let Some(first) = token.chars().next() else {
        return Ok(None);
    };
    if !first.is_ascii_digit() {
        return Ok(None);
    }
    let Some((w, h)) = token.split_once(['x', 'X']) else {
        return Ok(None);
    };
    let w: u32 = w
        .parse()
        .map_err(|_| Error::Validation(format!("invalid width in {token:?}")))?;
    let h: u32 = h
        .parse()
        .map_err(|_| Error::Validation(format!("invalid height in {token:?}")))?;
    Ok(Some((w, h)))
}

/// `xN` repeat directive.
fn parse_repeat(token: &str) -> Result<Option<usize>> {
    let Some(rest) = token.strip_prefix(['x', 'X']) else {
        return Ok(None);
    };
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return Ok(None);
    }
    let n: usize = rest
        .parse()
        .map_err(|_| Error::Validation(format!("invalid repeat count in {token:?}")))?;
    Ok(Some(n))
}

/// `A..B` (count inferred) or `A.N.B` (explicit count) gradient forms.
fn parse_gradient(token: &str) -> Result<Option<(String, String, usize)>> {
    if let Some(idx) = token.find("..") {
        let a = token[..idx].to_string();
        let b = token[idx + 2..].to_string();
        if a.is_empty() || b.is_empty() {
            return Ok(None);
        }
        let count = inferred_gradient_count(&a, &b)?;
        return Ok(Some((a, b, count)));
    }
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() == 3 && !parts.iter().any(|p| p.is_empty()) {
        if let Ok(count) = parts[1].parse::<usize>() {
            return Ok(Some((parts[0].to_string(), parts[2].to_string(), count.max(2))));
        }
    }
    Ok(None)
}

/// Count inferred from the largest per-channel 8-bit difference between the
/// two gradient endpoints (spec.md §6.2 "count inferred from channel diff").
fn inferred_gradient_count(a: &str, b: &str) -> Result<usize> {
    // A dummy profile suffices: only the raw channel bytes matter here, not
    // their color-managed meaning.
    let neutral = Profile::create_stock("srgb")?;
    let ca = parse_color(a, &neutral)?;
    let cb = parse_color(b, &neutral)?;
    let max_diff = ca
        .iter()
        .zip(cb.iter())
        .map(|(x, y)| ((x - y).abs() * 255.0).round() as i64)
        .max()
        .unwrap_or(0);
    Ok((max_diff as usize + 1).max(2))
}

/// Parse a single color literal (spec.md §6.2).
fn parse_color(token: &str, profile: &Profile) -> Result<[f32; 4]> {
    let token = token.trim();
    if let Some(hex) = token.strip_prefix('#') {
        return parse_hex_color(hex);
    }
    if let Some(inner) = token.strip_prefix("rgba16(").and_then(|s| s.strip_suffix(')')) {
        return parse_depth_tuple(inner, 65535.0, true);
    }
    if let Some(inner) = token.strip_prefix("rgb16(").and_then(|s| s.strip_suffix(')')) {
        return parse_depth_tuple(inner, 65535.0, false);
    }
    if let Some(inner) = token.strip_prefix("rgba(").and_then(|s| s.strip_suffix(')')) {
        return parse_depth_tuple(inner, 255.0, true);
    }
    if let Some(inner) = token.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
        return parse_depth_tuple(inner, 255.0, false);
    }
    if let Some(inner) = token.strip_prefix("float(").and_then(|s| s.strip_suffix(')')) {
        return parse_float_tuple(inner);
    }
    if let Some(inner) = token.strip_prefix("f(").and_then(|s| s.strip_suffix(')')) {
        return parse_float_tuple(inner);
    }
    if let Some(inner) = token.strip_prefix("xyz(").and_then(|s| s.strip_suffix(')')) {
        let [x, y, z] = parse_three(inner)?;
        return xyz_to_profile_rgba([x, y, z], profile);
    }
    if let Some(inner) = token.strip_prefix("xyy(").and_then(|s| s.strip_suffix(')')) {
        let [x, y, yy] = parse_three(inner)?;
        let xyz = Xyz::from_xyy(x as f64, y as f64, yy as f64).to_array();
        return xyz_to_profile_rgba([xyz[0] as f32, xyz[1] as f32, xyz[2] as f32], profile);
    }
    if let Some(inner) = token.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        return parse_depth_tuple(inner, 255.0, inner.split(',').count() == 4);
    }
    Err(Error::Validation(format!("unrecognized color literal {token:?}")))
}

fn parse_hex_color(hex: &str) -> Result<[f32; 4]> {
    let n = hex.len();
    if n != 6 && n != 8 {
        return Err(Error::Validation(format!("hex color must be 6 or 8 digits, got {hex:?}")));
    }
    let byte = |s: &str| -> Result<f32> {
        u8::from_str_radix(s, 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| Error::Validation(format!("invalid hex digit in {hex:?}")))
    };
    let r = byte(&hex[0..2])?;
    let g = byte(&hex[2..4])?;
    let b = byte(&hex[4..6])?;
    let a = if n == 8 { byte(&hex[6..8])? } else { 1.0 };
    Ok([r, g, b, a])
}

fn parse_depth_tuple(inner: &str, max: f32, has_alpha: bool) -> Result<[f32; 4]> {
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    let expected = if has_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return Err(Error::Validation(format!(
            "expected {expected} components in ({inner})"
        )));
    }
    let value = |s: &str| -> Result<f32> {
        s.parse::<f64>()
            .map(|v| (v as f32 / max).clamp(0.0, 1.0))
            .map_err(|_| Error::Validation(format!("invalid numeric component {s:?}")))
    };
    let r = value(parts[0])?;
    let g = value(parts[1])?;
    let b = value(parts[2])?;
    let a = if has_alpha { value(parts[3])? } else { 1.0 };
    Ok([r, g, b, a])
}

fn parse_float_tuple(inner: &str) -> Result<[f32; 4]> {
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(Error::Validation(format!("expected 3 or 4 components in f({inner})")));
    }
    let value = |s: &str| -> Result<f32> {
        s.parse::<f32>()
            .map(|v| v.clamp(0.0, 1.0))
            .map_err(|_| Error::Validation(format!("invalid numeric component {s:?}")))
    };
    let r = value(parts[0])?;
    let g = value(parts[1])?;
    let b = value(parts[2])?;
    let a = if parts.len() == 4 { value(parts[3])? } else { 1.0 };
    Ok([r, g, b, a])
}

fn parse_three(inner: &str) -> Result<[f32; 3]> {
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(Error::Validation(format!("expected 3 components in ({inner})")));
    }
    let value = |s: &str| -> Result<f32> {
        s.parse::<f32>()
            .map_err(|_| Error::Validation(format!("invalid numeric component {s:?}")))
    };
    Ok([value(parts[0])?, value(parts[1])?, value(parts[2])?])
}

/// Convert an XYZ triple to normalized RGBA under `profile` (spec.md §6.2
/// "converted to destination RGB at parse time using an XYZ→dst transform").
fn xyz_to_profile_rgba(xyz: [f32; 3], profile: &Profile) -> Result<[f32; 4]> {
    let to_xyz = crate::transform::rgb_to_xyz_matrix(&profile.primaries())?;
    let to_rgb = to_xyz
        .inverse()
        .ok_or_else(|| Error::SingularMatrix("profile primaries matrix is singular".into()))?;
    let lin = to_rgb.multiply_vec([xyz[0] as f64, xyz[1] as f64, xyz[2] as f64]);
    let curve = profile.curve();
    Ok([
        curve.encode(lin[0].clamp(0.0, 1.0)) as f32,
        curve.encode(lin[1].clamp(0.0, 1.0)) as f32,
        curve.encode(lin[2].clamp(0.0, 1.0)) as f32,
        1.0,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelBuffer;

    fn srgb() -> Profile {
        Profile::create_stock("srgb").unwrap()
    }

    #[test]
    fn parses_hex_color() {
        let img = parse_image("#ff0000", &srgb()).unwrap();
        assert_eq!(img.width(), 1);
        assert_eq!(img.height(), 1);
        match img.pixels() {
            PixelBuffer::U8(px) => assert_eq!(&px[0..3], &[255, 0, 0]),
            _ => panic!("expected U8"),
        }
    }

    #[test]
    fn parses_decimal_tuple() {
        let img = parse_image("(0,128,255)", &srgb()).unwrap();
        match img.pixels() {
            PixelBuffer::U8(px) => assert_eq!(&px[0..3], &[0, 128, 255]),
            _ => panic!("expected U8"),
        }
    }

    #[test]
    fn parses_size_directive_and_fills() {
        let img = parse_image("2x2,#ff0000", &srgb()).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
    }

    #[test]
    fn repeat_directive_duplicates_last_color() {
        let img = parse_image("#ff0000,x3", &srgb()).unwrap();
        assert_eq!(img.width(), 4);
    }

    #[test]
    fn gradient_with_explicit_count() {
        let img = parse_image("#000000.4.#ffffff", &srgb()).unwrap();
        assert_eq!(img.width(), 4);
    }

    #[test]
    fn rotation_directive_swaps_dimensions() {
        let img = parse_image("4x2,#ff0000,x7,cw", &srgb()).unwrap();
        assert_eq!((img.width(), img.height()), (2, 4));
    }

    #[test]
    fn response_file_is_spliced_in() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("colorist-dsl-test-{}.txt", std::process::id()));
        std::fs::write(&path, "#00ff00").unwrap();
        let spec = format!("@{}", path.display());
        let img = parse_image(&spec, &srgb()).unwrap();
        match img.pixels() {
            PixelBuffer::U8(px) => assert_eq!(&px[0..3], &[0, 255, 0]),
            _ => panic!("expected U8"),
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_unrecognized_token() {
        assert!(parse_image("not-a-color", &srgb()).is_err());
    }
}
