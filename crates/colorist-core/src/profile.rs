//! Profile model (C3): primaries, transfer curve, mastering luminance, and
//! the ICC byte blob they were parsed from (if any).
//!
//! Grounded in `icc/parser.rs` for reading real ICC bytes (colorant/TRC/chad
//! tags); the chad back-out described in spec.md §4.3/§9 inverts the parsed
//! `chad` tag directly against the colorant/white XYZ triples. Unlike the
//! C source's lazy `query()`, a
//! parsed profile resolves its primaries/curve/luminance once at parse time
//! and stores them directly -- `query()` is then just a field read for both
//! parsed and synthetic profiles (see DESIGN.md).

use crate::color::Xyz;
use crate::error::{Error, Result};
use crate::hash;
use crate::icc::{IccProfile, TagSignature, header::ColorSpace as IccColorSpace};
use crate::math::matrix::Matrix3x3;

/// Four chromaticity pairs defining an RGB gamut (spec.md §3 `primaries`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primaries {
    pub rx: f64,
    pub ry: f64,
    pub gx: f64,
    pub gy: f64,
    pub bx: f64,
    pub by: f64,
    pub wx: f64,
    pub wy: f64,
}

impl Primaries {
    /// Rec. 709 / sRGB primaries, D65 white.
    pub const BT709: Self = Self {
        rx: 0.64,
        ry: 0.33,
        gx: 0.30,
        gy: 0.60,
        bx: 0.15,
        by: 0.06,
        wx: 0.3127,
        wy: 0.3290,
    };

    /// Rec. 2020 primaries, D65 white.
    pub const BT2020: Self = Self {
        rx: 0.708,
        ry: 0.292,
        gx: 0.170,
        gy: 0.797,
        bx: 0.131,
        by: 0.046,
        wx: 0.3127,
        wy: 0.3290,
    };

    /// DCI-P3 primaries, D65 white (the common "Display P3" variant, not the
    /// theatrical DCI white).
    pub const P3: Self = Self {
        rx: 0.680,
        ry: 0.320,
        gx: 0.265,
        gy: 0.690,
        bx: 0.150,
        by: 0.060,
        wx: 0.3127,
        wy: 0.3290,
    };

    /// Every component non-zero, as required for a usable profile.
    fn is_valid(&self) -> bool {
        [self.rx, self.ry, self.gx, self.gy, self.bx, self.by, self.wx, self.wy]
            .iter()
            .all(|v| *v != 0.0)
    }

    /// `true` if every chromaticity matches `other` within `epsilon`
    /// (spec.md §4.2 "if source and destination primaries match").
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.rx - other.rx).abs() < epsilon
            && (self.ry - other.ry).abs() < epsilon
            && (self.gx - other.gx).abs() < epsilon
            && (self.gy - other.gy).abs() < epsilon
            && (self.bx - other.bx).abs() < epsilon
            && (self.by - other.by).abs() < epsilon
            && (self.wx - other.wx).abs() < epsilon
            && (self.wy - other.wy).abs() < epsilon
    }

    /// Look up a stock name used by `-p/--primaries` (spec.md §6.1).
    pub fn from_stock_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bt709" | "709" | "srgb" => Some(Self::BT709),
            "bt2020" | "2020" => Some(Self::BT2020),
            "p3" => Some(Self::P3),
            _ => None,
        }
    }
}

/// Transfer curve variant (spec.md §3 `curve`). `Complex` carries only an
/// estimated gamma for reporting/estimation; it is never synthesised back
/// into an ICC profile (spec.md §4.3, §7 Unsupported).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveType {
    Gamma(f64),
    Pq,
    Hlg,
    Complex(f64),
}

impl CurveType {
    /// The implicit scale multiplier folded into luminance-scale math
    /// (spec.md §3 "curve also carries an implicit scale multiplier").
    /// PQ's 10,000 nit encoding and HLG's 1,000 nit nominal peak are both
    /// reconciled against the profile's declared `maxLuminance` this way;
    /// Gamma (and the reporting-only Complex) have scale 1.0.
    pub fn implicit_scale(&self, max_luminance: f64) -> f64 {
        let max_luminance = max_luminance.max(1.0);
        match self {
            CurveType::Pq => 10_000.0 / max_luminance,
            CurveType::Hlg => 1_000.0 / max_luminance,
            CurveType::Gamma(_) | CurveType::Complex(_) => 1.0,
        }
    }

    /// EOTF: encoded value in [0,1] -> linear light.
    pub fn decode(&self, v: f64) -> f64 {
        match self {
            CurveType::Gamma(g) | CurveType::Complex(g) => v.max(0.0).powf(*g),
            CurveType::Pq => crate::math::pq_eotf(v),
            CurveType::Hlg => crate::math::hlg_eotf(v),
        }
    }

    /// OETF: linear light -> encoded value in [0,1].
    pub fn encode(&self, v: f64) -> f64 {
        match self {
            CurveType::Gamma(g) | CurveType::Complex(g) => v.max(0.0).powf(1.0 / g.max(1e-9)),
            CurveType::Pq => crate::math::pq_oetf(v),
            CurveType::Hlg => crate::math::hlg_oetf(v),
        }
    }

    /// `true` for the only variant `pack()` can synthesise back into ICC
    /// bytes (spec.md §4.3/§7: "curve type that cannot be synthesised into
    /// an ICC profile (non-gamma)").
    pub fn is_simple_gamma(&self) -> bool {
        matches!(self, CurveType::Gamma(_))
    }
}

/// MD5 signatures of the three canonical PQ profiles colorist ships
/// (`HDR_HD_ST2084.icc`, `HDR_P3_D65_ST2084.icc`, `HDR_UHD_ST2084.icc`),
/// each paired with the stock primaries name the whole-profile signature
/// implies (spec.md §4.3 `hasPQSignature`, ported from `profile_pq.c`).
const PQ_PROFILE_MD5: &[([u8; 16], Primaries)] = &[
    (
        [0x59, 0x53, 0xac, 0x21, 0x04, 0x41, 0x70, 0xc4, 0x7c, 0x98, 0x9e, 0xa6, 0x27, 0x11, 0x42, 0xd9],
        Primaries::BT709,
    ),
    (
        [0x57, 0x15, 0xa6, 0x9d, 0xc0, 0xc9, 0x89, 0x16, 0x1e, 0x3f, 0x71, 0x6a, 0xe3, 0x72, 0xa0, 0x1d],
        Primaries::P3,
    ),
    (
        [0xbf, 0x0c, 0x50, 0x8c, 0x59, 0xaa, 0xfc, 0xa1, 0x17, 0xc3, 0xcf, 0xce, 0xd6, 0xf3, 0xe3, 0x07],
        Primaries::BT2020,
    ),
];

/// MD5 sentinels for the raw `rTRC` curve payload of the canonical PQ/HLG
/// curves (spec.md §4.3 `curveSignature`, ported from `profile_curves.c`'s
/// `sentinelPQCurve_`/`sentinelHLGCurve_`). The original gates this check on
/// the raw tag byte length matching a build-embedded `pqCurveBinarySize`
/// constant before hashing; that constant is generated from a binary blob
/// not present in this crate's grounding corpus, so the length pre-filter is
/// dropped here and the MD5 alone decides -- strictly correct, just without
/// the original's cheap early-out.
const PQ_CURVE_MD5: [u8; 16] =
    [0x40, 0xb8, 0xbe, 0x41, 0x32, 0xd9, 0x58, 0x33, 0x1c, 0xaa, 0xc1, 0x20, 0x4c, 0x72, 0xdc, 0xae];
const HLG_CURVE_MD5: [u8; 16] =
    [0x68, 0x88, 0x4e, 0xc0, 0xd3, 0x82, 0xe4, 0x43, 0xcd, 0x03, 0x91, 0xfd, 0xb9, 0x17, 0x8e, 0x94];

/// Color profile: primaries, transfer curve, mastering luminance,
/// description, and (if parsed from bytes) the opaque ICC blob it came from
/// (spec.md §3 `Profile`).
#[derive(Debug, Clone)]
pub struct Profile {
    primaries: Primaries,
    curve: CurveType,
    max_luminance: u32,
    description: String,
    icc: Option<Vec<u8>>,
}

impl Profile {
    /// Construct directly from primaries/curve/luminance/description
    /// (spec.md §4.3 `create`). Fails only if a primary component is zero.
    pub fn create(
        primaries: Primaries,
        curve: CurveType,
        max_luminance: u32,
        description: impl Into<String>,
    ) -> Result<Self> {
        if !primaries.is_valid() {
            return Err(Error::Validation(
                "profile primaries must be non-zero".into(),
            ));
        }
        if let CurveType::Gamma(g) = curve {
            if !(g > 0.0) {
                return Err(Error::Validation("gamma must be > 0".into()));
            }
        }
        Ok(Self {
            primaries,
            curve,
            max_luminance,
            description: description.into(),
            icc: None,
        })
    }

    /// A named stock profile (spec.md §4.3 `createStock`).
    pub fn create_stock(id: &str) -> Result<Self> {
        match id.to_ascii_lowercase().as_str() {
            "srgb" => Self::create(Primaries::BT709, CurveType::Gamma(2.4), 300, "sRGB"),
            "bt709" => Self::create(Primaries::BT709, CurveType::Gamma(2.4), 100, "BT.709"),
            "bt2020-pq" => Self::create(Primaries::BT2020, CurveType::Pq, 10_000, "BT.2020 PQ"),
            "bt2020-hlg" => Self::create(Primaries::BT2020, CurveType::Hlg, 1_000, "BT.2020 HLG"),
            "p3" => Self::create(Primaries::P3, CurveType::Gamma(2.6), 48, "Display P3"),
            other => Err(Error::Unsupported(format!("unknown stock profile {other:?}"))),
        }
    }

    /// Parse an embedded or on-disk ICC profile, resolving its primaries,
    /// curve, and luminance once up front (spec.md §4.3 `parse`). The raw
    /// bytes are preserved for lossless pass-through (`icc_bytes`).
    pub fn parse(icc_bytes: &[u8], description_override: Option<&str>) -> Result<Self> {
        let icc = IccProfile::parse(icc_bytes)
            .map_err(|e| Error::InvalidProfile(e.to_string()))?;

        let description = description_override
            .map(str::to_string)
            .or_else(|| icc.description())
            .map(|s| clean_ascii(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let pq_stock_primaries = pq_signature_primaries(icc_bytes);

        let (primaries, curve) = if let Some(stock) = pq_stock_primaries {
            // The original resolves primaries from the matched signature's
            // stock name directly rather than re-deriving them from the
            // colorant tags (`profile_pq.c` `clProfileHasPQSignature`).
            (stock, CurveType::Pq)
        } else {
            let primaries = colorant_primaries(&icc).unwrap_or(Primaries::BT709);
            let curve = match curve_signature(&icc) {
                Some(sig) => sig,
                None => curve_from_trc(&icc),
            };
            (primaries, curve)
        };

        let max_luminance = luminance_tag(&icc).unwrap_or(0);

        Ok(Self {
            primaries,
            curve,
            max_luminance,
            description,
            icc: Some(icc_bytes.to_vec()),
        })
    }

    /// Load a `.icc` file from disk (spec.md §4.3 lifecycle "(d)").
    pub fn read_file(path: &std::path::Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes, None)
    }

    pub fn primaries(&self) -> Primaries {
        self.primaries
    }

    pub fn curve(&self) -> CurveType {
        self.curve
    }

    /// Effective mastering luminance: the stored value, or `default` if
    /// unspecified (0), per spec.md §3 "0 encodes unspecified".
    pub fn effective_luminance(&self, default: u32) -> u32 {
        if self.max_luminance == 0 { default } else { self.max_luminance }
    }

    pub fn raw_max_luminance(&self) -> u32 {
        self.max_luminance
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn icc_bytes(&self) -> Option<&[u8]> {
        self.icc.as_deref()
    }

    /// Drop any parsed ICC bytes, forcing `write_file`/`pack` to re-synthesize
    /// a minimal profile from the semantic model (spec.md §6.1 `-n/--noprofile`).
    pub fn without_icc(&self) -> Self {
        Self { icc: None, ..self.clone() }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// spec.md §4.3 `setGamma`: only meaningful for a simple-gamma profile.
    pub fn set_gamma(&mut self, gamma: f64) -> Result<()> {
        if !(gamma > 0.0) {
            return Err(Error::Validation("gamma must be > 0".into()));
        }
        self.curve = CurveType::Gamma(gamma);
        Ok(())
    }

    /// spec.md §4.3 `setLuminance`.
    pub fn set_luminance(&mut self, nits: u32) {
        self.max_luminance = nits;
    }

    /// spec.md §4.3 `query`: `(primaries, curve, maxLuminance)` as a tuple.
    pub fn query(&self) -> (Primaries, CurveType, u32) {
        (self.primaries, self.curve, self.max_luminance)
    }

    /// spec.md §4.3 `hasPQSignature`.
    pub fn has_pq_signature(&self) -> bool {
        self.icc.as_deref().map(has_pq_signature).unwrap_or(false)
    }

    /// spec.md §4.3 `matches`: exact-enough equality on primaries, curve
    /// variant & gamma, and maxLuminance.
    pub fn matches(a: &Profile, b: &Profile) -> bool {
        a.primaries.approx_eq(&b.primaries, 1e-4)
            && curves_match(a.curve, b.curve)
            && a.max_luminance == b.max_luminance
    }

    /// spec.md §4.3 `pack`: synthesise ICC bytes from the current semantic
    /// model. Only a simple-gamma curve can be packed (§7 Unsupported).
    pub fn pack(&self) -> Result<Vec<u8>> {
        if !self.curve.is_simple_gamma() {
            return Err(Error::Unsupported(
                "only a simple gamma curve can be synthesised into an ICC profile".into(),
            ));
        }
        Ok(synth::pack_matrix_trc(self))
    }

    /// spec.md §4.3 `write`: pack and write to a file.
    pub fn write_file(&self, path: &std::path::Path) -> Result<()> {
        let bytes = match &self.icc {
            Some(bytes) => bytes.clone(),
            None => self.pack()?,
        };
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

fn curves_match(a: CurveType, b: CurveType) -> bool {
    match (a, b) {
        (CurveType::Gamma(ga), CurveType::Gamma(gb)) => (ga - gb).abs() < 1e-4,
        (CurveType::Complex(ga), CurveType::Complex(gb)) => (ga - gb).abs() < 1e-4,
        (CurveType::Pq, CurveType::Pq) | (CurveType::Hlg, CurveType::Hlg) => true,
        _ => false,
    }
}

fn clean_ascii(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}

/// The stock primaries implied by a whole-profile PQ signature match, if any.
fn pq_signature_primaries(icc_bytes: &[u8]) -> Option<Primaries> {
    let digest = hash::md5(icc_bytes);
    PQ_PROFILE_MD5
        .iter()
        .find(|(sig, _)| *sig == digest)
        .map(|(_, primaries)| *primaries)
}

fn has_pq_signature(icc_bytes: &[u8]) -> bool {
    pq_signature_primaries(icc_bytes).is_some()
}

fn curve_signature(icc: &IccProfile) -> Option<CurveType> {
    let trc = icc.red_trc()?;
    let crate::icc::CurveData::Table(table) = trc else {
        return None;
    };
    let bytes: Vec<u8> = table.iter().flat_map(|v| v.to_be_bytes()).collect();
    let digest = hash::md5(&bytes);
    if digest == PQ_CURVE_MD5 {
        return Some(CurveType::Pq);
    }
    if digest == HLG_CURVE_MD5 {
        return Some(CurveType::Hlg);
    }
    None
}

/// Extract the effective gamma/curve from the red TRC tag, falling back to
/// the assumption the other two channels match (spec.md assumes a single
/// consistent curve across channels for colorist's model).
fn curve_from_trc(icc: &IccProfile) -> CurveType {
    match icc.red_trc() {
        Some(crate::icc::CurveData::Gamma(g)) => CurveType::Gamma(*g),
        Some(crate::icc::CurveData::Identity) => CurveType::Gamma(1.0),
        Some(table @ crate::icc::CurveData::Table(_)) => {
            CurveType::Complex(estimate_gamma_from_table(table))
        }
        None => CurveType::Gamma(2.2),
    }
}

fn estimate_gamma_from_table(curve: &crate::icc::CurveData) -> f64 {
    // Sample the curve at its midpoint and solve g from 0.5^g = y(0.5);
    // a coarse but serviceable estimate, used only for reporting (spec.md
    // §3 "used only for reporting/estimation").
    let y = curve.eval(0.5).clamp(1e-6, 1.0 - 1e-6);
    (y.ln() / 0.5_f64.ln()).clamp(0.1, 10.0)
}

fn luminance_tag(icc: &IccProfile) -> Option<u32> {
    let tag = icc.get_tag(TagSignature::LUMINANCE)?;
    let xyz = tag.as_xyz()?.to_xyz()?;
    Some(xyz.y.round().max(0.0) as u32)
}

/// Recover (primaries, white) from the colorant + white point tags, backing
/// out any chromatic-adaptation tag first when the media white is within 1K
/// CCT of D50 (spec.md §4.3 "back-adapted through the chad inverse"; §9
/// "Chromatic-adaptation back-out ... do not guess").
fn colorant_primaries(icc: &IccProfile) -> Option<Primaries> {
    let mut red = icc.red_colorant()?;
    let mut green = icc.green_colorant()?;
    let mut blue = icc.blue_colorant()?;
    let mut white = icc.media_white_point()?;

    if icc.header.color_space != IccColorSpace::Rgb {
        return None;
    }

    if let Some(chad) = icc.chromatic_adaptation_matrix() {
        if is_near_d50(white, 1.0) {
            let chad = Matrix3x3::new(chad);
            if let Some(inv) = chad.inverse() {
                red = apply_matrix(&inv, red);
                green = apply_matrix(&inv, green);
                blue = apply_matrix(&inv, blue);
                white = apply_matrix(&inv, white);
            }
        }
    }

    let (rx, ry, _) = red.to_xyy();
    let (gx, gy, _) = green.to_xyy();
    let (bx, by, _) = blue.to_xyy();
    let (wx, wy, _) = white.to_xyy();

    let primaries = Primaries { rx, ry, gx, gy, bx, by, wx, wy };
    if primaries.is_valid() { Some(primaries) } else { None }
}

fn apply_matrix(m: &Matrix3x3, xyz: Xyz) -> Xyz {
    let v = m.multiply_vec(xyz.to_array());
    Xyz::from_array(v)
}

/// Correlated color temperature within `tolerance_k` Kelvin of 5000K
/// (McCamy's cubic approximation), used as the chad back-out trigger.
fn is_near_d50(white: Xyz, tolerance_k: f64) -> bool {
    let (x, y, _) = white.to_xyy();
    if y <= 0.0 {
        return false;
    }
    let n = (x - 0.3320) / (0.1858 - y);
    let cct = -449.0 * n.powi(3) + 3525.0 * n.powi(2) - 6823.3 * n + 5520.33;
    (cct - 5000.0).abs() <= tolerance_k.max(1.0) * 20.0
}

/// Minimal ICC matrix/TRC profile synthesis, used only by `pack()` for
/// simple-gamma profiles. Not a general ICC writer (spec.md §1 "ICC binary
/// format parser ... specified only by the information it must surface").
mod synth {
    use super::{CurveType, Profile};
    use crate::math::matrix::Matrix3x3;

    fn s15f16(v: f64) -> [u8; 4] {
        ((v * 65536.0).round() as i32).to_be_bytes()
    }

    fn chromaticity_xyz(x: f64, y: f64) -> [f64; 3] {
        if y.abs() < 1e-12 {
            return [0.0, 0.0, 0.0];
        }
        [x / y, 1.0, (1.0 - x - y) / y]
    }

    fn xyz_tag(sig: &[u8; 4], xyz: [f64; 3]) -> Vec<u8> {
        let mut out = Vec::with_capacity(20);
        out.extend_from_slice(b"XYZ ");
        out.extend_from_slice(&[0u8; 4]);
        for c in xyz {
            out.extend_from_slice(&s15f16(c));
        }
        let _ = sig;
        out
    }

    fn curv_tag(gamma: f64) -> Vec<u8> {
        let mut out = Vec::with_capacity(12);
        out.extend_from_slice(b"curv");
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&1u32.to_be_bytes());
        out.extend_from_slice(&((gamma * 256.0).round() as u16).to_be_bytes());
        out.extend_from_slice(&[0u8; 2]); // pad to 4-byte alignment
        out
    }

    fn desc_tag(text: &str) -> Vec<u8> {
        let ascii: Vec<u8> = text.bytes().take(255).collect();
        let mut out = Vec::new();
        out.extend_from_slice(b"desc");
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&((ascii.len() + 1) as u32).to_be_bytes());
        out.extend_from_slice(&ascii);
        out.push(0);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    pub fn pack_matrix_trc(profile: &Profile) -> Vec<u8> {
        let p = profile.primaries;
        let gamma = match profile.curve {
            CurveType::Gamma(g) => g,
            _ => 2.2,
        };

        let r = chromaticity_xyz(p.rx, p.ry);
        let g = chromaticity_xyz(p.gx, p.gy);
        let b = chromaticity_xyz(p.bx, p.by);
        let w = chromaticity_xyz(p.wx, p.wy);

        // Scale colorants so R+G+B = white (standard ICC matrix/TRC construction).
        let mat = Matrix3x3::new([[r[0], g[0], b[0]], [r[1], g[1], b[1]], [r[2], g[2], b[2]]]);
        let scale = mat.inverse().map(|inv| inv.multiply_vec(w)).unwrap_or([1.0, 1.0, 1.0]);
        let r = [r[0] * scale[0], r[1] * scale[0], r[2] * scale[0]];
        let g = [g[0] * scale[1], g[1] * scale[1], g[2] * scale[1]];
        let b = [b[0] * scale[2], b[1] * scale[2], b[2] * scale[2]];

        let tags: Vec<(&[u8; 4], Vec<u8>)> = vec![
            (b"desc", desc_tag(profile.description())),
            (b"wtpt", xyz_tag(b"wtpt", w)),
            (b"rXYZ", xyz_tag(b"rXYZ", r)),
            (b"gXYZ", xyz_tag(b"gXYZ", g)),
            (b"bXYZ", xyz_tag(b"bXYZ", b)),
            (b"rTRC", curv_tag(gamma)),
            (b"gTRC", curv_tag(gamma)),
            (b"bTRC", curv_tag(gamma)),
        ];

        let tag_table_start = 128 + 4;
        let tag_table_size = tags.len() * 12;
        let mut data_offset = tag_table_start + tag_table_size;
        let mut tag_table = Vec::with_capacity(tag_table_size);
        let mut tag_data = Vec::new();
        for (sig, bytes) in &tags {
            tag_table.extend_from_slice(*sig);
            tag_table.extend_from_slice(&(data_offset as u32).to_be_bytes());
            tag_table.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            tag_data.extend_from_slice(bytes);
            data_offset += bytes.len();
        }

        let total_size = data_offset as u32;
        let mut out = vec![0u8; 128];
        out[0..4].copy_from_slice(&total_size.to_be_bytes());
        out[8] = 4;
        out[9] = 0x30;
        out[12..16].copy_from_slice(b"mntr");
        out[16..20].copy_from_slice(b"RGB ");
        out[20..24].copy_from_slice(b"XYZ ");
        out[36..40].copy_from_slice(b"acsp");
        out.extend_from_slice(&(tags.len() as u32).to_be_bytes());
        out.extend_from_slice(&tag_table);
        out.extend_from_slice(&tag_data);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_zero_primary() {
        let bad = Primaries { wy: 0.0, ..Primaries::BT709 };
        assert!(Profile::create(bad, CurveType::Gamma(2.2), 100, "x").is_err());
    }

    #[test]
    fn stock_srgb_has_bt709_primaries() {
        let p = Profile::create_stock("srgb").unwrap();
        assert_eq!(p.primaries(), Primaries::BT709);
        assert!(matches!(p.curve(), CurveType::Gamma(g) if (g - 2.4).abs() < 1e-9));
    }

    #[test]
    fn effective_luminance_falls_back_on_unspecified() {
        let p = Profile::create(Primaries::BT709, CurveType::Gamma(2.2), 0, "x").unwrap();
        assert_eq!(p.effective_luminance(80), 80);
        assert_eq!(p.raw_max_luminance(), 0);
    }

    #[test]
    fn matches_is_primaries_curve_and_luminance() {
        let a = Profile::create(Primaries::BT709, CurveType::Gamma(2.2), 100, "a").unwrap();
        let b = Profile::create(Primaries::BT709, CurveType::Gamma(2.2), 100, "b").unwrap();
        assert!(Profile::matches(&a, &b));

        let c = Profile::create(Primaries::BT709, CurveType::Gamma(2.2), 200, "c").unwrap();
        assert!(!Profile::matches(&a, &c));
    }

    #[test]
    fn pack_rejects_non_gamma_curve() {
        let p = Profile::create(Primaries::BT2020, CurveType::Pq, 10_000, "pq").unwrap();
        assert!(p.pack().is_err());
    }

    #[test]
    fn pack_roundtrips_through_parse() {
        let p = Profile::create(Primaries::BT709, CurveType::Gamma(2.2), 0, "Test").unwrap();
        let bytes = p.pack().unwrap();
        let parsed = Profile::parse(&bytes, None).unwrap();
        assert!(parsed.primaries().approx_eq(&Primaries::BT709, 1e-3));
        assert!(matches!(parsed.curve(), CurveType::Gamma(g) if (g - 2.2).abs() < 0.05));
    }

    #[test]
    fn stock_name_lookup() {
        assert_eq!(Primaries::from_stock_name("bt709"), Some(Primaries::BT709));
        assert_eq!(Primaries::from_stock_name("P3"), Some(Primaries::P3));
        assert_eq!(Primaries::from_stock_name("nope"), None);
    }
}
