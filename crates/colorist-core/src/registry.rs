//! Codec plugin interface (C8)
//!
//! The core never links a concrete image codec. A plugin registers a
//! [`FormatPlugin`] describing the narrow contract the planner needs: read,
//! write, optional header sniff, and the depth policy the format can carry.
//! This mirrors `context_formats.c`'s registration table in the original
//! implementation, minus the dependent codec libraries themselves (out of
//! scope per the specification).

use crate::error::{Error, Result};
use crate::image::Image;

/// Which bit depths a format can carry for its pixel samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthPolicy {
    /// Exactly one depth, e.g. PPM-style containers that are always 8-bit.
    Fixed(u8),
    /// A small enumerated set, e.g. "8 or 16".
    OneOf(&'static [u8]),
    /// An inclusive range, e.g. "8..16".
    Range(u8, u8),
}

impl DepthPolicy {
    /// Whether `depth` is carried natively by this format.
    pub fn allows(&self, depth: u8) -> bool {
        match self {
            DepthPolicy::Fixed(d) => *d == depth,
            DepthPolicy::OneOf(depths) => depths.contains(&depth),
            DepthPolicy::Range(lo, hi) => depth >= *lo && depth <= *hi,
        }
    }

    /// The best depth this format can carry that is `<= requested`, used by
    /// the planner's `formatBestDepth` step (spec.md §4.7 step 12). Picks the
    /// largest allowed depth not exceeding `requested`, falling back to the
    /// smallest allowed depth if none qualifies.
    pub fn best_depth(&self, requested: u8) -> u8 {
        match self {
            DepthPolicy::Fixed(d) => *d,
            DepthPolicy::OneOf(depths) => {
                let mut best = depths[0];
                for &d in *depths {
                    if d <= requested && d > best {
                        best = d;
                    }
                }
                if best > requested { depths[0] } else { best }
            }
            DepthPolicy::Range(lo, hi) => requested.clamp(*lo, *hi),
        }
    }
}

/// Parameters a plugin's write function receives beyond the image itself.
#[derive(Debug, Clone, Default)]
pub struct WriteParams {
    /// Lossy quality, 0..=100 where applicable; `None` means "format default".
    pub quality: Option<u8>,
    /// Encoder rate control target, format-specific meaning (e.g. JP2 bpp*100).
    pub rate: Option<u32>,
}

/// The uniform read/write/detect contract every codec plugin satisfies.
pub trait FormatPlugin: Send + Sync {
    /// Unique lower-case registry name, e.g. `"png"`.
    fn name(&self) -> &'static str;

    /// Human-readable description shown by `--help`/`identify`.
    fn description(&self) -> &'static str;

    /// IANA MIME type, e.g. `"image/png"`.
    fn mime_type(&self) -> &'static str;

    /// File extensions this plugin claims, without the leading dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Depths this format can carry.
    fn depth_policy(&self) -> DepthPolicy;

    /// Decode `raw` (already read into memory) into an [`Image`].
    fn read(&self, raw: &[u8]) -> Result<Image>;

    /// Encode `image` and append the bytes to `out`.
    fn write(&self, image: &Image, params: &WriteParams, out: &mut Vec<u8>) -> Result<()>;

    /// Sniff up to the first KiB of a file to see if it matches this format.
    /// Plugins without a reliable magic number may return `false` always.
    fn detect(&self, header: &[u8]) -> bool {
        let _ = header;
        false
    }
}

/// Ordered collection of registered plugins, built once at startup.
#[derive(Default)]
pub struct FormatRegistry {
    plugins: Vec<Box<dyn FormatPlugin>>,
}

impl FormatRegistry {
    /// An empty registry with no plugins installed.
    pub fn new() -> Self {
        Self { plugins: Vec::new() }
    }

    /// Register a plugin. Panics on duplicate names, which is a programmer
    /// error (registration happens once at startup, not from user input).
    pub fn register(&mut self, plugin: Box<dyn FormatPlugin>) {
        assert!(
            self.by_name(plugin.name()).is_none(),
            "duplicate format plugin name: {}",
            plugin.name()
        );
        self.plugins.push(plugin);
    }

    /// Look up a plugin by its registered name.
    pub fn by_name(&self, name: &str) -> Option<&dyn FormatPlugin> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    /// Extension-first format detection: the extension of `path` (lowercased,
    /// without the dot) is matched against every plugin's extension list.
    pub fn detect_by_extension(&self, path: &str) -> Option<&dyn FormatPlugin> {
        let ext = path.rsplit('.').next()?.to_ascii_lowercase();
        self.plugins
            .iter()
            .find(|p| p.extensions().contains(&ext.as_str()))
            .map(|p| p.as_ref())
    }

    /// Header-sniff detection over up to 1 KiB of the file's leading bytes.
    pub fn detect_by_header(&self, header: &[u8]) -> Option<&dyn FormatPlugin> {
        let header = &header[..header.len().min(1024)];
        self.plugins
            .iter()
            .find(|p| p.detect(header))
            .map(|p| p.as_ref())
    }

    /// Resolve a format name for `path`: explicit `forced_name` first, then
    /// extension, then header sniff; error if nothing matches (spec.md §4.8).
    pub fn resolve(
        &self,
        path: &str,
        forced_name: Option<&str>,
        header: Option<&[u8]>,
    ) -> Result<&dyn FormatPlugin> {
        if let Some(name) = forced_name {
            return self
                .by_name(name)
                .ok_or_else(|| Error::UnknownFormat(name.to_string()));
        }
        if let Some(plugin) = self.detect_by_extension(path) {
            return Ok(plugin);
        }
        if let Some(header) = header {
            if let Some(plugin) = self.detect_by_header(header) {
                return Ok(plugin);
            }
        }
        Err(Error::UnknownFormat(path.to_string()))
    }

    /// Iterate all registered plugins, e.g. to print `--help`'s format list.
    pub fn iter(&self) -> impl Iterator<Item = &dyn FormatPlugin> {
        self.plugins.iter().map(|p| p.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::ppm::PpmPlugin;

    #[test]
    fn depth_policy_allows() {
        assert!(DepthPolicy::Fixed(8).allows(8));
        assert!(!DepthPolicy::Fixed(8).allows(16));
        assert!(DepthPolicy::OneOf(&[8, 16]).allows(16));
        assert!(DepthPolicy::Range(8, 16).allows(12));
        assert!(!DepthPolicy::Range(8, 16).allows(32));
    }

    #[test]
    fn best_depth_clamps_down() {
        assert_eq!(DepthPolicy::Range(8, 12).best_depth(16), 12);
        assert_eq!(DepthPolicy::OneOf(&[8, 16]).best_depth(10), 8);
    }

    #[test]
    fn extension_then_sniff_then_error() {
        let mut registry = FormatRegistry::new();
        registry.register(Box::new(PpmPlugin));

        assert_eq!(
            registry.resolve("out.ppm", None, None).unwrap().name(),
            "ppm"
        );
        assert!(registry.resolve("out.unknown", None, None).is_err());
        assert!(registry.by_name("png").is_none());
    }
}
