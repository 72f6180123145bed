//! Process-wide context (A2 / spec.md §9 design note).
//!
//! `original_source/lib/src/context.c` builds one `clContext` per invocation
//! holding the format registration table, the CMM handle, and the default
//! luminance; it is constructed at startup and torn down at exit. This crate
//! has no CMM handle to own (no LCMS backend — see DESIGN.md), so [`Context`]
//! carries exactly the rest: the format registry (C8), the default
//! luminance fallback (`COLORIST_DEFAULT_LUMINANCE` / `--deflum`), and the
//! requested worker-job count (C9). Diagnostics go through the `log` facade
//! rather than function-pointer fields, since that's the idiomatic Rust
//! logging seam (set up by `env_logger` in the CLI).

use crate::registry::FormatRegistry;
use crate::task::TaskPool;

/// `COLORIST_DEFAULT_LUMINANCE` in the original implementation: the nits
/// assumed for a profile whose `maxLuminance` is unspecified (0).
pub const DEFAULT_LUMINANCE: u32 = 100;

/// Shared state threaded through planner calls.
pub struct Context {
    registry: FormatRegistry,
    default_luminance: u32,
    jobs: usize,
}

impl Context {
    /// Build a context with the reference `ppm` plugin registered
    /// (spec.md §4.10's "one reference plugin" realization).
    pub fn new() -> Self {
        let mut registry = FormatRegistry::new();
        registry.register(Box::new(crate::plugins::ppm::PpmPlugin));
        Self {
            registry,
            default_luminance: DEFAULT_LUMINANCE,
            jobs: 0,
        }
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FormatRegistry {
        &mut self.registry
    }

    pub fn default_luminance(&self) -> u32 {
        self.default_luminance
    }

    /// `--deflum N` (spec.md §6.1).
    pub fn set_default_luminance(&mut self, nits: u32) {
        self.default_luminance = nits;
    }

    /// Requested worker count; `0` means "use all logical CPUs"
    /// (spec.md §6.1 `-j/--jobs`).
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn set_jobs(&mut self, jobs: usize) {
        self.jobs = jobs;
    }

    /// Effective worker count, clamped to the machine's logical CPU count.
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            TaskPool::limit()
        } else {
            self.jobs.clamp(1, TaskPool::limit())
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_ppm_registered() {
        let ctx = Context::new();
        assert!(ctx.registry().by_name("ppm").is_some());
    }

    #[test]
    fn default_luminance_starts_at_standard_value() {
        let ctx = Context::new();
        assert_eq!(ctx.default_luminance(), DEFAULT_LUMINANCE);
    }

    #[test]
    fn jobs_zero_means_all_cpus() {
        let ctx = Context::new();
        assert_eq!(ctx.effective_jobs(), TaskPool::limit());
    }

    #[test]
    fn jobs_clamped_to_cpu_count() {
        let mut ctx = Context::new();
        ctx.set_jobs(usize::MAX);
        assert_eq!(ctx.effective_jobs(), TaskPool::limit());
    }
}
