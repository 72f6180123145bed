//! Task pool (C9): fan out a per-pixel-range closure across worker threads
//! and join before returning.
//!
//! `original_source/lib/src/task.c` spawns one OS thread per task via
//! `pthread_create`/`CreateThread`; `clTaskLimit()` reads the logical CPU
//! count. `rayon` is the idiomatic substitute used throughout this
//! workspace: a scoped thread pool sized to the requested job count plays
//! the same "spawn N, join N" role as `clTaskCreate`/`clTaskJoin`, without
//! hand-rolled thread management.

use crate::error::{Error, Result};

/// A sized worker pool used to run a transform (or any other embarrassingly
/// parallel pixel-range operation) across disjoint spans.
pub struct TaskPool {
    pool: rayon::ThreadPool,
    jobs: usize,
}

impl TaskPool {
    /// The machine's logical CPU count (spec.md §4.9 `taskLimit`).
    pub fn limit() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Build a pool with `jobs` worker threads. `0` means "use all logical
    /// CPUs" (spec.md §6.1 `-j/--jobs`); the requested count is clamped to
    /// `[1, limit()]`.
    pub fn new(jobs: usize) -> Result<Self> {
        let limit = Self::limit();
        let jobs = if jobs == 0 { limit } else { jobs.clamp(1, limit) };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| Error::External(e.to_string()))?;
        Ok(Self { pool, jobs })
    }

    /// Worker count this pool was built with.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Split `total` items into contiguous ranges (last range absorbs the
    /// remainder) and run `f` over each range on this pool, joining before
    /// returning (spec.md §4.4 "Concurrency", §4.9 `join`).
    ///
    /// `f` receives `(start, end)` (end exclusive); ranges are disjoint and
    /// cover `0..total` exactly once.
    pub fn run_tiled<F>(&self, total: usize, f: F)
    where
        F: Fn(usize, usize) + Sync,
    {
        if total == 0 {
            return;
        }
        let task_count = self.jobs.clamp(1, total);
        let chunk = total / task_count;
        let remainder = total % task_count;

        let mut ranges = Vec::with_capacity(task_count);
        let mut start = 0usize;
        for i in 0..task_count {
            let extra = if i == task_count - 1 { remainder } else { 0 };
            let end = start + chunk + extra;
            ranges.push((start, end));
            start = end;
        }

        self.pool.install(|| {
            use rayon::prelude::*;
            ranges.into_par_iter().for_each(|(s, e)| f(s, e));
        });
    }

    /// Fan `f` out over matched, disjoint chunks of `src`/`dst`, each
    /// covering the same whole number of `channels`-wide items (spec.md
    /// §4.4 "Concurrency": disjoint reads and writes, joined before
    /// returning). The final chunk on each side may be shorter when
    /// `dst.len() / channels` doesn't divide evenly by the job count.
    pub fn run_pixels<F>(&self, src: &[f32], dst: &mut [f32], channels: usize, f: F)
    where
        F: Fn(&[f32], &mut [f32]) + Sync,
    {
        let total_items = dst.len() / channels;
        if total_items == 0 {
            return;
        }
        let task_count = self.jobs.clamp(1, total_items);
        let chunk_items = total_items.div_ceil(task_count);
        let chunk_elems = chunk_items * channels;

        self.pool.install(|| {
            use rayon::prelude::*;
            dst.par_chunks_mut(chunk_elems)
                .zip(src.par_chunks(chunk_elems))
                .for_each(|(d, s)| f(s, d));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn limit_is_at_least_one() {
        assert!(TaskPool::limit() >= 1);
    }

    #[test]
    fn zero_jobs_means_all_cpus() {
        let pool = TaskPool::new(0).unwrap();
        assert_eq!(pool.jobs(), TaskPool::limit());
    }

    #[test]
    fn jobs_clamped_to_cpu_count() {
        let pool = TaskPool::new(usize::MAX).unwrap();
        assert_eq!(pool.jobs(), TaskPool::limit());
    }

    #[test]
    fn run_tiled_covers_every_index_exactly_once() {
        let pool = TaskPool::new(4).unwrap();
        let total = 97usize;
        let seen: Vec<AtomicUsize> = (0..total).map(|_| AtomicUsize::new(0)).collect();
        pool.run_tiled(total, |start, end| {
            for i in start..end {
                seen[i].fetch_add(1, Ordering::SeqCst);
            }
        });
        assert!(seen.iter().all(|c| c.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn run_tiled_noop_on_zero_total() {
        let pool = TaskPool::new(2).unwrap();
        pool.run_tiled(0, |_, _| panic!("should not be called"));
    }
}
