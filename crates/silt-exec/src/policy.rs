//! The [`ExecutionPolicy`] strategy object.

use crate::backend::Backend;
use crate::error::ExecError;
use crate::{scan, sort};
use std::ops::Range;

/// Stateless execution configuration: a backend tag plus a degree of
/// parallelism.
///
/// Policies are passed per call, never stored inside data structures,
/// and are cheap to copy. Two calls on the same policy are independent;
/// any state shared between the bodies of one call must be mutated
/// through atomics only, because iteration order between indices is
/// unspecified on every backend except [`Backend::Sequential`].
///
/// Phases that depend on completed prior work need an explicit
/// [`sync`](Self::sync) between the two calls — the CPU backends happen
/// to complete before returning, but the contract is the fence, not the
/// return.
#[derive(Clone, Copy, Debug)]
pub struct ExecutionPolicy {
    backend: Backend,
    workers: usize,
}

impl ExecutionPolicy {
    /// Single-threaded reference policy.
    pub fn sequential() -> Self {
        Self {
            backend: Backend::Sequential,
            workers: 1,
        }
    }

    /// Multi-threaded policy using all available hardware parallelism.
    pub fn multi_threaded() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            backend: Backend::MultiThreaded,
            workers,
        }
    }

    /// GPU grid policy.
    ///
    /// Fails with [`ExecError::BackendUnavailable`] until a device
    /// backend is compiled in; the closed-set variant exists so callers
    /// can already dispatch over it.
    pub fn gpu_grid() -> Result<Self, ExecError> {
        Err(ExecError::BackendUnavailable {
            backend: Backend::GpuGrid,
        })
    }

    /// Override the degree of parallelism (clamped to at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// The backend tag.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// The configured degree of parallelism.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Effective worker count for a workload of `len` items.
    pub(crate) fn workers_for(&self, len: usize) -> usize {
        match self.backend {
            Backend::Sequential => 1,
            _ => self.workers.min(len).max(1),
        }
    }

    /// Execute `body` once per index in `range`.
    ///
    /// No ordering guarantee between indices and no guarantee that two
    /// indices run on the same thread. The body therefore gets `&self`
    /// access only to shared state; cross-index mutation must go
    /// through atomics.
    pub fn for_each<F>(&self, range: Range<usize>, body: F)
    where
        F: Fn(usize) + Sync,
    {
        let len = range.end.saturating_sub(range.start);
        if len == 0 {
            return;
        }
        let workers = self.workers_for(len);
        if workers == 1 {
            for i in range {
                body(i);
            }
            return;
        }
        let chunk = len.div_ceil(workers);
        let body = &body;
        std::thread::scope(|scope| {
            for w in 0..workers {
                let start = range.start + w * chunk;
                let end = (start + chunk).min(range.end);
                if start >= end {
                    break;
                }
                scope.spawn(move || {
                    for i in start..end {
                        body(i);
                    }
                });
            }
        });
    }

    /// Inclusive prefix combine of `input` into `output` under `op`.
    ///
    /// `op` must be associative with identity `identity`. Runs as a
    /// genuine two-phase parallel scan on the multi-threaded backend:
    /// per-worker local scan, cross-worker prefix propagation, then a
    /// local correction pass.
    ///
    /// # Panics
    ///
    /// Panics if `input` and `output` differ in length.
    pub fn inclusive_scan<T, F>(&self, input: &[T], output: &mut [T], identity: T, op: F)
    where
        T: Copy + Send + Sync,
        F: Fn(T, T) -> T + Sync,
    {
        scan::scan(self, input, output, identity, op, scan::Kind::Inclusive);
    }

    /// Exclusive prefix combine of `input` into `output` under `op`.
    ///
    /// `output[i]` is the combine of `input[..i]`, with `output[0] ==
    /// identity`. Same contract and parallel structure as
    /// [`inclusive_scan`](Self::inclusive_scan).
    ///
    /// # Panics
    ///
    /// Panics if `input` and `output` differ in length.
    pub fn exclusive_scan<T, F>(&self, input: &[T], output: &mut [T], identity: T, op: F)
    where
        T: Copy + Send + Sync,
        F: Fn(T, T) -> T + Sync,
    {
        scan::scan(self, input, output, identity, op, scan::Kind::Exclusive);
    }

    /// Combine all of `input` under `op`.
    ///
    /// `op` must be associative and commutative with identity
    /// `identity`; workers fold disjoint chunks and the partials are
    /// folded in worker order.
    pub fn reduce<T, F>(&self, input: &[T], identity: T, op: F) -> T
    where
        T: Copy + Send + Sync,
        F: Fn(T, T) -> T + Sync,
    {
        scan::reduce(self, input, identity, op)
    }

    /// Stable LSD radix sort of `(key, value)` pairs over the key bits
    /// `[start_bit, end_bit)`.
    ///
    /// Pairs with equal keys keep their relative order. Bits outside
    /// the range do not influence the result, which is what lets a
    /// caller partition on a sub-field of a packed key.
    ///
    /// # Panics
    ///
    /// Panics if the slices differ in length, `start_bit >= end_bit`,
    /// or `end_bit > 64`.
    pub fn radix_sort_pairs(
        &self,
        keys: &mut [u64],
        values: &mut [u32],
        start_bit: u32,
        end_bit: u32,
    ) {
        sort::radix_sort_pairs(self, keys, values, start_bit, end_bit);
    }

    /// Block until all work submitted through this policy is complete.
    ///
    /// The CPU backends complete work before each call returns, so this
    /// is a no-op fence; it exists because the contract of every
    /// primitive is "complete after `sync`", not "complete on return",
    /// and asynchronous backends rely on callers honouring that.
    pub fn sync(&self) {}
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self::sequential()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn gpu_grid_is_rejected_at_construction() {
        let err = ExecutionPolicy::gpu_grid().unwrap_err();
        assert_eq!(
            err,
            ExecError::BackendUnavailable {
                backend: Backend::GpuGrid
            }
        );
    }

    #[test]
    fn for_each_visits_every_index_exactly_once() {
        for policy in [
            ExecutionPolicy::sequential(),
            ExecutionPolicy::multi_threaded().with_workers(4),
        ] {
            let n = 10_000;
            let hits: Vec<AtomicUsize> = (0..n).map(|_| AtomicUsize::new(0)).collect();
            policy.for_each(0..n, |i| {
                hits[i].fetch_add(1, Ordering::Relaxed);
            });
            policy.sync();
            assert!(
                hits.iter().all(|h| h.load(Ordering::Relaxed) == 1),
                "{:?} missed or repeated an index",
                policy.backend()
            );
        }
    }

    #[test]
    fn for_each_handles_empty_and_offset_ranges() {
        let policy = ExecutionPolicy::multi_threaded().with_workers(3);
        let count = AtomicUsize::new(0);
        policy.for_each(5..5, |_| {
            count.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(count.load(Ordering::Relaxed), 0);
        policy.for_each(7..19, |_| {
            count.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(count.load(Ordering::Relaxed), 12);
    }

    #[test]
    fn workers_clamp_to_at_least_one() {
        let policy = ExecutionPolicy::multi_threaded().with_workers(0);
        assert_eq!(policy.workers(), 1);
    }
}
