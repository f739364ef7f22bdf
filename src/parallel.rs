use rayon::iter::{MaxLen, MinLen};
use rayon::prelude::*;

/// Strategy for cutting a particle index range into contiguous chunks for worker threads.
///
/// Estimators pipe every parallel loop through their partitioner, which keeps the
/// chunking policy independent of the loop bodies.
pub trait Partitioner: Copy {
    type Blocked<I: IndexedParallelIterator>: IndexedParallelIterator<Item = I::Item>;

    /// Wraps an index-space iterator so that it splits according to this policy.
    fn blockify<I: IndexedParallelIterator>(&self, items: I) -> Self::Blocked<I>;
}

/// Leaves chunking to rayon's adaptive splitting, which subdivides further while idle
/// workers keep stealing. Suits uneven per-particle workloads like neighbor sums.
#[derive(Debug, Default, Copy, Clone)]
pub struct AutoPartitioner;

impl Partitioner for AutoPartitioner {
    type Blocked<I: IndexedParallelIterator> = I;

    #[inline]
    fn blockify<I: IndexedParallelIterator>(&self, items: I) -> I {
        items
    }
}

/// Cuts the index range into at most one evenly sized chunk per worker thread.
/// Chunk boundaries are predictable and there is no adaptive splitting.
#[derive(Debug, Default, Copy, Clone)]
pub struct StaticPartitioner;

impl Partitioner for StaticPartitioner {
    type Blocked<I: IndexedParallelIterator> = MaxLen<MinLen<I>>;

    #[inline]
    fn blockify<I: IndexedParallelIterator>(&self, items: I) -> Self::Blocked<I> {
        let grain_size = div_up(items.len(), rayon::current_num_threads()).max(1);
        items.with_min_len(grain_size).with_max_len(grain_size)
    }
}

fn div_up(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}
