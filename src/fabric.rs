use std::fmt;

use ndarray::Array2;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::ClusterError;

/// Scheduling of the per-cell work of each matrix pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    /// Dedicated worker pool with this many threads
    Threads(usize),
    /// Every cell evaluated on the calling thread, in row-major order
    Serial,
}

impl Default for Parallelism {
    fn default() -> Self {
        Parallelism::Threads(4)
    }
}

/// Fans a pass out over its independent cells and joins before returning.
pub(crate) enum Fabric {
    Pool(ThreadPool),
    Serial,
}

impl fmt::Debug for Fabric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fabric::Pool(pool) => write!(f, "Pool({})", pool.current_num_threads()),
            Fabric::Serial => write!(f, "Serial"),
        }
    }
}

impl Fabric {
    pub(crate) fn new(parallelism: Parallelism) -> Result<Self, ClusterError> {
        match parallelism {
            Parallelism::Threads(0) => Err(ClusterError::invalid_argument(
                "thread count must be at least 1",
            )),
            Parallelism::Threads(threads) => Ok(Fabric::Pool(
                ThreadPoolBuilder::new().num_threads(threads).build()?,
            )),
            Parallelism::Serial => Ok(Fabric::Serial),
        }
    }

    /// Evaluate `f` for every index in `0..len`, results in index order
    pub(crate) fn map<R, C>(&self, len: usize, f: C) -> Vec<R>
    where
        R: Send,
        C: Fn(usize) -> R + Sync + Send,
    {
        match self {
            Fabric::Pool(pool) => pool.install(|| (0..len).into_par_iter().map(&f).collect()),
            Fabric::Serial => (0..len).map(f).collect(),
        }
    }

    /// Build a fresh `n x n` matrix whose cell `[row, col]` is `cell(row, col)`.
    ///
    /// Returns only once every cell has resolved; the first failing cell fails
    /// the whole pass and nothing is returned.
    pub(crate) fn matrix<F, C>(&self, n: usize, cell: C) -> Result<Array2<F>, ClusterError>
    where
        F: Send,
        C: Fn(usize, usize) -> Result<F, ClusterError> + Sync + Send,
    {
        let cells: Result<Vec<F>, ClusterError> = match self {
            Fabric::Pool(pool) => pool.install(|| {
                (0..n * n)
                    .into_par_iter()
                    .map(|idx| cell(idx / n, idx % n))
                    .collect()
            }),
            Fabric::Serial => (0..n * n).map(|idx| cell(idx / n, idx % n)).collect(),
        };
        Ok(Array2::from_shape_vec((n, n), cells?)?)
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn zero_threads_rejected() {
        assert!(matches!(
            Fabric::new(Parallelism::Threads(0)),
            Err(ClusterError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn every_cell_once_in_place() {
        for parallelism in [Parallelism::Threads(3), Parallelism::Serial] {
            let fabric = Fabric::new(parallelism).unwrap();
            let calls = AtomicUsize::new(0);
            let m = fabric
                .matrix(7, |r, c| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok((r * 10 + c) as f64)
                })
                .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 49);
            assert_eq!(m.dim(), (7, 7));
            assert_eq!(m[[3, 5]], 35.);
            assert_eq!(m[[6, 0]], 60.);
        }
    }

    #[test]
    fn failing_cell_fails_pass() {
        let fabric = Fabric::new(Parallelism::Threads(2)).unwrap();
        let result = fabric.matrix(4, |r, c| {
            if r == 2 && c == 1 {
                Err(ClusterError::NonNumeric {
                    item: c,
                    exemplar: r,
                })
            } else {
                Ok(0_f32)
            }
        });
        assert!(matches!(
            result,
            Err(ClusterError::NonNumeric {
                item: 1,
                exemplar: 2
            })
        ));
    }

    #[test]
    fn empty_pass() {
        let fabric = Fabric::new(Parallelism::Serial).unwrap();
        let m = fabric.matrix::<f64, _>(0, |_, _| Ok(1.)).unwrap();
        assert_eq!(m.dim(), (0, 0));
        assert!(fabric.map(0, |i| i).is_empty());
    }

    #[test]
    fn map_keeps_order() {
        let fabric = Fabric::new(Parallelism::Threads(4)).unwrap();
        let squares = fabric.map(100, |i| i * i);
        assert_eq!(squares.len(), 100);
        assert!(squares.iter().enumerate().all(|(i, s)| *s == i * i));
    }
}
