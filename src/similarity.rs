use std::marker::PhantomData;

use ndarray::{Array1, Zip};
use num_traits::Float;

use crate::error::BoxError;

/// Pairwise similarity between two items of a collection.
///
/// Called as `similarity(item, exemplar)` once for every ordered pair, including
/// each item paired with itself. Calls may arrive concurrently from several
/// worker threads.
pub trait Similarity<T, F>: Sync
where
    F: Float + Send + Sync,
{
    /// How well `exemplar` represents `item`; larger is more similar
    fn similarity(&self, item: &T, exemplar: &T) -> Result<F, BoxError>;
}

/// Wraps an infallible closure as a [`Similarity`]
///
///     use exemplar::{from_fn, Similarity};
///
///     let s = from_fn(|a: &f64, b: &f64| -(a - b).abs());
///     assert_eq!(s.similarity(&1., &4.).unwrap(), -3.);
pub fn from_fn<C>(f: C) -> FromFn<C> {
    FromFn(f)
}

/// Wraps a fallible closure as a [`Similarity`]
pub fn try_from_fn<C, E>(f: C) -> TryFromFn<C, E> {
    TryFromFn(f, PhantomData)
}

#[derive(Debug, Clone)]
pub struct FromFn<C>(C);

impl<T, F, C> Similarity<T, F> for FromFn<C>
where
    F: Float + Send + Sync,
    C: Fn(&T, &T) -> F + Sync,
{
    fn similarity(&self, item: &T, exemplar: &T) -> Result<F, BoxError> {
        Ok((self.0)(item, exemplar))
    }
}

#[derive(Debug, Clone)]
pub struct TryFromFn<C, E>(C, PhantomData<fn() -> E>);

impl<T, F, E, C> Similarity<T, F> for TryFromFn<C, E>
where
    F: Float + Send + Sync,
    E: Into<BoxError>,
    C: Fn(&T, &T) -> Result<F, E> + Sync,
{
    fn similarity(&self, item: &T, exemplar: &T) -> Result<F, BoxError> {
        (self.0)(item, exemplar).map_err(Into::into)
    }
}

/// Perform similarity calculation as `-1 * sum((row_i - row_j)**2)`
///
///     use ndarray::arr1;
///     use exemplar::{NegEuclidean, Similarity};
///
///     let s = NegEuclidean::default()
///         .similarity(&arr1(&[1., 1., 1.]), &arr1(&[3., 3., 3.]))
///         .unwrap();
///     assert!((s - -12.0_f64).abs() < 1e-8);
#[derive(Debug, Default, Clone)]
pub struct NegEuclidean;

impl<F> Similarity<Array1<F>, F> for NegEuclidean
where
    F: Float + Send + Sync,
{
    fn similarity(&self, item: &Array1<F>, exemplar: &Array1<F>) -> Result<F, BoxError> {
        if item.len() != exemplar.len() {
            return Err(format!(
                "rows differ in length ({} vs {})",
                item.len(),
                exemplar.len()
            )
            .into());
        }
        let mut row_diff = item - exemplar;
        row_diff.map_inplace(|a| *a = (*a).powi(2));
        Ok(-row_diff.sum())
    }
}

/// Perform similarity calculation as `-1 * (row_i . row_j)/(|row_i|*|row_j|)`
///
///     use ndarray::arr1;
///     use exemplar::{NegCosine, Similarity};
///
///     let s = NegCosine::default()
///         .similarity(&arr1(&[3., 2., 0., 5.]), &arr1(&[1., 0., 0., 0.]))
///         .unwrap();
///     assert!((s - -0.4866_f64).abs() < 1e-4);
#[derive(Debug, Default, Clone)]
pub struct NegCosine;

impl<F> Similarity<Array1<F>, F> for NegCosine
where
    F: Float + Send + Sync,
{
    fn similarity(&self, item: &Array1<F>, exemplar: &Array1<F>) -> Result<F, BoxError> {
        if item.len() != exemplar.len() {
            return Err(format!(
                "rows differ in length ({} vs {})",
                item.len(),
                exemplar.len()
            )
            .into());
        }
        let dot_product: F = Zip::from(item)
            .and(exemplar)
            .map_collect(|r1, r2| *r1 * *r2)
            .sum();
        let x_magnitude = item.map(|r| r.powi(2)).sum().sqrt();
        let y_magnitude = exemplar.map(|r| r.powi(2)).sum().sqrt();
        Ok(-dot_product / x_magnitude / y_magnitude)
    }
}

/// Negative absolute difference of two scalars, `-|a - b|`
#[derive(Debug, Default, Clone)]
pub struct NegAbsolute;

impl<F> Similarity<F, F> for NegAbsolute
where
    F: Float + Send + Sync,
{
    fn similarity(&self, item: &F, exemplar: &F) -> Result<F, BoxError> {
        Ok(-(*item - *exemplar).abs())
    }
}
