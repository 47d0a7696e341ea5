use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use ndarray::{Array2, ArrayView1};
use num_traits::Float;
use tracing::trace;

use crate::fabric::Fabric;
use crate::{ClusterError, Preference, Similarity};

/// Exemplar index mapped to the indices of its members, in index order.
pub type ExemplarMap = BTreeMap<usize, Vec<usize>>;

/// Blends a freshly computed value with the one it supersedes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Damping<F> {
    lambda: F,
}

impl<F> Damping<F>
where
    F: Float,
{
    pub(crate) fn new(lambda: F) -> Result<Self, ClusterError> {
        if lambda.is_nan() || lambda < F::zero() || lambda >= F::one() {
            return Err(ClusterError::invalid_argument(format!(
                "damping must be in [0, 1), got {}",
                lambda.to_f64().unwrap_or(f64::NAN)
            )));
        }
        Ok(Self { lambda })
    }

    pub(crate) fn dampen(&self, new_value: F, previous: F) -> F {
        (F::one() - self.lambda) * new_value + self.lambda * previous
    }
}

/// Similarity, responsibility and availability state of one session
#[derive(Debug)]
pub(crate) struct Calculation<F> {
    pub(crate) similarity: Array2<F>,
    pub(crate) responsibility: Array2<F>,
    pub(crate) availability: Array2<F>,
    damping: Damping<F>,
}

impl<F> Calculation<F>
where
    F: Float + Send + Sync,
{
    pub(crate) fn new(damping: Damping<F>, similarity: Array2<F>) -> Self {
        let s_dim = similarity.dim();
        Self {
            similarity,
            responsibility: Array2::zeros(s_dim),
            availability: Array2::zeros(s_dim),
            damping,
        }
    }

    pub(crate) fn reset(&mut self) {
        let s_dim = self.similarity.dim();
        self.responsibility = Array2::zeros(s_dim);
        self.availability = Array2::zeros(s_dim);
    }

    /// Availability from the previous responsibility first, then responsibility from the
    /// new availability. Both are published together once both passes have completed.
    pub(crate) fn update(&mut self, fabric: &Fabric) -> Result<(), ClusterError> {
        let start = Instant::now();
        let availability =
            availability_matrix(&self.responsibility, &self.availability, self.damping, fabric)?;
        let responsibility = responsibility_matrix(
            &self.similarity,
            &availability,
            &self.responsibility,
            self.damping,
            fabric,
        )?;
        self.availability = availability;
        self.responsibility = responsibility;
        trace!(elapsed = ?start.elapsed(), "matrix passes complete");
        Ok(())
    }

    pub(crate) fn generate_exemplar_map(&self, fabric: &Fabric) -> ExemplarMap {
        exemplar_map(&self.availability, &self.responsibility, fabric)
    }
}

/// Evaluate `s` for every ordered pair, storing `s(item_i, item_k)` at `[k, i]`, then set
/// the diagonal from `preference`.
pub(crate) fn similarity_matrix<T, F, S>(
    items: &[T],
    s: &S,
    preference: &Preference<F>,
    fabric: &Fabric,
) -> Result<Array2<F>, ClusterError>
where
    T: Sync,
    F: Float + Send + Sync,
    S: Similarity<T, F> + ?Sized,
{
    let mut similarity = fabric.matrix(items.len(), |k, i| {
        let value = s
            .similarity(&items[i], &items[k])
            .map_err(|source| ClusterError::Similarity {
                item: i,
                exemplar: k,
                source,
            })?;
        if value.is_nan() {
            return Err(ClusterError::NonNumeric {
                item: i,
                exemplar: k,
            });
        }
        Ok(value)
    })?;
    match preference {
        Preference::Median => {
            // Diagonal values take part in the median before being overwritten
            if let Some(pref) = median(similarity.iter().copied()) {
                similarity.diag_mut().map_inplace(|v| *v = pref);
            }
        }
        Preference::Value(pref) => similarity.diag_mut().map_inplace(|v| *v = *pref),
        Preference::List(prefs) => similarity
            .diag_mut()
            .iter_mut()
            .zip(prefs)
            .for_each(|(v, p)| *v = *p),
    }
    Ok(similarity)
}

/// Middle value of the sorted input, or the mean of the two middle values for even counts
pub(crate) fn median<F, I>(values: I) -> Option<F>
where
    F: Float,
    I: IntoIterator<Item = F>,
{
    let mut sorted: Vec<F> = values.into_iter().collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / (F::one() + F::one()))
    } else {
        Some(sorted[mid])
    }
}

/// `R[k, i] = dampen(S[k, i] - max_{k' != k}(A[k', i] + S[k', i]), R_old[k, i])`
pub(crate) fn responsibility_matrix<F>(
    similarity: &Array2<F>,
    availability: &Array2<F>,
    responsibility: &Array2<F>,
    damping: Damping<F>,
    fabric: &Fabric,
) -> Result<Array2<F>, ClusterError>
where
    F: Float + Send + Sync,
{
    let n = similarity.nrows();
    let combined = availability + similarity;
    // Best and runner-up competitor of each column
    let competitors: Vec<(usize, F, Option<F>)> =
        fabric.map(n, |i| max_and_runner_up(combined.column(i)));
    fabric.matrix(n, |k, i| {
        let (max_pos, max, runner_up) = competitors[i];
        let competitor = if k == max_pos { runner_up } else { Some(max) };
        let r_new = similarity[[k, i]] - competitor.unwrap_or_else(F::zero);
        Ok(damping.dampen(r_new, responsibility[[k, i]]))
    })
}

/// Self-availability sums the positive responsibilities other items send to `k`; every
/// other cell adds `R[k, k]` to the positive support from items other than `k` and `i`,
/// capped at zero.
pub(crate) fn availability_matrix<F>(
    responsibility: &Array2<F>,
    availability: &Array2<F>,
    damping: Damping<F>,
    fabric: &Fabric,
) -> Result<Array2<F>, ClusterError>
where
    F: Float + Send + Sync,
{
    let n = responsibility.nrows();
    let zero = F::zero();
    fabric.matrix(n, |k, i| {
        let evidence = responsibility
            .row(k)
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != k && *j != i)
            .fold(zero, |acc, (_, &r)| acc + r.max(zero));
        let a_new = if k == i {
            evidence
        } else {
            (responsibility[[k, k]] + evidence).min(zero)
        };
        Ok(damping.dampen(a_new, availability[[k, i]]))
    })
}

/// Assign each item to `argmax_k A[k, i] + R[k, i]`, lowest index on ties
pub(crate) fn exemplar_map<F>(
    availability: &Array2<F>,
    responsibility: &Array2<F>,
    fabric: &Fabric,
) -> ExemplarMap
where
    F: Float + Send + Sync,
{
    let combined = availability + responsibility;
    let choices = fabric.map(combined.ncols(), |i| max_argmax(combined.column(i)).0);
    let mut exemplar_map = ExemplarMap::new();
    choices
        .into_iter()
        .enumerate()
        .for_each(|(i, k)| exemplar_map.entry(k).or_default().push(i));
    exemplar_map
}

/// First maximum of a non-empty view
fn max_argmax<F>(data: ArrayView1<F>) -> (usize, F)
where
    F: Float,
{
    let mut max_pos = 0;
    let mut max: F = data[0];
    data.iter().enumerate().for_each(|(idx, val)| {
        if *val > max {
            max = *val;
            max_pos = idx;
        }
    });
    (max_pos, max)
}

fn max_and_runner_up<F>(data: ArrayView1<F>) -> (usize, F, Option<F>)
where
    F: Float,
{
    let (max_pos, max) = max_argmax(data);
    let runner_up = data
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != max_pos)
        .map(|(_, v)| *v)
        .fold(None, |acc: Option<F>, v| match acc {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        });
    (max_pos, max, runner_up)
}
