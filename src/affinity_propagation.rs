use ndarray::Array2;
use num_traits::Float;
use tracing::{debug, info};

use crate::algorithm::{similarity_matrix, Calculation, Damping, ExemplarMap};
use crate::fabric::{Fabric, Parallelism};
use crate::similarity::{from_fn, try_from_fn};
use crate::{BoxError, ClusterError, Config, Preference, RunOptions, RunSummary, Similarity};

/// One exemplar and every item assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster<'a, T> {
    pub exemplar: &'a T,
    pub members: Vec<&'a T>,
}

/// Clustering session over a fixed collection of items.
///
/// The similarity matrix is evaluated once when the session is built. Each call to
/// [`iterate`](Self::iterate) recomputes availability, then responsibility, then the
/// exemplar assignment, and counts how many consecutive iterations left the assignment
/// unchanged.
///
///     use exemplar::AffinityPropagation;
///
///     let mut ap = AffinityPropagation::builder(vec![1., 2., 10.])
///         .similarity_fn(|a: &f64, b: &f64| -(a - b).abs())
///         .build()
///         .unwrap();
///     let summary = ap.run(Default::default()).unwrap();
///     assert!(summary.converged);
///     assert_eq!(ap.clusters().len(), 2);
pub struct AffinityPropagation<T, F>
where
    F: Float + Send + Sync,
{
    items: Vec<T>,
    calculation: Calculation<F>,
    fabric: Fabric,
    exemplar_map: ExemplarMap,
    total_iterations: usize,
    stable_iterations: usize,
}

impl<T, F> AffinityPropagation<T, F>
where
    T: Sync,
    F: Float + Send + Sync,
{
    /// Start configuring a session over `items`
    pub fn builder<'s>(items: Vec<T>) -> Builder<'s, T, F> {
        Builder {
            items,
            config: Config::default(),
            similarity: None,
        }
    }

    /// Build a session with default damping, parallelism and preference
    pub fn new<S>(items: Vec<T>, s: S) -> Result<Self, ClusterError>
    where
        S: Similarity<T, F>,
    {
        Self::builder(items).similarity(s).build()
    }

    /// Return to the initial zero state; the similarity matrix is kept
    pub fn reset(&mut self) {
        self.calculation.reset();
        self.exemplar_map.clear();
        self.total_iterations = 0;
        self.stable_iterations = 0;
    }

    /// Advance one availability, responsibility and assignment cycle.
    ///
    /// On error the session is left exactly as it was before the call.
    pub fn iterate(&mut self) -> Result<(), ClusterError> {
        self.calculation.update(&self.fabric)?;
        let exemplar_map = self.calculation.generate_exemplar_map(&self.fabric);
        if exemplar_map == self.exemplar_map {
            self.stable_iterations += 1;
        } else {
            self.exemplar_map = exemplar_map;
            self.stable_iterations = 0;
        }
        self.total_iterations += 1;
        debug!(
            iteration = self.total_iterations,
            stable = self.stable_iterations,
            exemplars = self.exemplar_map.len(),
            "iteration complete"
        );
        Ok(())
    }

    /// Iterate until `max_iterations` total iterations or `stability_threshold` consecutive
    /// unchanged assignments, whichever comes first
    pub fn run(&mut self, options: RunOptions) -> Result<RunSummary, ClusterError> {
        self.run_with_progress(options, |_, _| {})
    }

    /// As [`run`](Self::run), calling `on_progress(total_iterations, stable_iterations)`
    /// after each iteration
    pub fn run_with_progress<P>(
        &mut self,
        options: RunOptions,
        mut on_progress: P,
    ) -> Result<RunSummary, ClusterError>
    where
        P: FnMut(usize, usize),
    {
        if self.is_empty() {
            return Ok(self.summary(options));
        }
        while self.total_iterations < options.max_iterations
            && self.stable_iterations < options.stability_threshold
        {
            self.iterate()?;
            on_progress(self.total_iterations, self.stable_iterations);
        }
        let summary = self.summary(options);
        info!(
            iterations = summary.iterations,
            converged = summary.converged,
            clusters = self.exemplar_map.len(),
            "run finished"
        );
        Ok(summary)
    }

    fn summary(&self, options: RunOptions) -> RunSummary {
        RunSummary {
            iterations: self.total_iterations,
            stable_iterations: self.stable_iterations,
            converged: self.converged(options.stability_threshold),
        }
    }
}

impl<T, F> AffinityPropagation<T, F>
where
    F: Float + Send + Sync,
{
    /// Current assignment resolved back to the items, ordered by exemplar index
    pub fn clusters(&self) -> Vec<Cluster<'_, T>> {
        self.exemplar_map
            .iter()
            .map(|(exemplar, members)| Cluster {
                exemplar: &self.items[*exemplar],
                members: members.iter().map(|m| &self.items[*m]).collect(),
            })
            .collect()
    }

    pub fn exemplar_map(&self) -> &ExemplarMap {
        &self.exemplar_map
    }

    pub fn similarity(&self) -> &Array2<F> {
        &self.calculation.similarity
    }

    pub fn responsibility(&self) -> &Array2<F> {
        &self.calculation.responsibility
    }

    pub fn availability(&self) -> &Array2<F> {
        &self.calculation.availability
    }

    pub fn total_iterations(&self) -> usize {
        self.total_iterations
    }

    pub fn stable_iterations(&self) -> usize {
        self.stable_iterations
    }

    /// Whether the assignment has been unchanged for at least `stability_threshold` iterations
    pub fn converged(&self, stability_threshold: usize) -> bool {
        self.items.is_empty() || self.stable_iterations >= stability_threshold
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Validated construction of an [`AffinityPropagation`] session.
pub struct Builder<'s, T, F>
where
    F: Float + Send + Sync,
{
    items: Vec<T>,
    config: Config<F>,
    similarity: Option<Box<dyn Similarity<T, F> + 's>>,
}

impl<'s, T, F> Builder<'s, T, F>
where
    T: Sync,
    F: Float + Send + Sync,
{
    pub fn config(mut self, config: Config<F>) -> Self {
        self.config = config;
        self
    }

    pub fn damping(mut self, damping: F) -> Self {
        self.config.damping = damping;
        self
    }

    pub fn parallelism(mut self, parallelism: Parallelism) -> Self {
        self.config.parallelism = parallelism;
        self
    }

    pub fn preference(mut self, preference: Preference<F>) -> Self {
        self.config.preference = preference;
        self
    }

    pub fn similarity<S>(mut self, s: S) -> Self
    where
        S: Similarity<T, F> + 's,
    {
        self.similarity = Some(Box::new(s));
        self
    }

    /// Use an infallible closure, called as `f(item, exemplar)`
    pub fn similarity_fn<C>(self, f: C) -> Self
    where
        C: Fn(&T, &T) -> F + Sync + 's,
    {
        self.similarity(from_fn(f))
    }

    /// Use a fallible closure; an error fails the build
    pub fn try_similarity_fn<C, E>(self, f: C) -> Self
    where
        C: Fn(&T, &T) -> Result<F, E> + Sync + 's,
        E: Into<BoxError> + 's,
    {
        self.similarity(try_from_fn(f))
    }

    /// Validate the configuration, then evaluate the similarity matrix
    pub fn build(self) -> Result<AffinityPropagation<T, F>, ClusterError> {
        let s = self.similarity.ok_or(ClusterError::MissingSimilarity)?;
        let damping = Damping::new(self.config.damping)?;
        self.config.preference.validate(self.items.len())?;
        let fabric = Fabric::new(self.config.parallelism)?;
        info!(
            items = self.items.len(),
            damping = ?self.config.damping.to_f64(),
            fabric = ?fabric,
            "building similarity matrix"
        );
        let similarity = similarity_matrix(&self.items, &*s, &self.config.preference, &fabric)?;
        Ok(AffinityPropagation {
            items: self.items,
            calculation: Calculation::new(damping, similarity),
            fabric,
            exemplar_map: ExemplarMap::new(),
            total_iterations: 0,
            stable_iterations: 0,
        })
    }
}
