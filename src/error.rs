//! Error types for clustering sessions.

use thiserror::Error;

/// Boxed error returned by a fallible similarity measure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building or advancing a clustering session.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Session was built without a similarity measure.
    #[error("No similarity measure provided to calculate similarities within data")]
    MissingSimilarity,

    /// Invalid parameter provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of what's wrong with the parameter
        message: String,
    },

    /// The similarity measure failed for one ordered pair.
    #[error("Similarity of item {item} to exemplar {exemplar} failed: {source}")]
    Similarity {
        /// Index of the item being explained
        item: usize,
        /// Index of the candidate exemplar
        exemplar: usize,
        /// Error raised by the measure
        #[source]
        source: BoxError,
    },

    /// The similarity measure returned NaN.
    #[error("Similarity of item {item} to exemplar {exemplar} is not a number")]
    NonNumeric {
        /// Index of the item being explained
        item: usize,
        /// Index of the candidate exemplar
        exemplar: usize,
    },

    /// Worker pool could not be started.
    #[error("Unable to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Cell buffer did not match the requested matrix shape.
    #[error("Matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl ClusterError {
    /// Create an InvalidArgument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
