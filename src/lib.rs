pub use affinity_propagation::{AffinityPropagation, Builder, Cluster};
pub use algorithm::ExemplarMap;
pub use config::{Config, RunOptions, RunSummary, DEFAULT_DAMPING};
pub use error::{BoxError, ClusterError};
pub use export::to_matlab;
pub use fabric::Parallelism;
pub use preference::Preference;
pub use similarity::{
    from_fn, try_from_fn, FromFn, NegAbsolute, NegCosine, NegEuclidean, Similarity, TryFromFn,
};

mod affinity_propagation;
mod algorithm;
mod config;
mod error;
mod export;
mod fabric;
mod preference;
mod similarity;
