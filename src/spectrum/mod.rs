pub mod analyzer;
pub mod smooth;
pub mod snapshot;
pub mod weighting;
