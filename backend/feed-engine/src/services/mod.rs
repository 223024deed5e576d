pub mod backend;
pub mod consensus;
pub mod masonry;
pub mod ranking;
pub mod remix;

pub use backend::{BackendKind, RankingBackend, ReferenceBackend, VectorizedBackend};
