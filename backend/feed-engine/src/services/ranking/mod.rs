/// Ranking Module
///
/// Scores posts with one of five interchangeable strategies and sorts them
/// into a deterministic total order.
///
/// # Strategies
/// - **newest**: creation time
/// - **trending**: engagement per hour of age (`now` is an explicit input)
/// - **score**: likes minus downvotes
/// - **wilson**: 95% Wilson lower bound on the like ratio
/// - **controversial**: vote volume weighted by how evenly votes split
///
/// Ties always break by `uri` ascending.
pub mod forum;
pub mod scoring;
pub mod sorter;
pub mod votes;

pub use forum::rank_threads;
pub use scoring::{score_post, wilson_lower_bound};
pub use sorter::{order_by_scores, rank_posts};
pub use votes::score_votes;
