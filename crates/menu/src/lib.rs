//! Menu tree domain (navigation forest, route resolution).
//!
//! Pure domain logic only: no IO, no persistence, no rendering. Everything
//! here takes a tree by reference and returns plain data.

pub mod model;
pub mod normalize;
pub mod resolver;
pub mod scope;

pub use model::{Badge, MenuConfig, MenuForest, MenuNode, ProfileSection};
pub use normalize::{normalize_badge, normalize_payload};
pub use resolver::{
    ancestor_chain, build_route, find_by_key, first_navigable, join_route, match_path_segments,
    relative_segments, resolve_path_segment, split_path,
};
pub use scope::scope_nodes;
