//! Business logic services.
//!
//! Services orchestrate the collaborator traits in [`crate::storage::traits`]
//! and [`crate::embedding`] and provide the high-level operations.

mod assembler;
mod ladder;
mod organize;
mod people_audit;
mod rating_sort;
mod search;
mod sequencer;

pub use assembler::ResultAssembler;
pub use ladder::{Ladder, LadderOutcome, first_non_empty};
pub use organize::OrganizeService;
pub use people_audit::PeopleAuditService;
pub use rating_sort::{sort_by_dimension, sort_by_rating, sort_default};
pub use search::{ImageSearchService, ImageSearchSettings};
pub use sequencer::{
    CentroidProjection, DEFAULT_CHAINING_LIMIT, NearestNeighborChain, OrderingStrategy, Sequencer,
};
