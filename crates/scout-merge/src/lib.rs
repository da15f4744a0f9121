//! Deduplicator, merger, and finalizer (spec section 4.6). Groups
//! `ExtractedEntity` records that refer to the same real-world entity,
//! merges each group field-by-field using trust metadata and structural
//! quality, and produces the final, slugged `Entity` ready for upsert.

pub mod candidate;
pub mod dedup;
pub mod entity;
pub mod finalize;
pub mod merge;

pub use candidate::MergeCandidate;
pub use dedup::group_duplicates;
pub use entity::{Entity, SourceInfo};
pub use finalize::generate_slug;
pub use merge::merge_group;
