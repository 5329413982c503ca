//! Conflict detection, resolution, merging and comparison
//!
//! Everything here is a synchronous function over already-fetched snapshots;
//! persistence lives in [`crate::db`].

mod compare;
mod detect;
mod merge;
mod resolve;
mod stats;

pub use compare::{compare, format_field_label, format_field_value, DisplayOptions, FieldComparison};
pub use detect::detect;
pub use merge::merge;
pub use resolve::{pick_side, resolve, Clock, FixedClock, Resolver, SystemClock};
pub use stats::calculate_conflict_stats;
