//! Hierarchy builder for enriched records.
//!
//! Turns a flat list of enriched records plus a set of date columns into an
//! owner → country → program tree with per-day cell counts and totals.

pub mod builder;
pub mod node;
pub mod normalize;
pub mod view;

pub use builder::*;
pub use node::*;
pub use normalize::{Abbreviation, EligibilitySplit, EligibilityVariant, NormalizationRules};
pub use view::{visible_rows, ExpansionState, VisibleRow};
