//! No-query browse curation.

pub mod curator;

pub use curator::{ExploreConfig, ExploreCurator, ExploreSection, SectionKind};
