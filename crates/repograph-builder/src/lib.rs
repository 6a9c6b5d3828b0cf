//! Graph construction from collaborator records and the per-run pipeline

pub mod builder;
pub mod config;
pub mod pipeline;
pub mod records;


pub use builder::{BuiltGraph, GraphBuilder, build_graph, normalize_package};
pub use config::{BuildConfig, CONFIG_FILE};
pub use pipeline::{BuildOutcome, OutputPaths, run_build};
pub use records::{
    ArtifactRecord, AssetCardRecord, AssetRecord, BuildInput, DependencyEntry, EntityEvent, EntityKind,
    FileRecord, FileStatus,
};
