//! Blog article generation and storage.
//!
//! [`generator`] turns a selection of commit records into a normalized
//! markdown article through the provider manager; [`storage`] keeps the
//! resulting documents on disk together with a rebuildable JSON index;
//! [`document`] defines the on-disk frontmatter format shared by both.

pub mod document;
pub mod generator;
pub mod storage;

pub use document::{BlogDocument, Frontmatter, IndexEntry};
pub use generator::{BlogGenerator, CancelToken, GenerationPhase, GenerationRequest};
pub use storage::{
    BlogStorage, ExportFormat, RepairReport, SearchFilter, StorageStats, ValidationReport,
};
