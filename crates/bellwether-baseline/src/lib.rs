//! # Baseline Record
//!
//! The canonical, integrity-hashed record of everything observed about a
//! tool server at one point in time. The serialized form is the contract:
//! a baseline saved to disk round-trips byte-for-byte, carries a SHA-256
//! integrity hash over its canonical form, and older format versions are
//! migrated forward at load time.
//!
//! The interview engine produces baselines; the comparator consumes two of
//! them. Neither ever mutates a loaded baseline.

mod docscore;
mod error;
mod integrity;
mod migrate;
mod model;

pub use docscore::documentation_score;
pub use error::{BaselineError, Result};
pub use integrity::{compute_integrity_hash, load, save, seal, verify};
pub use migrate::migrate_to_current;
pub use model::{
    Baseline, BaselineMetadata, Capabilities, PersonaPassRate, PromptDescriptor,
    ResourceDescriptor, ResourceTemplateDescriptor, ServerInfo, ToolAnnotations, ToolAssessment,
    ToolDescriptor, ToolRecord, DEFAULT_BASELINE_FILENAME, FORMAT_VERSION,
};
