//! Lossless reader and writer for World of Warcraft M2 models.
//!
//! Every structure takes part in a two-pass protocol (see [`codec`]): a
//! header pass over fixed-size descriptors and a content pass that follows
//! them. Array offsets are back-patched on save, animation tracks are split
//! per sequence regardless of revision, and derived lookups are regenerated
//! from entity keys.
//!
//! ```no_run
//! use wow_m2_codec::{M2Model, SaveOptions};
//!
//! let mut model = M2Model::load_from_path("Creature/Wolf/Wolf.m2")?;
//! println!("{} bones, {} sequences", model.bones.len(), model.sequences.len());
//!
//! // Write it back as a Burning Crusade model
//! model.save_to_path_with("Wolf.m2", &SaveOptions::new().version(260))?;
//! # Ok::<(), wow_m2_codec::M2Error>(())
//! ```

pub mod array_ref;
pub mod chunks;
pub mod codec;
pub mod common;
pub mod debug;
pub mod error;
pub mod file_resolver;
pub mod io_ext;
pub mod lookup;
pub mod model;
pub mod options;
pub mod sequence;
pub mod skin;
pub mod track;
pub mod version;

// Re-export common types
pub use array_ref::ArrayRef;
pub use codec::{M2Codec, M2Context, M2Value, PatchToken};
pub use error::{M2Error, Result};
pub use file_resolver::{AnimFileKey, ExternalFiles, MemoryFiles, PathResolver};
pub use lookup::{MinimumShape, build_lookup};
pub use model::{M2Model, M2ModelFlags};
pub use options::{LoadOptions, SaveOptions};
pub use sequence::{M2Sequence, M2SequenceFlags, SequenceRegistry};
pub use skin::{M2Batch, M2ShadowBatch, M2SkinProfile, M2SkinSection};
pub use track::{EventTrack, InterpolationType, SequenceAware, Timeline, Track};
pub use version::M2Version;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
