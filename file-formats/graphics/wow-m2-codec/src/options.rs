//! Builders configuring a model load or save

use crate::error::Result;
use crate::version::M2Version;

/// Options for loading a model
///
/// ```no_run
/// use wow_m2_codec::{LoadOptions, M2Model};
///
/// let options = LoadOptions::new().normalize_legacy_materials(true);
/// let model = M2Model::load_from_path_with("Creature/Wolf/Wolf.m2", &options)?;
/// # Ok::<(), wow_m2_codec::M2Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    version: Option<u32>,
    /// Clamp material flags and blend modes of pre-Cataclysm files to the
    /// values those revisions define
    pub normalize_legacy_materials: bool,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret the file as `version` instead of the code stored in its header
    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn normalize_legacy_materials(mut self, normalize: bool) -> Self {
        self.normalize_legacy_materials = normalize;
        self
    }

    /// Version to decode with, given the code read from the file
    pub(crate) fn resolve_version(&self, stored: u32) -> Result<M2Version> {
        match self.version {
            Some(version) => {
                if version != stored {
                    log::debug!("decoding version {stored} file as version {version}");
                }
                M2Version::from_header_version(version)
            }
            None => M2Version::from_header_version(stored),
        }
    }
}

/// Options for saving a model
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    version: Option<u32>,
    chunked: Option<bool>,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target format revision; defaults to the model's own version
    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Wrap the output in an `MD21` container followed by the file id chunks.
    ///
    /// Defaults to on for Legion and later.
    pub fn chunked(mut self, chunked: bool) -> Self {
        self.chunked = Some(chunked);
        self
    }

    pub(crate) fn resolve_version(&self, model_version: M2Version) -> Result<M2Version> {
        self.version
            .map_or(Ok(model_version), M2Version::from_header_version)
    }

    pub(crate) fn resolve_chunked(&self, version: M2Version) -> bool {
        self.chunked.unwrap_or_else(|| version.prefers_chunked())
    }
}
