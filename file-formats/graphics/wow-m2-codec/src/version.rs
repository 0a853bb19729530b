use std::fmt;

use crate::error::{M2Error, Result};

/// Numeric format revision stored right after the `MD20` magic.
///
/// The layout of almost every structure depends on this value, so it is
/// threaded through every codec call. Named revisions are provided as
/// associated constants; any code inside [`M2Version::MIN`]..=[`M2Version::MAX`]
/// is accepted and written back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct M2Version(u32);

impl M2Version {
    pub const CLASSIC: Self = Self(256);
    pub const BURNING_CRUSADE: Self = Self(260);
    pub const LATE_BURNING_CRUSADE: Self = Self(263);
    /// First revision with per-sequence timelines, `.anim` and `.skin` side files
    pub const LICH_KING: Self = Self(264);
    /// First revision storing the camera field of view as a track
    pub const CAMERA_FOV_TRACK: Self = Self(271);
    pub const CATACLYSM: Self = Self(272);
    pub const PANDARIA: Self = Self(272);
    pub const DRAENOR: Self = Self(272);
    pub const LEGION: Self = Self(274);

    pub const MIN: Self = Self::CLASSIC;
    pub const MAX: Self = Self::LEGION;

    /// Validate a version code read from a file or supplied by a caller
    pub fn from_header_version(version: u32) -> Result<Self> {
        if (Self::MIN.0..=Self::MAX.0).contains(&version) {
            Ok(Self(version))
        } else {
            Err(M2Error::UnsupportedVersion(version))
        }
    }

    /// The code written to the file header
    pub const fn to_header_version(self) -> u32 {
        self.0
    }

    /// Tracks store one timeline per sequence instead of a single ranged one
    pub fn has_sequence_timelines(self) -> bool {
        self >= Self::LICH_KING
    }

    /// Views live in `.skin` side files and sequences may live in `.anim` files
    pub fn has_external_files(self) -> bool {
        self >= Self::LICH_KING
    }

    /// Chunked (`MD21`) output is the default from Legion on
    pub fn prefers_chunked(self) -> bool {
        self >= Self::LEGION
    }

    /// Human readable expansion name
    pub fn expansion(self) -> &'static str {
        match self.0 {
            ..=259 => "Classic",
            260..=263 => "The Burning Crusade",
            264 => "Wrath of the Lich King",
            265..=271 => "Cataclysm (beta)",
            272 => "Cataclysm / Mists of Pandaria / Warlords of Draenor",
            _ => "Legion",
        }
    }
}

impl Default for M2Version {
    fn default() -> Self {
        Self::LICH_KING
    }
}

impl TryFrom<u32> for M2Version {
    type Error = M2Error;

    fn try_from(value: u32) -> Result<Self> {
        Self::from_header_version(value)
    }
}

impl fmt::Display for M2Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.expansion())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(256, "Classic")]
    #[test_case(260, "The Burning Crusade")]
    #[test_case(264, "Wrath of the Lich King")]
    #[test_case(274, "Legion")]
    fn test_expansion_names(code: u32, name: &str) {
        let version = M2Version::from_header_version(code).unwrap();
        assert_eq!(version.expansion(), name);
        assert_eq!(version.to_header_version(), code);
    }

    #[test_case(0)]
    #[test_case(255)]
    #[test_case(275)]
    #[test_case(0xCAFE)]
    fn test_rejects_unknown_codes(code: u32) {
        assert!(matches!(
            M2Version::from_header_version(code),
            Err(M2Error::UnsupportedVersion(c)) if c == code
        ));
    }

    #[test]
    fn test_ordering_and_gates() {
        assert!(M2Version::CLASSIC < M2Version::BURNING_CRUSADE);
        assert!(M2Version::LATE_BURNING_CRUSADE < M2Version::LICH_KING);
        assert!(!M2Version::LATE_BURNING_CRUSADE.has_sequence_timelines());
        assert!(M2Version::LICH_KING.has_sequence_timelines());
        assert!(M2Version::CATACLYSM >= M2Version::CAMERA_FOV_TRACK);
        assert!(M2Version::LEGION.prefers_chunked());
        assert!(!M2Version::CATACLYSM.prefers_chunked());
    }
}
