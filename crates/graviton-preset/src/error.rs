//! Error types for preset operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, saving, or converting presets.
#[derive(Debug, Error)]
pub enum PresetError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// No scene with the requested name exists
    #[error("scene not found: {0}")]
    SceneNotFound(String),

    /// Connection names a modulation source this build does not know
    #[error("unknown modulation source: {0}")]
    UnknownSource(String),

    /// Connection names a destination parameter this build does not know
    #[error("unknown destination parameter: {0}")]
    UnknownDestination(String),

    /// Connection names an unknown curve shape
    #[error("unknown curve shape: {0}")]
    UnknownCurve(String),

    /// Preset names an unknown routing topology
    #[error("unknown topology: {0}")]
    UnknownTopology(String),

    /// Preset names an unknown processing mode
    #[error("unknown processing mode: {0}")]
    UnknownProcessingMode(String),

    /// Preset names an unknown macro mode
    #[error("unknown macro mode: {0}")]
    UnknownMacroMode(String),

    /// Sequence names an unknown playback mode
    #[error("unknown playback mode: {0}")]
    UnknownPlaybackMode(String),
}

impl PresetError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::CreateDir {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_factory_produces_correct_variant() {
        let err = PresetError::read_file("/some/path", mock_io_err());
        assert!(
            matches!(err, PresetError::ReadFile { ref path, .. } if path == std::path::Path::new("/some/path"))
        );
    }

    #[test]
    fn io_variants_expose_their_source() {
        assert!(PresetError::read_file("/x", mock_io_err()).source().is_some());
        assert!(PresetError::write_file("/x", mock_io_err()).source().is_some());
        assert!(PresetError::create_dir("/x", mock_io_err()).source().is_some());
    }

    #[test]
    fn name_errors_display_the_offending_name() {
        let err = PresetError::UnknownSource("warbleizer".to_string());
        assert_eq!(err.to_string(), "unknown modulation source: warbleizer");
        assert!(err.source().is_none());

        let err = PresetError::UnknownDestination("loudness".to_string());
        assert_eq!(err.to_string(), "unknown destination parameter: loudness");

        let err = PresetError::UnknownCurve("wiggle".to_string());
        assert_eq!(err.to_string(), "unknown curve shape: wiggle");
    }
}
