//! Error handling for Soundscape
//!
//! Only configuration parsing and audio loading surface errors. Runtime
//! scheduling problems (inactive scheduler, missing target capability) are
//! silent no-ops, and a failed layer load is reported through the
//! sequencer's initialization flag instead of an `Err`.

use thiserror::Error;

/// Result type alias for Soundscape operations
pub type Result<T> = std::result::Result<T, SequencerError>;

/// Main error type for Soundscape operations
#[derive(Error, Debug)]
pub enum SequencerError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    // Loader Errors
    #[error("Failed to load '{source_ref}': {reason}")]
    LoadFailed { source_ref: String, reason: String },

    // Configuration Errors
    #[error("Unknown action kind '{kind}' in layer '{layer}'")]
    UnknownActionKind { layer: String, kind: String },

    #[error("Invalid action #{index} in layer '{layer}': {reason}")]
    InvalidAction {
        layer: String,
        index: usize,
        reason: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Duplicate layer id: {id}")]
    DuplicateLayer { id: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SequencerError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SequencerError::FileNotFound { .. } => "FILE_NOT_FOUND",
            SequencerError::InvalidAudio { .. } => "INVALID_AUDIO",
            SequencerError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            SequencerError::EmptyAudio => "EMPTY_AUDIO",
            SequencerError::LoadFailed { .. } => "LOAD_FAILED",
            SequencerError::UnknownActionKind { .. } => "UNKNOWN_ACTION_KIND",
            SequencerError::InvalidAction { .. } => "INVALID_ACTION",
            SequencerError::InvalidConfig { .. } => "INVALID_CONFIG",
            SequencerError::DuplicateLayer { .. } => "DUPLICATE_LAYER",
            SequencerError::Io(_) => "IO_ERROR",
            SequencerError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Load problems are recoverable because a later `init()` retries the
    /// failed layers; configuration problems need the file to be fixed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SequencerError::FileNotFound { .. }
                | SequencerError::InvalidAudio { .. }
                | SequencerError::UnsupportedFormat { .. }
                | SequencerError::LoadFailed { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SequencerError::FileNotFound { .. } => vec![
                "Check the layer's file path is correct",
                "Paths are resolved relative to the loader's base directory",
            ],
            SequencerError::InvalidAudio { .. } => vec![
                "Try converting the file to WAV format first",
                "The file may be corrupted - try re-exporting from source",
            ],
            SequencerError::UnsupportedFormat { .. } => vec![
                "Convert to a mono or stereo WAV file",
                "Supported sample formats: 8/16/24/32-bit int, 32-bit float",
            ],
            SequencerError::UnknownActionKind { .. } => vec![
                "Supported action types: play, volume, pan",
                "Load the configuration in lenient mode to skip unknown actions",
            ],
            SequencerError::InvalidAction { .. } => vec![
                "Action start and duration must be finite and non-negative",
            ],
            SequencerError::DuplicateLayer { .. } => vec!["Give every layer a unique id"],
            _ => vec![],
        }
    }
}
