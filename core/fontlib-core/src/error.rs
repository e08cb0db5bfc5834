//! Error types for font library operations.

use std::io;
use std::path::PathBuf;
use std::result;

/// Errors surfaced by the library, each carrying a stable code for API envelopes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to download {family} from {url}: {reason}")]
    Download {
        family: String,
        url: String,
        reason: String,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("sorry, this file type is not permitted for fonts: {0}")]
    InvalidFileType(String),

    #[error("failed to create font record for {0}")]
    CreateFont(String),

    #[error("font slug {0:?} is not a single path segment")]
    InvalidSlug(String),

    #[error("no font with id {0}")]
    FontNotFound(u64),

    #[error("failed to generate font CSS: {0}")]
    CssGeneration(Box<Error>),

    #[error("font store is corrupt ({}): {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings are corrupt ({}): {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Machine-readable code reported as `error_code` by the HTTP API.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Download { .. } => "font_download_failed",
            Error::Write { .. } | Error::Read { .. } => "font_file_write_failed",
            Error::InvalidFileType(_) => "rest_font_upload_invalid_file_type",
            Error::CreateFont(_) => "font_post_create_failed",
            Error::InvalidSlug(_) => "font_post_create_failed",
            Error::FontNotFound(_) => "font_post_delete_failed",
            Error::CssGeneration(_) => "font_css_generation_failed",
            Error::Store { .. } => "store_failed",
            Error::Settings { .. } => "settings_failed",
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
