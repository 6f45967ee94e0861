//! # Error Taxonomy
//!
//! Every failure surfaced by the library names the stage and the resource
//! involved, so a log line is enough to tell a missing photo folder from a
//! panel that stopped answering halfway through a transfer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while selecting assets, rendering or transferring a calendar.
#[derive(Error, Debug)]
pub enum CalendarError {
    /// Photo directory or file missing, unreadable or undecodable
    #[error("photo asset not found at {}: {reason}", path.display())]
    AssetNotFound { path: PathBuf, reason: String },

    /// Photo directory readable but holds no usable images
    #[error("no photos found in {}", dir.display())]
    EmptyAssetSet { dir: PathBuf },

    /// Geometry that cannot be drawn (non-finite coordinates, zero-sized areas)
    #[error("render failed: {0}")]
    RenderFailure(String),

    /// Any network or HTTP error while talking to the panel
    #[error("transfer to panel failed during {stage}: {source}")]
    TransferFailure {
        stage: String,
        #[source]
        source: TransportError,
    },

    /// Malformed or out-of-range configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Event hand-off file missing or malformed
    #[error("cannot read events from {}: {reason}", path.display())]
    EventSource { path: PathBuf, reason: String },

    /// Rendered image could not be written
    #[error("cannot write image to {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failure of a single request to the panel.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection error, timeout or non-2xx status
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Frame could not be encoded into a request path
    #[error("cannot encode request: {0}")]
    Encoding(#[from] crate::protocol::EncodeError),

    /// Request refused by a non-HTTP transport
    #[error("request rejected: {0}")]
    Rejected(String),
}
