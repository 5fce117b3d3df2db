//! Crate error types

use thiserror::Error;

/// State corruption detected after a frame; halts the loop
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("player entity is missing or not tagged as the player")]
    MissingPlayer,
    #[error("non-finite {what} on entity {id}")]
    NonFinite { id: u32, what: &'static str },
    #[error("dead entity {id} survived frame cleanup")]
    DeadEntityRetained { id: u32 },
}

/// Invalid or unreadable settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Snapshot encode/decode failures
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// Audio backend failures (never surfaced to the player)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio output unavailable")]
    Unavailable,
    #[error("audio context refused to resume: {0}")]
    Rejected(String),
}

/// GPU setup failures; the game keeps running without a canvas
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}
