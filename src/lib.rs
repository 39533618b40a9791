//! Lecture Graph
//!
//! Core of a lecture-video knowledge-graph viewer: keeps a playback clock in
//! step with the concepts extracted from a lecture, projects the concept
//! graph for rendering, and drives the direct-to-bucket upload flow.

pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod notify;
pub mod playback;
pub mod session;
pub mod storage;
pub mod store;
pub mod upload;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for easy access
pub use crate::client::LectureGraphClient;
pub use crate::config::Config;
pub use crate::error::{LectureGraphError, Result};
pub use crate::graph::{project, resolve_active, Concept, ConceptId, GraphData, Relationship, TimelineIndex};
pub use crate::notify::ProcessingNotifier;
pub use crate::playback::{PlaybackController, PlaybackPhase, PlaybackState, SeekRequest};
pub use crate::session::LectureSession;
pub use crate::storage::{ObjectStorage, S3Storage};
pub use crate::store::{JsonLectureStore, LectureRecord, LectureStore};
pub use crate::upload::{UploadPipeline, UploadProgress};
