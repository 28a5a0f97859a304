//! Client for the emotion classification service.
//!
//! The service receives one encoded frame at a time and answers with the
//! dominant facial emotion and its confidence, or reports that no face was
//! found. [`EmotionScorer`] is the seam the analysis pipeline depends on;
//! [`EmotionClient`] is the HTTP implementation.

pub mod client;
pub mod error;
pub mod types;

pub use client::{EmotionClient, EmotionScorer, MlClientConfig};
pub use error::{MlError, MlResult};
pub use types::{ClassifyRequest, ClassifyResponse, EmotionOutcome};
