//! S3-compatible object storage client (Cloudflare R2, Supabase storage).
//!
//! Used to fetch videos that callers reference by storage key instead of URL.

pub mod client;
pub mod error;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
