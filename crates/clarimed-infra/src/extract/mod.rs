//! Text-extraction client implementations.
//!
//! The extraction sidecar does the heavy lifting (PDF text, OCR for
//! scans); this module only ships the bytes over HTTP and interprets
//! the reply.

pub mod http;

pub use http::HttpTextExtractor;
