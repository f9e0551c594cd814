//! Transport layer. Only stdio is provided.

pub mod stdio;

pub use stdio::StdioTransport;
