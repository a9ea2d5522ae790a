//! Type definitions for the HTTP surface
//!
//! Request bodies are typed so malformed shapes are rejected before a
//! handler runs. Every body and response uses camelCase keys.

pub mod requests;
pub mod responses;

pub use requests::*;
pub use responses::*;
