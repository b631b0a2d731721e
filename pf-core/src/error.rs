//! Error types, shared with the rest of the workspace

pub use pf_error::{PifanError, Result};
