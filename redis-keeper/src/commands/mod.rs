//! Command names, keywords and option builders
//!
//! Everything here is plain data: no I/O happens until the rendered
//! arguments are handed to a [`Client`](crate::Client) or a
//! [`PooledConnection`](crate::PooledConnection).

pub mod keywords;
pub mod names;
pub mod options;

pub use options::{ScanOptions, SetOptions};
