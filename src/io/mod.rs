//! File I/O: STL import of tool meshes, STL export of the cut surface.

pub mod stl;

pub use stl::{read_stl, write_stl};

use thiserror::Error;

/// File I/O errors.
///
/// These are input errors a caller can recover from; the kernel keeps
/// no partial state when one is returned.
#[derive(Error, Debug)]
pub enum IoError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unexpected file content
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}
