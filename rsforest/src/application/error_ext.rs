//! Path-annotated conversion of I/O failures into application errors

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Attach the record file path to I/O results entering the application layer.
pub trait IoResultExt<T> {
    /// A missing file becomes [`ApplicationError::FileNotFound`]; any other
    /// failure becomes [`ApplicationError::OperationFailed`] naming `action`.
    ///
    /// ```ignore
    /// let content = fs.read_to_string(path).with_path_context("read records", path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ApplicationError::FileNotFound(path.to_path_buf()),
            _ => ApplicationError::OperationFailed {
                context: format!("{action} {}", path.display()),
                source: Box::new(e),
            },
        })
    }
}
