use crate::{ErrString, RaggedResult};

/// Extension trait for RaggedResult
pub trait ResultExt<T>: private::Sealed {
    /// Wrap an error with the name of the operation that produced it.
    fn with_operation<S: Into<ErrString>>(self, operation: S) -> RaggedResult<T>;
}

mod private {
    use crate::RaggedResult;

    pub trait Sealed {}

    impl<T> Sealed for RaggedResult<T> {}
}

impl<T> ResultExt<T> for RaggedResult<T> {
    fn with_operation<S: Into<ErrString>>(self, operation: S) -> RaggedResult<T> {
        self.map_err(|e| e.with_context(operation))
    }
}
