#![deny(missing_docs)]

//! This crate defines error & result types for ragged arrays.
//! It also contains a variety of useful macros for error handling.

mod ext;

use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

pub use ext::*;

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The top-level error type for ragged arrays.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum RaggedError {
    /// A node or form was assembled from children or roles that violate its contract.
    #[error("construction contract violated: {0}")]
    ConstructionContract(ErrString),
    /// A flat or jagged index is outside the valid bounds.
    #[error("index out of range: {0}")]
    IndexRange(ErrString),
    /// An axis argument is outside the depth of the array.
    #[error("axis out of range: {0}")]
    AxisRange(ErrString),
    /// The branches of the array reach different depths below the requested axis.
    #[error("depth ambiguity: {0}")]
    DepthAmbiguity(ErrString),
    /// The structure of the array does not allow the operation.
    #[error("structural mismatch: {0}")]
    StructuralMismatch(ErrString),
    /// An argument was provided that is not valid for the operation.
    #[error("{0}")]
    InvalidArgument(ErrString),
    /// An error occurred while reading or writing a serialized form or array.
    #[error("{0}")]
    InvalidSerde(ErrString),
    /// A function is not implemented for the given node.
    #[error("function {0} not implemented for {1}")]
    NotImplemented(ErrString, ErrString),
    /// A wrapper for other errors, carrying additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<RaggedError>),
    /// A wrapper for errors from the serde_json crate.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// The category of a [`RaggedError`], seen through any context wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`RaggedError::ConstructionContract`].
    ConstructionContract,
    /// See [`RaggedError::IndexRange`].
    IndexRange,
    /// See [`RaggedError::AxisRange`].
    AxisRange,
    /// See [`RaggedError::DepthAmbiguity`].
    DepthAmbiguity,
    /// See [`RaggedError::StructuralMismatch`].
    StructuralMismatch,
    /// See [`RaggedError::InvalidArgument`].
    InvalidArgument,
    /// See [`RaggedError::InvalidSerde`] and [`RaggedError::SerdeJson`].
    InvalidSerde,
    /// See [`RaggedError::NotImplemented`].
    NotImplemented,
}

impl RaggedError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        RaggedError::Context(msg.into(), Box::new(self))
    }

    /// The kind of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RaggedError::ConstructionContract(_) => ErrorKind::ConstructionContract,
            RaggedError::IndexRange(_) => ErrorKind::IndexRange,
            RaggedError::AxisRange(_) => ErrorKind::AxisRange,
            RaggedError::DepthAmbiguity(_) => ErrorKind::DepthAmbiguity,
            RaggedError::StructuralMismatch(_) => ErrorKind::StructuralMismatch,
            RaggedError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RaggedError::InvalidSerde(_) | RaggedError::SerdeJson(_) => ErrorKind::InvalidSerde,
            RaggedError::NotImplemented(..) => ErrorKind::NotImplemented,
            RaggedError::Context(_, inner) => inner.kind(),
        }
    }
}

impl Debug for RaggedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for Results that return RaggedErrors as their error type.
pub type RaggedResult<T> = Result<T, RaggedError>;

/// A trait for expect-ing a RaggedResult or an Option.
pub trait RaggedExpect {
    /// The type of the value being expected.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn ragged_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> RaggedExpect for Result<T, E>
where
    E: Into<RaggedError>,
{
    type Output = T;

    #[inline(always)]
    fn ragged_expect(self, msg: &str) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|e| crate::ragged_panic!(e.with_context(msg.to_string())))
    }
}

impl<T> RaggedExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn ragged_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| {
            let err = RaggedError::InvalidArgument(msg.to_string().into());
            crate::ragged_panic!(err)
        })
    }
}

/// A convenient macro for creating a RaggedError.
#[macro_export]
macro_rules! ragged_err {
    (ConstructionContract: $($tts:tt)*) => {{
        $crate::__private::must_use(
            $crate::RaggedError::ConstructionContract(format!($($tts)*).into()),
        )
    }};
    (IndexRange: $($tts:tt)*) => {{
        $crate::__private::must_use(
            $crate::RaggedError::IndexRange(format!($($tts)*).into()),
        )
    }};
    (AxisRange: $($tts:tt)*) => {{
        $crate::__private::must_use(
            $crate::RaggedError::AxisRange(format!($($tts)*).into()),
        )
    }};
    (DepthAmbiguity: $($tts:tt)*) => {{
        $crate::__private::must_use(
            $crate::RaggedError::DepthAmbiguity(format!($($tts)*).into()),
        )
    }};
    (StructuralMismatch: $($tts:tt)*) => {{
        $crate::__private::must_use(
            $crate::RaggedError::StructuralMismatch(format!($($tts)*).into()),
        )
    }};
    (InvalidArgument: $($tts:tt)*) => {{
        $crate::__private::must_use(
            $crate::RaggedError::InvalidArgument(format!($($tts)*).into()),
        )
    }};
    (InvalidSerde: $($tts:tt)*) => {{
        $crate::__private::must_use(
            $crate::RaggedError::InvalidSerde(format!($($tts)*).into()),
        )
    }};
    (NotImplemented: $func:expr, $for_whom:expr) => {{
        $crate::__private::must_use(
            $crate::RaggedError::NotImplemented($func.into(), format!("{}", $for_whom).into()),
        )
    }};
    (Context: $msg:literal, $err:expr) => {{
        $crate::__private::must_use(
            $crate::RaggedError::Context($msg.into(), Box::new($err))
        )
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $crate::__private::must_use(
            $crate::RaggedError::InvalidArgument(format!($fmt, $($arg),*).into()),
        )
    }};
}

/// A convenient macro for returning a RaggedError.
#[macro_export]
macro_rules! ragged_bail {
    ($($tt:tt)+) => {
        return Err($crate::ragged_err!($($tt)+))
    };
}

/// A convenient macro for panicking with a RaggedError in the presence of a programmer error
/// (e.g., an invariant has been violated).
#[macro_export]
macro_rules! ragged_panic {
    (Context: $msg:literal, $err:expr) => {{
        $crate::ragged_panic!($crate::ragged_err!(Context: $msg, $err))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::ragged_panic!($crate::ragged_err!($variant: $fmt, $($arg),*))
    };
    ($err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let err: $crate::RaggedError = $err;
        panic!("{}", err.with_context(format!($fmt, $($arg),*)))
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::ragged_panic!($crate::ragged_err!($fmt, $($arg),*))
    };
    ($err:expr) => {{
        let err: $crate::RaggedError = $err;
        panic!("{}", err)
    }};
}

#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    #[inline]
    #[cold]
    #[must_use]
    pub const fn must_use(error: crate::RaggedError) -> crate::RaggedError {
        error
    }
}
