//! The error taxonomy for the type-and-layout subsystem, following the
//! four-category propagation policy this crate is built around: malformed
//! descriptors are recoverable per-class, unsupported types are fatal for
//! the affected class, unsupported targets are fatal for the whole
//! compilation, and trampoline-variant misuse is an internal invariant
//! violation.
//!
//! Uses `thiserror` for the `#[error("...")]`-derived `Display`/`Error`
//! impls, the pattern most of this pack's compiler-shaped crates reach for
//! in place of hand-written `impl Display`/`impl Error`.

use thiserror::Error;

/// A malformed field or method descriptor. Recoverable: the caller skips
/// the offending field/method and continues with the rest of the class.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("descriptor `{0}` ends before a type tag")]
    Truncated(String),
    #[error("descriptor `{1}` has unknown type tag `{0}`")]
    UnknownTag(char, String),
    #[error("descriptor `{0}` has an unterminated reference type (missing `;`)")]
    UnterminatedReference(String),
    #[error("descriptor `{0}` has an empty reference type name")]
    EmptyReferenceName(String),
    #[error("descriptor `{0}` has trailing data after a complete type")]
    TrailingData(String),
    #[error("method descriptor `{0}` is missing its opening `(`")]
    MissingOpenParen(String),
    #[error("method descriptor `{0}` is missing its closing `)`")]
    MissingCloseParen(String),
}

/// A type the mapper cannot lower to IR. Fatal for the class being mapped;
/// the caller is expected to abandon that class and continue with others.
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("class `{class}` has no registered layout and is not a primitive or array type")]
    UnknownClass { class: String },
    #[error("field `{field}` of class `{class}` has an unsupported descriptor: {source}")]
    UnsupportedField {
        class: String,
        field: String,
        #[source]
        source: DescriptorError,
    },
}
