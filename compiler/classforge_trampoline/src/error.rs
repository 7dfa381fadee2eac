use thiserror::Error;

/// Internal invariant violations in trampoline construction: a variant
/// built with the fields its kind does not use, or without a field it
/// requires. The typed `Trampoline::new_*` constructors never trigger
/// this — it exists as the last line of defense inside `from_parts`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrampolineError {
    #[error("trampoline kind {0:?} requires a member name and descriptor")]
    MissingMember(crate::trampoline::TrampolineKind),
    #[error("trampoline kind {0:?} must not carry a member name or descriptor")]
    UnexpectedMember(crate::trampoline::TrampolineKind),
}
