//! Stable machine-readable classification shared by every error enum.

/// Trait for errors that carry a stable code (`E_*`) and a retry hint.
///
/// The CLI prints the code alongside the message so scripts can branch on it.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
