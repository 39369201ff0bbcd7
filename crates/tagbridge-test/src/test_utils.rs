//! Assertion helpers.

use tagbridge_core::{Error, Result};

/// Asserts that `result` failed with [`Error::TagUnknown`] for `tag`.
///
/// # Panics
///
/// Panics if the result is `Ok` or a different error.
#[track_caller]
pub fn assert_tag_unknown<T: std::fmt::Debug>(result: &Result<T>, tag: &str) {
    match result {
        Err(Error::TagUnknown { tag: actual }) => {
            assert_eq!(actual, tag, "TagUnknown reported for the wrong tag");
        }
        other => panic!("expected TagUnknown for '{tag}', got {other:?}"),
    }
}

/// Asserts that `result` failed with [`Error::RepositoryUnknown`].
///
/// # Panics
///
/// Panics if the result is `Ok` or a different error.
#[track_caller]
pub fn assert_repository_unknown<T: std::fmt::Debug>(result: &Result<T>) {
    assert!(
        matches!(result, Err(Error::RepositoryUnknown { .. })),
        "expected RepositoryUnknown, got {result:?}"
    );
}
