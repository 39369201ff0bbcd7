//! Pullthrough visibility policy.
//!
//! Every tag operation decides visibility through [`visible`]. Nothing else in
//! the workspace combines the managed flag with the pullthrough flag.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Decides whether an image may be served through a repository.
///
/// Managed images are always visible. Unmanaged images are visible only when
/// the repository has pullthrough enabled.
///
/// # Examples
///
/// ```
/// use tagbridge_core::policy::visible;
///
/// assert!(visible(true, false));
/// assert!(visible(false, true));
/// assert!(!visible(false, false));
/// ```
#[must_use]
pub const fn visible(managed: bool, pullthrough_enabled: bool) -> bool {
    managed || pullthrough_enabled
}

/// Outcome of a visibility decision, annotated with the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible because the image is managed by this registry.
    Managed,

    /// Visible because pullthrough is enabled for an unmanaged image.
    Pullthrough,

    /// Not visible: unmanaged image and pullthrough disabled.
    Hidden,
}

impl Visibility {
    /// Classifies a decision.
    #[must_use]
    pub const fn decide(managed: bool, pullthrough_enabled: bool) -> Self {
        if !visible(managed, pullthrough_enabled) {
            Self::Hidden
        } else if managed {
            Self::Managed
        } else {
            Self::Pullthrough
        }
    }

    /// Returns true unless the decision is [`Visibility::Hidden`].
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden)
    }

    /// Returns the decision as a lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Managed => "managed",
            Self::Pullthrough => "pullthrough",
            Self::Hidden => "hidden",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
