#![forbid(unsafe_code)]

use crate::types::{BuilderError, Result};

/// Lifecycle shared by every sub-builder.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing accepted yet.
    #[default]
    Uninitialized,
    /// Renderable, still open for input.
    Initialized,
    /// Rendered and frozen.
    Terminated,
}

impl BuilderState {
    /// Fails when the builder is frozen.
    pub(crate) fn ensure_open(self, builder: &'static str) -> Result<()> {
        match self {
            BuilderState::Terminated => Err(BuilderError::AlreadyTerminated { builder }),
            _ => Ok(()),
        }
    }

    /// Fails unless the builder is open and initialized.
    pub(crate) fn ensure_initialized(
        self,
        builder: &'static str,
        operation: &'static str,
    ) -> Result<()> {
        match self {
            BuilderState::Uninitialized => {
                Err(BuilderError::NotInitialized { builder, operation })
            }
            BuilderState::Initialized => Ok(()),
            BuilderState::Terminated => Err(BuilderError::AlreadyTerminated { builder }),
        }
    }

    /// True once terminated.
    pub fn is_terminated(self) -> bool {
        self == BuilderState::Terminated
    }
}
