use std::fmt;

use serde::{Deserialize, Serialize};

/// Policy controlling whether and how a reference triggers loading.
///
/// The discriminants are the persisted wire values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u32)]
pub enum LoadBehavior {
    /// Blocking load: resolution returns only once the asset is ready or failed.
    PreLoad = 0,
    /// Enqueue an asynchronous load and return immediately.
    QueueLoad = 1,
    /// Never load automatically.
    NoLoad = 2,
    /// Let the asset handler decide.
    Default = 3,
}

impl LoadBehavior {
    /// Behavior used when neither the reference nor the handler decide.
    pub const FALLBACK: Self = Self::QueueLoad;

    /// Converts a persisted wire value.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::PreLoad),
            1 => Some(Self::QueueLoad),
            2 => Some(Self::NoLoad),
            3 => Some(Self::Default),
            _ => None,
        }
    }

    /// Returns the persisted wire value.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Computes the effective behavior of a reference.
    ///
    /// A value that was never persisted, or persisted as [`LoadBehavior::Default`],
    /// yields to the handler default. An explicit persisted value always wins.
    pub fn resolve(persisted: Option<Self>, handler_default: Self) -> Self {
        match persisted {
            None | Some(Self::Default) => match handler_default {
                Self::Default => Self::FALLBACK,
                behavior => behavior,
            },
            Some(behavior) => behavior,
        }
    }

    /// Only [`LoadBehavior::PreLoad`] makes the caller wait for completion.
    pub fn is_blocking(self) -> bool {
        self == Self::PreLoad
    }
}

impl Default for LoadBehavior {
    fn default() -> Self {
        Self::Default
    }
}

impl fmt::Display for LoadBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PreLoad => "PreLoad",
            Self::QueueLoad => "QueueLoad",
            Self::NoLoad => "NoLoad",
            Self::Default => "Default",
        };
        f.write_str(name)
    }
}
