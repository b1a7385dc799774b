//! Account epochs.

use serde::{Deserialize, Serialize};

/// The upgrade epoch of an account chain.
///
/// Bumped by a designated epoch block; once an account leaves `Epoch0`, legacy
/// block kinds are no longer accepted on its chain. Pending entries record the
/// sender's epoch so receivers can be upgraded on pocketing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Epoch {
    #[default]
    Epoch0,
    Epoch1,
}

impl Epoch {
    /// The epoch after this one, if any.
    pub fn next(self) -> Option<Epoch> {
        match self {
            Epoch::Epoch0 => Some(Epoch::Epoch1),
            Epoch::Epoch1 => None,
        }
    }
}
