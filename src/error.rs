//! Error types.
//!
//! There are specific types for errors (e.g. [`GroupConflict`]) and a single
//! [`Error`] enum able to represent them all, mirroring the layout of
//! hand-rolled error modules elsewhere in this codebase's lineage: no
//! `thiserror`, just `Display`/`std::error::Error` impls next to the data.

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};

/// Two groups were declared with incompatible owned/get/exclude sets.
///
/// Two groups are compatible iff one's owned set is a subset of the
/// other's *and* its get/exclude constraints nest within the other's. This
/// error is raised when neither direction of that check holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConflict {
    /// Component type name already owned by a conflicting group.
    pub owned_type: &'static str,
}

impl Display for GroupConflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "group conflict: `{}` is already owned by an incompatible group",
            self.owned_type
        )
    }
}

impl StdError for GroupConflict {}

/// The error type for this crate.
///
/// Most operations in [`crate::Registry`] use precondition violations
/// (debug assertions) rather than `Result` for caller mistakes, matching
/// §7 of the design: undefined-in-release is the chosen disposition there.
/// This enum covers only the operations that are meant to be *recoverable*
/// at the call site.
#[derive(Debug)]
pub enum Error {
    /// Raised by `Registry::group` when the nested-group compatibility
    /// check fails.
    GroupConflict(GroupConflict),
    /// Raised by `Registry::sort` when the target component is owned by an
    /// active group: a recoverable error rather than a panic, since sorting
    /// an arbitrary, unrelated component is an easy mistake to make once a
    /// few groups are registered.
    SortOwned {
        /// Name of the component type that is owned.
        component: &'static str,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::GroupConflict(e) => write!(f, "{}", e),
            Error::SortOwned { component } => {
                write!(f, "cannot sort `{}`: owned by an active group", component)
            }
        }
    }
}

impl StdError for Error {}

impl From<GroupConflict> for Error {
    fn from(e: GroupConflict) -> Self {
        Error::GroupConflict(e)
    }
}
