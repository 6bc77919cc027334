//! View tracking - rendered representations of a party

use serde::{Deserialize, Serialize};

use super::ViewId;

/// Which rendering of a party a view is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    /// The message posted when the party was created
    Canonical,
    /// A duplicate posted by a listing refresh
    Listing,
}

/// One tracked view of a party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRef {
    pub id: ViewId,
    pub kind: ViewKind,
}
