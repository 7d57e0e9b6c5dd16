//! Organizational unit hierarchy codes.
//!
//! # Responsibility
//! - Represent the three-level `(branch, sub_branch, local)` hierarchy of a
//!   court or prosecutor's office.
//! - Derive the hierarchy level and branch prefixes used to separate careers.
//!
//! # Invariants
//! - [`NOT_APPLICABLE`] marks a level the unit does not sit under.
//! - A composite code always has exactly three dot-separated parts.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Sentinel code for "not applicable at this level".
pub const NOT_APPLICABLE: &str = "-88";

/// Hierarchy depth used when binning units into career groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HierarchyDepth {
    /// Appellate area.
    Branch,
    /// Tribunal.
    SubBranch,
    /// Local court.
    Local,
}

impl HierarchyDepth {
    /// Depths from coarsest to finest.
    pub const ALL: [Self; 3] = [Self::Branch, Self::SubBranch, Self::Local];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::SubBranch => "sub_branch",
            Self::Local => "local",
        }
    }
}

/// Position of one unit in the judicial hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitCode {
    pub branch: String,
    pub sub_branch: String,
    pub local: String,
}

impl UnitCode {
    pub fn new(
        branch: impl Into<String>,
        sub_branch: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            branch: branch.into(),
            sub_branch: sub_branch.into(),
            local: local.into(),
        }
    }

    /// Parses a composite code such as `CA4.TB12.J44` or `CA8.TB27.-88`.
    pub fn parse(composite: &str) -> Option<Self> {
        let mut parts = composite.trim().split('.');
        let branch = parts.next()?.trim();
        let sub_branch = parts.next()?.trim();
        let local = parts.next()?.trim();
        if parts.next().is_some() || branch.is_empty() || sub_branch.is_empty() || local.is_empty()
        {
            return None;
        }
        Some(Self::new(branch, sub_branch, local))
    }

    /// Hierarchy level: 1 = local court, 2 = tribunal, 3 = appellate court,
    /// 4 = national body.
    pub fn level(&self) -> u8 {
        if self.local != NOT_APPLICABLE {
            1
        } else if self.sub_branch != NOT_APPLICABLE {
            2
        } else if self.branch != NOT_APPLICABLE {
            3
        } else {
            4
        }
    }

    /// Code prefix down to `depth`, e.g. `CA4.TB12` for [`HierarchyDepth::SubBranch`].
    pub fn prefix(&self, depth: HierarchyDepth) -> String {
        match depth {
            HierarchyDepth::Branch => self.branch.clone(),
            HierarchyDepth::SubBranch => format!("{}.{}", self.branch, self.sub_branch),
            HierarchyDepth::Local => self.to_string(),
        }
    }
}

impl Display for UnitCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.branch, self.sub_branch, self.local)
    }
}
