use std::fmt;
use std::ops::BitOr;

/// Lifecycle operation that may be propagated along associations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeType {
    Persist,
    Merge,
    Remove,
    Refresh,
    Detach,
}

impl CascadeType {
    fn bit(self) -> u8 {
        match self {
            CascadeType::Persist => 1,
            CascadeType::Merge => 1 << 1,
            CascadeType::Remove => 1 << 2,
            CascadeType::Refresh => 1 << 3,
            CascadeType::Detach => 1 << 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CascadeType::Persist => "PERSIST",
            CascadeType::Merge => "MERGE",
            CascadeType::Remove => "REMOVE",
            CascadeType::Refresh => "REFRESH",
            CascadeType::Detach => "DETACH",
        }
    }
}

impl fmt::Display for CascadeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of cascade types a relation propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CascadeTypes(u8);

impl CascadeTypes {
    pub const NONE: CascadeTypes = CascadeTypes(0);
    pub const ALL: CascadeTypes = CascadeTypes(0b1_1111);

    pub fn contains(self, cascade_type: CascadeType) -> bool {
        self.0 & cascade_type.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<CascadeType> for CascadeTypes {
    fn from(cascade_type: CascadeType) -> Self {
        CascadeTypes(cascade_type.bit())
    }
}

impl BitOr for CascadeTypes {
    type Output = CascadeTypes;

    fn bitor(self, rhs: CascadeTypes) -> CascadeTypes {
        CascadeTypes(self.0 | rhs.0)
    }
}

impl BitOr for CascadeType {
    type Output = CascadeTypes;

    fn bitor(self, rhs: CascadeType) -> CascadeTypes {
        CascadeTypes::from(self) | CascadeTypes::from(rhs)
    }
}

impl BitOr<CascadeType> for CascadeTypes {
    type Output = CascadeTypes;

    fn bitor(self, rhs: CascadeType) -> CascadeTypes {
        self | CascadeTypes::from(rhs)
    }
}
