//! Update flags and reconciliation actions.

use crate::error::{CoreError, CoreResult};

bitflags::bitflags! {
    /// Which fields of a dictionary entry a live update carries.
    ///
    /// Computed fresh for every mutation and never persisted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UpdateFlags: u8 {
        /// The display value changed.
        const VALUE = 1 << 0;
        /// The ordering changed.
        const SEQ = 1 << 1;
        /// The enabled/disabled status changed.
        const STATUS = 1 << 2;
        /// The alias key was set or cleared.
        const MAPPING = 1 << 3;
    }
}

impl UpdateFlags {
    /// Flags that merge field values into a node.
    pub const FIELDS: Self = Self::VALUE.union(Self::SEQ).union(Self::STATUS);

    /// Builds flags from a raw byte, dropping unknown bits.
    #[must_use]
    pub const fn from_raw(bits: u8) -> Self {
        Self::from_bits_truncate(bits)
    }

    /// Returns only the field-merge flags.
    #[must_use]
    pub fn fields(self) -> Self {
        self & Self::FIELDS
    }
}

bitflags::bitflags! {
    /// What a reconciliation pass rebuilds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Action: u8 {
        /// Run the migration diff and rebuild the mapping table.
        const MAPPING = 1;
        /// Rebuild the enum tree.
        const ENUM = 2;
    }
}

impl Action {
    /// Parses a configured action value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAction`] for zero or for unknown bits.
    pub fn parse(bits: u8) -> CoreResult<Self> {
        match Self::from_bits(bits) {
            Some(action) if !action.is_empty() => Ok(action),
            _ => Err(CoreError::InvalidAction { bits }),
        }
    }
}
