//! Device load-state machine.

use serde::{Deserialize, Serialize};

/// The three-state device lifecycle gating `/fp/*` mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

impl LoadState {
    /// Whether routing-table mutations (`/fp/g`, `/fp/r`, `/fp/p`) are
    /// accepted in this state.
    pub fn accepts_table_mutation(self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Factory reset codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetCode {
    /// Full reset including the individual address.
    Full,
    /// Reset the individual address only.
    IndividualAddressOnly,
    /// Reset configuration but keep individual address and credentials.
    ConfigKeepCredentials,
}

impl TryFrom<u8> for ResetCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(ResetCode::Full),
            3 => Ok(ResetCode::IndividualAddressOnly),
            7 => Ok(ResetCode::ConfigKeepCredentials),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_loading_accepts_mutation() {
        assert!(!LoadState::Unloaded.accepts_table_mutation());
        assert!(LoadState::Loading.accepts_table_mutation());
        assert!(!LoadState::Loaded.accepts_table_mutation());
    }

    #[test]
    fn reset_codes_parse() {
        assert_eq!(ResetCode::try_from(2), Ok(ResetCode::Full));
        assert_eq!(ResetCode::try_from(3), Ok(ResetCode::IndividualAddressOnly));
        assert_eq!(ResetCode::try_from(7), Ok(ResetCode::ConfigKeepCredentials));
        assert!(ResetCode::try_from(9).is_err());
    }
}
