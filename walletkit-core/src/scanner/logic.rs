use std::collections::HashMap;

use log::debug;

use crate::{
    backend::{AddressRequest, AddressResult, DeviceConnection},
    config::DerivationModeConfig,
    error::Result,
};

/// What to do with an account just fetched while scanning a derivation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanStep {
    /// Report the account and go on.
    Emit,
    /// Go on without reporting it.
    Skip,
    /// Abandon the mode, reporting the account first if `emit`.
    Stop { emit: bool },
}

/// Tolerance bookkeeping: `empty_count` counts consecutive empty accounts
/// and is reset by a used one. Modes showing new accounts report every empty
/// account they fetch.
pub(crate) fn next_step(is_empty: bool, empty_count: &mut u32, mode: &DerivationModeConfig) -> ScanStep {
    if !is_empty {
        *empty_count = 0;
        return ScanStep::Emit;
    }
    if *empty_count >= mode.empty_tolerance {
        return ScanStep::Stop {
            emit: mode.show_new_account,
        };
    }
    *empty_count += 1;
    if mode.show_new_account {
        ScanStep::Emit
    } else {
        ScanStep::Skip
    }
}

/// Addresses already derived during a scan session.
#[derive(Debug, Default)]
pub(crate) struct AddressCache {
    derived: HashMap<AddressRequest, AddressResult>,
}

impl AddressCache {
    pub(crate) async fn get_address(
        &mut self,
        connection: &mut dyn DeviceConnection,
        request: AddressRequest,
    ) -> Result<AddressResult> {
        if let Some(result) = self.derived.get(&request) {
            return Ok(result.clone());
        }
        debug!("deriving {} ({})", request.path, request.derivation_mode);
        let result = connection.get_address(&request).await?;
        self.derived.insert(request, result.clone());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(empty_tolerance: u32, show_new_account: bool) -> DerivationModeConfig {
        DerivationModeConfig {
            name: "solanaSub".into(),
            scheme: "44'/501'/<account>'".into(),
            iterable: true,
            starts_at: 0,
            empty_tolerance,
            show_new_account,
            skip_indices: Vec::new(),
            seed_identifier_scheme: None,
        }
    }

    #[test]
    fn test_tolerance_counts_consecutive_empty_accounts() {
        let mode = mode(1, false);
        let mut empty = 0;

        assert_eq!(next_step(false, &mut empty, &mode), ScanStep::Emit);
        assert_eq!(next_step(true, &mut empty, &mode), ScanStep::Skip);
        assert_eq!(next_step(false, &mut empty, &mode), ScanStep::Emit);
        assert_eq!(next_step(true, &mut empty, &mode), ScanStep::Skip);
        assert_eq!(next_step(true, &mut empty, &mode), ScanStep::Stop { emit: false });
    }

    #[test]
    fn test_show_new_account_reports_empty_accounts_within_tolerance() {
        let mode = mode(1, true);
        let mut empty = 0;

        assert_eq!(next_step(false, &mut empty, &mode), ScanStep::Emit);
        assert_eq!(next_step(true, &mut empty, &mode), ScanStep::Emit);
        assert_eq!(empty, 1);
        assert_eq!(next_step(true, &mut empty, &mode), ScanStep::Stop { emit: true });
    }

    #[test]
    fn test_zero_tolerance_stops_on_first_empty() {
        let mode = mode(0, true);
        let mut empty = 0;
        assert_eq!(next_step(true, &mut empty, &mode), ScanStep::Stop { emit: true });
    }
}
