//! The shared sale-state record and the phase derived from it.

use api::constants::MAX_TOKEN_SUPPLY;

/// The one session-scoped record every part of the page reads. Owned by the
/// controller; the rendering layer only ever sees cloned snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleState {
    /// A wallet session exists on the required network.
    pub connected: bool,
    /// The restricted sale is active, per the contract flag.
    pub sale_started: bool,
    /// The restricted window has elapsed. Only meaningful once
    /// `sale_started` is true.
    pub sale_ended: bool,
    /// The connected identity is the contract administrator.
    pub is_admin: bool,
    /// Tokens issued so far, kept as a decimal string so the counter never
    /// loses precision.
    pub minted_count: String,
    /// A write call is in flight. Acts as a global action lock.
    pub pending: bool,
}

impl Default for SaleState {
    fn default() -> Self {
        Self {
            connected: false,
            sale_started: false,
            sale_ended: false,
            is_admin: false,
            minted_count: "0".to_string(),
            pending: false,
        }
    }
}

/// The single affordance valid right now, derived from the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumIs)]
pub enum SalePhase {
    /// No wallet session: offer the connect button.
    Disconnected,
    /// Sale not started and we are the administrator: offer "start sale".
    AdminAwaitingPresale,
    /// Sale not started, nothing to do but wait.
    AwaitingPresale,
    /// Restricted sale running: offer the presale mint.
    PresaleActive,
    /// Restricted window over: offer the public mint. Terminal.
    PublicSale,
}

impl SaleState {
    /// Phase derivation. Branch order matters: an administrator sees the
    /// start-sale affordance, not the connect one, and a closed presale
    /// wins over an active one.
    pub fn phase(&self) -> SalePhase {
        if !self.connected {
            SalePhase::Disconnected
        } else if self.is_admin && !self.sale_started {
            SalePhase::AdminAwaitingPresale
        } else if self.sale_started && self.sale_ended {
            SalePhase::PublicSale
        } else if self.sale_started {
            SalePhase::PresaleActive
        } else {
            SalePhase::AwaitingPresale
        }
    }

    /// The "n/20 have been minted" status line.
    pub fn minted_line(&self) -> String {
        format!(
            "{}/{} have been minted",
            self.minted_count, MAX_TOKEN_SUPPLY
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_disconnected() {
        let state = SaleState::default();
        assert!(state.phase().is_disconnected());
        assert_eq!(state.minted_count, "0");
        assert!(!state.pending);
    }

    #[test]
    fn admin_sees_start_sale_not_connect() {
        let state = SaleState {
            connected: true,
            is_admin: true,
            ..Default::default()
        };
        assert_eq!(state.phase(), SalePhase::AdminAwaitingPresale);
    }

    #[test]
    fn admin_affordance_disappears_once_sale_starts() {
        let state = SaleState {
            connected: true,
            is_admin: true,
            sale_started: true,
            ..Default::default()
        };
        assert_eq!(state.phase(), SalePhase::PresaleActive);
    }

    #[test]
    fn closed_window_means_public_sale() {
        let state = SaleState {
            connected: true,
            sale_started: true,
            sale_ended: true,
            ..Default::default()
        };
        assert_eq!(state.phase(), SalePhase::PublicSale);
    }

    #[test]
    fn sold_out_display_does_not_gate_the_phase() {
        // Supply-cap enforcement belongs to the contract; the page keeps
        // offering the mint affordance purely on the sale flags.
        let state = SaleState {
            connected: true,
            sale_started: true,
            sale_ended: true,
            minted_count: "20".to_string(),
            ..Default::default()
        };
        assert_eq!(state.minted_line(), "20/20 have been minted");
        assert_eq!(state.phase(), SalePhase::PublicSale);
    }
}
