//! Core traits for moving value in and out of escrow
//!
//! The ledger decides *whether* value moves; an `AssetTransfer`
//! implementation decides *how*. This keeps the state machine independent of
//! the settlement mechanism (in-memory bank, chain client, payment rail).

use crate::types::{AccountId, Asset, LedgerError};
use rust_decimal::Decimal;

/// Moves native currency or fungible tokens between parties and the escrow
///
/// Implementations must be all-or-nothing: an `Err` means no balance,
/// allowance or escrow holding changed.
pub trait AssetTransfer: Send + Sync {
    /// Collect `amount` of `asset` from `source` into escrow
    ///
    /// For native currency `attached` is the value sent with the call and must
    /// equal `amount`. For tokens the escrow pulls `amount` using an allowance
    /// previously granted by `source`, and `attached` must be empty.
    ///
    /// # Errors
    ///
    /// - `InsufficientFunds` if the attached value or the source balance is short
    /// - `InsufficientAllowance` if the token allowance is short
    /// - `InvalidAmount` if more native value than owed was attached, or native
    ///   value accompanies a token payment
    fn pull_in(
        &self,
        asset: Asset,
        source: AccountId,
        amount: Decimal,
        attached: Option<Decimal>,
    ) -> Result<(), LedgerError>;

    /// Pay `amount` of `asset` out of escrow to `destination`
    ///
    /// # Errors
    ///
    /// - `EscrowShortfall` if the escrow holds less than `amount`; this means
    ///   ledger and adapter disagree and should never happen
    fn push_out(
        &self,
        asset: Asset,
        destination: AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError>;

    /// Amount of `asset` currently held in escrow
    fn escrow_balance(&self, asset: Asset) -> Decimal;
}
