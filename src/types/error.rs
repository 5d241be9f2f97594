//! Error types for the invoice escrow ledger
//!
//! Every ledger operation returns `Result<_, LedgerError>`. A returned error
//! guarantees that the operation left no trace: no record change, no balance
//! movement, no event.
//!
//! # Error Categories
//!
//! - **Validation Errors**: duplicate hashes, bad amounts, zero or clashing parties
//! - **Authorization Errors**: caller lacks the role or is not the right party
//! - **Lifecycle Errors**: operation not allowed from the record's current state
//! - **Funding Errors**: missing native value, balance or token allowance
//! - **Consistency Errors**: escrow shortfall, arithmetic overflow

use super::account::{AccountId, Asset};
use super::command::Operation;
use super::invoice::{InvoiceHash, InvoiceState};
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// An invoice with this hash is already registered
    #[error("Invoice {invoice} already exists")]
    InvoiceAlreadyExists { invoice: InvoiceHash },

    /// Amount is non-positive, or attached value does not match
    #[error("Invalid amount {amount} for {operation}")]
    InvalidAmount {
        operation: Operation,
        amount: Decimal,
    },

    /// A required party is the zero account, or the parties clash
    #[error("Invalid {field} address {account} for {operation}")]
    InvalidAddress {
        operation: Operation,
        field: &'static str,
        account: AccountId,
    },

    /// Caller holds neither the required role nor the required party position
    #[error("Account {caller} is not authorized to {operation}")]
    UnauthorizedAccess {
        caller: AccountId,
        operation: Operation,
    },

    /// The record's current state does not allow the operation
    #[error("Cannot {operation} invoice {invoice} in state {state}")]
    InvalidStateTransition {
        invoice: InvoiceHash,
        state: InvoiceState,
        operation: Operation,
    },

    /// Attached value or balance does not cover the transfer
    #[error("Insufficient {asset} funds for {account}: available {available}, required {required}")]
    InsufficientFunds {
        account: AccountId,
        asset: Asset,
        available: Decimal,
        required: Decimal,
    },

    /// Token allowance granted to the escrow does not cover the transfer
    #[error("Insufficient allowance of {token} from {owner}: allowed {allowance}, required {required}")]
    InsufficientAllowance {
        owner: AccountId,
        token: AccountId,
        allowance: Decimal,
        required: Decimal,
    },

    /// Mutating operations are suspended
    #[error("System is paused: {operation} rejected")]
    SystemPaused { operation: Operation },

    /// No invoice with this hash
    #[error("Invoice {invoice} not found")]
    NotFound { invoice: InvoiceHash },

    /// Escrow holds less than it owes; ledger and adapter disagree
    #[error("Escrow shortfall for {asset}: held {held}, requested {requested}")]
    EscrowShortfall {
        asset: Asset,
        held: Decimal,
        requested: Decimal,
    },

    /// Checked arithmetic on a balance overflowed
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: &'static str },
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvoiceAlreadyExists error
    pub fn already_exists(invoice: InvoiceHash) -> Self {
        LedgerError::InvoiceAlreadyExists { invoice }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(operation: Operation, amount: Decimal) -> Self {
        LedgerError::InvalidAmount { operation, amount }
    }

    /// Create an InvalidAddress error
    pub fn invalid_address(operation: Operation, field: &'static str, account: AccountId) -> Self {
        LedgerError::InvalidAddress {
            operation,
            field,
            account,
        }
    }

    /// Create an UnauthorizedAccess error
    pub fn unauthorized(caller: AccountId, operation: Operation) -> Self {
        LedgerError::UnauthorizedAccess { caller, operation }
    }

    /// Create an InvalidStateTransition error
    pub fn invalid_transition(
        invoice: InvoiceHash,
        state: InvoiceState,
        operation: Operation,
    ) -> Self {
        LedgerError::InvalidStateTransition {
            invoice,
            state,
            operation,
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(
        account: AccountId,
        asset: Asset,
        available: Decimal,
        required: Decimal,
    ) -> Self {
        LedgerError::InsufficientFunds {
            account,
            asset,
            available,
            required,
        }
    }

    /// Create an InsufficientAllowance error
    pub fn insufficient_allowance(
        owner: AccountId,
        token: AccountId,
        allowance: Decimal,
        required: Decimal,
    ) -> Self {
        LedgerError::InsufficientAllowance {
            owner,
            token,
            allowance,
            required,
        }
    }

    /// Create a SystemPaused error
    pub fn paused(operation: Operation) -> Self {
        LedgerError::SystemPaused { operation }
    }

    /// Create a NotFound error
    pub fn not_found(invoice: InvoiceHash) -> Self {
        LedgerError::NotFound { invoice }
    }

    /// Create an EscrowShortfall error
    pub fn escrow_shortfall(asset: Asset, held: Decimal, requested: Decimal) -> Self {
        LedgerError::EscrowShortfall {
            asset,
            held,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &'static str) -> Self {
        LedgerError::ArithmeticOverflow { operation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn account(n: u64) -> AccountId {
        AccountId::from_low_u64(n)
    }

    fn invoice() -> InvoiceHash {
        InvoiceHash::new([0xab; 32])
    }

    #[rstest]
    #[case::already_exists(
        LedgerError::already_exists(invoice()),
        "Invoice 0xabababababababababababababababababababababababababababababababab already exists"
    )]
    #[case::invalid_amount(
        LedgerError::invalid_amount(Operation::Register, Decimal::ZERO),
        "Invalid amount 0 for register"
    )]
    #[case::invalid_address(
        LedgerError::invalid_address(Operation::Register, "employer", AccountId::ZERO),
        "Invalid employer address 0x0000000000000000000000000000000000000000 for register"
    )]
    #[case::unauthorized(
        LedgerError::unauthorized(account(0xe1), Operation::Cancel),
        "Account 0x00000000000000000000000000000000000000e1 is not authorized to cancel"
    )]
    #[case::paused(
        LedgerError::paused(Operation::Register),
        "System is paused: register rejected"
    )]
    #[case::insufficient_funds(
        LedgerError::insufficient_funds(account(0xe1), Asset::Native, Decimal::new(5, 1), Decimal::ONE),
        "Insufficient native funds for 0x00000000000000000000000000000000000000e1: available 0.5, required 1"
    )]
    #[case::shortfall(
        LedgerError::escrow_shortfall(Asset::Native, Decimal::ZERO, Decimal::ONE),
        "Escrow shortfall for native: held 0, requested 1"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_invalid_transition_display() {
        let error =
            LedgerError::invalid_transition(invoice(), InvoiceState::Rejected, Operation::Deposit);
        assert!(error
            .to_string()
            .starts_with("Cannot deposit invoice 0xabab"));
        assert!(error.to_string().ends_with("in state rejected"));
    }

    #[rstest]
    #[case::not_found(
        LedgerError::not_found(invoice()),
        LedgerError::NotFound { invoice: invoice() }
    )]
    #[case::allowance(
        LedgerError::insufficient_allowance(account(0xe1), account(0xc1), Decimal::ZERO, Decimal::ONE),
        LedgerError::InsufficientAllowance {
            owner: account(0xe1),
            token: account(0xc1),
            allowance: Decimal::ZERO,
            required: Decimal::ONE,
        }
    )]
    #[case::overflow(
        LedgerError::arithmetic_overflow("pull_in"),
        LedgerError::ArithmeticOverflow { operation: "pull_in" }
    )]
    fn test_helper_functions(#[case] result: LedgerError, #[case] expected: LedgerError) {
        assert_eq!(result, expected);
    }
}
