//! Command routing
//!
//! `CommandProcessor` maps each decoded `LedgerCommand` onto the matching
//! `InvoiceLedger` operation. It holds no state of its own; both processing
//! strategies share it.

use std::sync::Arc;

use crate::core::ledger::InvoiceLedger;
use crate::types::{LedgerCommand, LedgerError};

/// Routes ledger commands to ledger operations
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    ledger: Arc<InvoiceLedger>,
}

impl CommandProcessor {
    pub fn new(ledger: Arc<InvoiceLedger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<InvoiceLedger> {
        &self.ledger
    }

    /// Execute a single command
    ///
    /// Query results are discarded; callers inspect the ledger afterwards.
    pub fn process(&self, command: &LedgerCommand) -> Result<(), LedgerError> {
        let ledger = &self.ledger;
        match command.clone() {
            LedgerCommand::Register {
                caller,
                invoice,
                freelancer,
                employer,
                amount,
                asset,
                domain_id,
            } => ledger
                .register_invoice(caller, invoice, freelancer, employer, amount, asset, domain_id)
                .map(|_| ()),
            LedgerCommand::Accept { caller, invoice } => {
                ledger.accept_invoice(caller, invoice).map(|_| ())
            }
            LedgerCommand::Reject {
                caller,
                invoice,
                reason,
            } => ledger.reject_invoice(caller, invoice, reason).map(|_| ()),
            LedgerCommand::Cancel { caller, invoice } => {
                ledger.cancel_invoice(caller, invoice).map(|_| ())
            }
            LedgerCommand::Deposit {
                caller,
                invoice,
                attached,
            } => ledger.deposit_payment(caller, invoice, attached).map(|_| ()),
            LedgerCommand::Release { caller, invoice } => {
                ledger.release_payment(caller, invoice).map(|_| ())
            }
            LedgerCommand::Refund { caller, invoice } => {
                ledger.refund_payment(caller, invoice).map(|_| ())
            }
            LedgerCommand::MarkPaid { caller, invoice } => {
                ledger.mark_as_paid(caller, invoice).map(|_| ())
            }
            LedgerCommand::Pause { caller } => ledger.pause(caller),
            LedgerCommand::Unpause { caller } => ledger.unpause(caller),
            LedgerCommand::GrantRole {
                caller,
                role,
                account,
            } => ledger.grant_role(caller, role, account),
            LedgerCommand::RevokeRole {
                caller,
                role,
                account,
            } => ledger.revoke_role(caller, role, account),
            LedgerCommand::Mint {
                caller,
                account,
                asset,
                amount,
            } => ledger.mint(caller, account, asset, amount),
            LedgerCommand::Approve {
                caller,
                token,
                amount,
            } => ledger.approve(caller, token, amount),
        }
    }
}
