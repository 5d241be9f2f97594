//! CSV command format and ledger output serialization
//!
//! This module provides:
//! - `CsvCommand` - raw CSV row representation of a command script line
//! - `convert_csv_command` - validation and conversion to `LedgerCommand`
//! - `write_invoices_csv`, `write_balances_csv`, `write_events_jsonl` - output
//!
//! # Script Format
//!
//! ```text
//! op,caller,invoice,freelancer,employer,amount,asset,domain,reason,role,account
//! register,0x..b1,inv-1,0x..f1,0x..e1,100,native,1,,,
//! accept,0x..e1,inv-1,,,,,,,,
//! ```
//!
//! Columns an operation does not use may be left empty. Invoices are named
//! either by a 64-digit hex hash or by any other label, which is hashed.

use crate::core::BalanceEntry;
use crate::types::{
    AccountId, Asset, DomainId, Invoice, InvoiceHash, LedgerCommand, LedgerEvent, Operation, Role,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Raw CSV row of a command script
///
/// All fields except `op` are optional strings; which ones are required
/// depends on the operation and is checked by `convert_csv_command`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvCommand {
    pub op: String,
    pub caller: Option<String>,
    pub invoice: Option<String>,
    pub freelancer: Option<String>,
    pub employer: Option<String>,
    pub amount: Option<String>,
    pub asset: Option<String>,
    pub domain: Option<String>,
    pub reason: Option<String>,
    pub role: Option<String>,
    pub account: Option<String>,
}

/// Non-empty trimmed value of an optional column
fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn required<'a>(value: &'a Option<String>, column: &str, op: Operation) -> Result<&'a str, String> {
    present(value).ok_or_else(|| format!("Missing {} for {}", column, op))
}

fn parse_column<T>(value: &str, column: &str, op: Operation) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| format!("Invalid {} '{}' for {}: {}", column, value, op, e))
}

fn account(value: &Option<String>, column: &str, op: Operation) -> Result<AccountId, String> {
    parse_column(required(value, column, op)?, column, op)
}

fn amount(value: &Option<String>, op: Operation) -> Result<Decimal, String> {
    let raw = required(value, "amount", op)?;
    Decimal::from_str(raw).map_err(|_| format!("Invalid amount '{}' for {}", raw, op))
}

fn invoice(value: &Option<String>, op: Operation) -> Result<InvoiceHash, String> {
    required(value, "invoice", op).map(InvoiceHash::from_label)
}

/// Convert a CSV row into a ledger command
///
/// Checks that the columns the operation needs are present and well formed.
/// Business rules (positive amounts, roles, states) are left to the ledger.
pub fn convert_csv_command(csv_command: CsvCommand) -> Result<LedgerCommand, String> {
    let op = Operation::from_str(&csv_command.op)?;
    let caller = account(&csv_command.caller, "caller", op)?;

    let command = match op {
        Operation::Register => {
            let asset = match present(&csv_command.asset) {
                Some(raw) => parse_column::<Asset>(raw, "asset", op)?,
                None => Asset::Native,
            };
            let domain_id = match present(&csv_command.domain) {
                Some(raw) => parse_column::<DomainId>(raw, "domain", op)?,
                None => 0,
            };
            LedgerCommand::Register {
                caller,
                invoice: invoice(&csv_command.invoice, op)?,
                freelancer: account(&csv_command.freelancer, "freelancer", op)?,
                employer: account(&csv_command.employer, "employer", op)?,
                amount: amount(&csv_command.amount, op)?,
                asset,
                domain_id,
            }
        }
        Operation::Accept => LedgerCommand::Accept {
            caller,
            invoice: invoice(&csv_command.invoice, op)?,
        },
        Operation::Reject => LedgerCommand::Reject {
            caller,
            invoice: invoice(&csv_command.invoice, op)?,
            reason: present(&csv_command.reason).unwrap_or_default().to_string(),
        },
        Operation::Cancel => LedgerCommand::Cancel {
            caller,
            invoice: invoice(&csv_command.invoice, op)?,
        },
        Operation::Deposit => {
            let attached = match present(&csv_command.amount) {
                Some(_) => Some(amount(&csv_command.amount, op)?),
                None => None,
            };
            LedgerCommand::Deposit {
                caller,
                invoice: invoice(&csv_command.invoice, op)?,
                attached,
            }
        }
        Operation::Release => LedgerCommand::Release {
            caller,
            invoice: invoice(&csv_command.invoice, op)?,
        },
        Operation::Refund => LedgerCommand::Refund {
            caller,
            invoice: invoice(&csv_command.invoice, op)?,
        },
        Operation::MarkPaid => LedgerCommand::MarkPaid {
            caller,
            invoice: invoice(&csv_command.invoice, op)?,
        },
        Operation::Pause => LedgerCommand::Pause { caller },
        Operation::Unpause => LedgerCommand::Unpause { caller },
        Operation::GrantRole | Operation::RevokeRole => {
            let role: Role = parse_column(required(&csv_command.role, "role", op)?, "role", op)?;
            let target = account(&csv_command.account, "account", op)?;
            if op == Operation::GrantRole {
                LedgerCommand::GrantRole {
                    caller,
                    role,
                    account: target,
                }
            } else {
                LedgerCommand::RevokeRole {
                    caller,
                    role,
                    account: target,
                }
            }
        }
        Operation::Mint => LedgerCommand::Mint {
            caller,
            account: account(&csv_command.account, "account", op)?,
            asset: parse_column(required(&csv_command.asset, "asset", op)?, "asset", op)?,
            amount: amount(&csv_command.amount, op)?,
        },
        Operation::Approve => {
            let raw = required(&csv_command.asset, "asset", op)?;
            let token = match parse_column::<Asset>(raw, "asset", op)? {
                Asset::Token(token) => token,
                Asset::Native => {
                    return Err(format!("Approve requires a token asset, got '{}'", raw))
                }
            };
            LedgerCommand::Approve {
                caller,
                token,
                amount: amount(&csv_command.amount, op)?,
            }
        }
    };

    Ok(command)
}

/// Write the invoice table as CSV, sorted by invoice hash
///
/// Output columns: `invoice,freelancer,employer,amount,asset,domain,state,escrow,rejection_reason`
pub fn write_invoices_csv(invoices: &[Invoice], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "invoice",
            "freelancer",
            "employer",
            "amount",
            "asset",
            "domain",
            "state",
            "escrow",
            "rejection_reason",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_invoices = invoices.to_vec();
    sorted_invoices.sort_by_key(|invoice| invoice.hash);

    for invoice in sorted_invoices {
        writer
            .write_record(&[
                invoice.hash.to_string(),
                invoice.freelancer.to_string(),
                invoice.employer.to_string(),
                invoice.amount.normalize().to_string(),
                invoice.asset.to_string(),
                invoice.domain_id.to_string(),
                invoice.state.to_string(),
                invoice.escrow_balance.normalize().to_string(),
                invoice.rejection_reason.clone().unwrap_or_default(),
            ])
            .map_err(|e| format!("Failed to write invoice record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write wallet balances as CSV
///
/// Output columns: `account,asset,balance`
pub fn write_balances_csv(balances: &[BalanceEntry], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "asset", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for entry in balances {
        writer
            .write_record(&[
                entry.account.to_string(),
                entry.asset.to_string(),
                entry.balance.normalize().to_string(),
            ])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write the event journal as JSON lines, one event per line
pub fn write_events_jsonl(events: &[LedgerEvent], output: &mut dyn Write) -> Result<(), String> {
    for event in events {
        let line = serde_json::to_string(event)
            .map_err(|e| format!("Failed to serialize event {}: {}", event.sequence, e))?;
        writeln!(output, "{}", line).map_err(|e| format!("Failed to write event: {}", e))?;
    }

    output
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventKind, InvoiceState};
    use chrono::Utc;
    use rstest::rstest;

    const BACKEND: &str = "0x00000000000000000000000000000000000000b1";
    const FREELANCER: &str = "0x00000000000000000000000000000000000000f1";
    const EMPLOYER: &str = "0x00000000000000000000000000000000000000e1";
    const TOKEN: &str = "0x00000000000000000000000000000000000000c1";

    fn row(op: &str, caller: &str) -> CsvCommand {
        CsvCommand {
            op: op.to_string(),
            caller: Some(caller.to_string()),
            ..CsvCommand::default()
        }
    }

    fn register_row() -> CsvCommand {
        CsvCommand {
            invoice: Some("inv-1".to_string()),
            freelancer: Some(FREELANCER.to_string()),
            employer: Some(EMPLOYER.to_string()),
            amount: Some("12.50".to_string()),
            asset: Some(TOKEN.to_string()),
            domain: Some("3".to_string()),
            ..row("register", BACKEND)
        }
    }

    #[test]
    fn test_convert_register() {
        let command = convert_csv_command(register_row()).unwrap();

        assert_eq!(
            command,
            LedgerCommand::Register {
                caller: BACKEND.parse().unwrap(),
                invoice: InvoiceHash::digest("inv-1"),
                freelancer: FREELANCER.parse().unwrap(),
                employer: EMPLOYER.parse().unwrap(),
                amount: Decimal::new(1250, 2),
                asset: Asset::Token(TOKEN.parse().unwrap()),
                domain_id: 3,
            }
        );
    }

    #[test]
    fn test_convert_register_defaults_asset_and_domain() {
        let csv_command = CsvCommand {
            asset: Some(String::new()),
            domain: None,
            ..register_row()
        };

        match convert_csv_command(csv_command).unwrap() {
            LedgerCommand::Register {
                asset, domain_id, ..
            } => {
                assert_eq!(asset, Asset::Native);
                assert_eq!(domain_id, 0);
            }
            other => panic!("Expected register, got {:?}", other),
        }
    }

    #[rstest]
    #[case::accept("accept", Operation::Accept)]
    #[case::cancel("cancel", Operation::Cancel)]
    #[case::release("release", Operation::Release)]
    #[case::refund("REFUND", Operation::Refund)]
    #[case::mark_paid("mark_paid", Operation::MarkPaid)]
    #[case::reject("reject", Operation::Reject)]
    fn test_convert_invoice_operations(#[case] op: &str, #[case] expected: Operation) {
        let csv_command = CsvCommand {
            invoice: Some("inv-1".to_string()),
            ..row(op, EMPLOYER)
        };

        let command = convert_csv_command(csv_command).unwrap();

        assert_eq!(command.operation(), expected);
        assert_eq!(command.invoice(), Some(InvoiceHash::digest("inv-1")));
    }

    #[rstest]
    #[case::with_value(Some("5"), Some(Decimal::new(5, 0)))]
    #[case::empty(Some(""), None)]
    #[case::absent(None, None)]
    fn test_convert_deposit_attached_value(
        #[case] raw: Option<&str>,
        #[case] expected: Option<Decimal>,
    ) {
        let csv_command = CsvCommand {
            invoice: Some("inv-1".to_string()),
            amount: raw.map(str::to_string),
            ..row("deposit", EMPLOYER)
        };

        match convert_csv_command(csv_command).unwrap() {
            LedgerCommand::Deposit { attached, .. } => assert_eq!(attached, expected),
            other => panic!("Expected deposit, got {:?}", other),
        }
    }

    #[test]
    fn test_convert_grant_role() {
        let csv_command = CsvCommand {
            role: Some("backend".to_string()),
            account: Some(FREELANCER.to_string()),
            ..row("grant", BACKEND)
        };

        let command = convert_csv_command(csv_command).unwrap();

        assert_eq!(
            command,
            LedgerCommand::GrantRole {
                caller: BACKEND.parse().unwrap(),
                role: Role::BackendService,
                account: FREELANCER.parse().unwrap(),
            }
        );
        assert_eq!(command.invoice(), None);
    }

    #[test]
    fn test_convert_approve_requires_token() {
        let csv_command = CsvCommand {
            asset: Some("native".to_string()),
            amount: Some("1".to_string()),
            ..row("approve", EMPLOYER)
        };

        let error = convert_csv_command(csv_command).unwrap_err();

        assert!(error.contains("token"));
    }

    #[rstest]
    #[case::unknown_op(CsvCommand { op: "transfer".to_string(), ..CsvCommand::default() }, "Invalid operation")]
    #[case::missing_caller(CsvCommand { op: "pause".to_string(), ..CsvCommand::default() }, "Missing caller")]
    #[case::bad_caller(row("pause", "0x12"), "Invalid caller")]
    #[case::missing_invoice(row("accept", EMPLOYER), "Missing invoice")]
    #[case::bad_amount(CsvCommand { amount: Some("abc".to_string()), ..register_row() }, "Invalid amount 'abc'")]
    #[case::missing_role(CsvCommand { account: Some(FREELANCER.to_string()), ..row("grant", BACKEND) }, "Missing role")]
    fn test_convert_errors(#[case] csv_command: CsvCommand, #[case] expected: &str) {
        let error = convert_csv_command(csv_command).unwrap_err();

        assert!(
            error.contains(expected),
            "expected '{}' in '{}'",
            expected,
            error
        );
    }

    #[test]
    fn test_write_invoices_csv_sorted_and_normalized() {
        let employer: AccountId = EMPLOYER.parse().unwrap();
        let freelancer: AccountId = FREELANCER.parse().unwrap();
        let mut rejected = Invoice::new(
            InvoiceHash::digest("b"),
            freelancer,
            employer,
            Decimal::new(1000, 2),
            Asset::Native,
            2,
            Utc::now(),
        );
        rejected.state = InvoiceState::Rejected;
        rejected.rejection_reason = Some("late".to_string());
        let pending = Invoice::new(
            InvoiceHash::digest("a"),
            freelancer,
            employer,
            Decimal::ONE,
            Asset::Native,
            1,
            Utc::now(),
        );

        let mut output = Vec::new();
        write_invoices_csv(&[rejected.clone(), pending.clone()], &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "invoice,freelancer,employer,amount,asset,domain,state,escrow,rejection_reason"
        );
        let (first, second) = if pending.hash < rejected.hash {
            (&lines[1], &lines[2])
        } else {
            (&lines[2], &lines[1])
        };
        assert!(first.starts_with(&pending.hash.to_string()));
        assert!(first.ends_with(",1,native,1,pending,0,"));
        assert!(second.ends_with(",10,native,2,rejected,0,late"));
    }

    #[test]
    fn test_write_balances_csv() {
        let entries = vec![BalanceEntry {
            account: EMPLOYER.parse().unwrap(),
            asset: Asset::Native,
            balance: Decimal::new(950, 2),
        }];

        let mut output = Vec::new();
        write_balances_csv(&entries, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            format!("account,asset,balance\n{},native,9.5\n", EMPLOYER)
        );
    }

    #[test]
    fn test_write_events_jsonl_one_line_per_event() {
        let events = vec![
            LedgerEvent {
                sequence: 1,
                timestamp: Utc::now(),
                kind: EventKind::Paused {
                    account: EMPLOYER.parse().unwrap(),
                },
            },
            LedgerEvent {
                sequence: 2,
                timestamp: Utc::now(),
                kind: EventKind::Unpaused {
                    account: EMPLOYER.parse().unwrap(),
                },
            },
        ];

        let mut output = Vec::new();
        write_events_jsonl(&events, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();

        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "paused");
        assert_eq!(lines[1]["type"], "unpaused");
        assert_eq!(lines[1]["sequence"], 2);
    }
}
