//! Batch processing with party-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which runs a batch of
//! ledger commands concurrently while producing the same invoice records and
//! balances as running the batch in order.
//!
//! # Design
//!
//! A batch is cut into segments at every command that names no invoice
//! (pause, unpause, role changes, mint, approve). Such a command is a
//! barrier: it runs alone, after everything before it and before anything
//! after it, because it can change the outcome of any invoice operation.
//!
//! Within a segment, invoices that share a party are grouped together and
//! each group runs in its own task, in script order. Invoices only ever move
//! funds between their own freelancer, employer and the escrow, so groups
//! with no party in common cannot observe each other. The same account may be
//! the employer of one invoice and the freelancer of another; both invoices
//! then land in one group.
//!
//! ```text
//! [r1(f1,e1) r2(f2,e1) r3(f3,e3) | pause | a3 d1]
//!   ├── segment 1: {r1 r2} ∥ {r3}
//!   ├── barrier:   pause
//!   └── segment 2: {a3} ∥ {d1}
//! ```
//!
//! Parties are looked up when a segment starts, so invoices registered by an
//! earlier segment are grouped by their recorded parties.
//!
//! Results come back in script order regardless of task scheduling.

use std::collections::HashMap;

use super::processor::CommandProcessor;
use crate::types::{AccountId, InvoiceHash, LedgerCommand, LedgerError};

/// Result of processing a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Position of the command in the submitted batch
    pub index: usize,

    /// The command that was processed
    pub command: LedgerCommand,

    /// The result of processing (success or error)
    pub result: Result<(), LedgerError>,
}

/// One stretch of a batch: either a barrier or invoice commands
#[derive(Debug)]
enum Segment {
    Barrier(usize, LedgerCommand),
    Invoices(Vec<(usize, LedgerCommand)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
    Invoice(InvoiceHash),
    Account(AccountId),
}

/// Disjoint sets of invoices and accounts
#[derive(Debug, Default)]
struct Components {
    parent: HashMap<Node, Node>,
}

impl Components {
    fn find(&mut self, node: Node) -> Node {
        let mut root = node;
        while let Some(&parent) = self.parent.get(&root) {
            if parent == root {
                break;
            }
            root = parent;
        }

        // Path compression
        let mut current = node;
        while current != root {
            let next = self.parent.get(&current).copied().unwrap_or(root);
            self.parent.insert(current, root);
            current = next;
        }

        root
    }

    fn union(&mut self, a: Node, b: Node) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent.insert(root_a, root_b);
        }
    }
}

/// Batch processor with party-based partitioning
///
/// Cloneable and cheap to share across tasks; every clone drives the same
/// ledger.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    processor: CommandProcessor,
}

impl BatchProcessor {
    pub fn new(processor: CommandProcessor) -> Self {
        Self { processor }
    }

    /// Group invoice commands so that no two groups share a party
    ///
    /// Parties come from the ledger for known invoices and from the command
    /// itself for registrations. Groups keep script order internally and are
    /// returned in order of their first command.
    pub fn partition_by_parties(
        &self,
        commands: Vec<(usize, LedgerCommand)>,
    ) -> Vec<Vec<(usize, LedgerCommand)>> {
        let ledger = self.processor.ledger();
        let mut components = Components::default();

        for (_, command) in &commands {
            let Some(invoice) = command.invoice() else {
                continue;
            };
            let node = Node::Invoice(invoice);

            if let LedgerCommand::Register {
                freelancer,
                employer,
                ..
            } = command
            {
                components.union(node, Node::Account(*freelancer));
                components.union(node, Node::Account(*employer));
            }
            if let Some(record) = ledger.get_invoice(invoice) {
                components.union(node, Node::Account(record.freelancer));
                components.union(node, Node::Account(record.employer));
            }
        }

        let mut groups: Vec<Vec<(usize, LedgerCommand)>> = Vec::new();
        let mut slots: HashMap<Node, usize> = HashMap::new();
        for (index, command) in commands {
            let Some(invoice) = command.invoice() else {
                continue;
            };
            let root = components.find(Node::Invoice(invoice));
            let slot = *slots.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push((index, command));
        }

        groups
    }

    /// Run one group of commands sequentially
    pub async fn process_group(
        &self,
        commands: Vec<(usize, LedgerCommand)>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());

        for (index, command) in commands {
            let result = self.processor.process(&command);
            if let Err(error) = &result {
                tracing::debug!(index, operation = %command.operation(), %error, "command rejected");
            }
            results.push(ProcessingResult {
                index,
                command,
                result,
            });
        }

        results
    }

    /// Process a batch, running groups with disjoint parties concurrently
    ///
    /// Returns one result per command, in batch order. A command whose task
    /// panicked is missing from the results; the panic is logged.
    pub async fn process_batch(&self, batch: Vec<LedgerCommand>) -> Vec<ProcessingResult> {
        let total = batch.len();
        let mut results = Vec::with_capacity(total);

        for segment in segments(batch) {
            match segment {
                Segment::Barrier(index, command) => {
                    results.extend(self.process_group(vec![(index, command)]).await);
                }
                Segment::Invoices(commands) => {
                    let groups = self.partition_by_parties(commands);
                    let mut tasks = Vec::with_capacity(groups.len());
                    for commands in groups {
                        let processor = self.clone();
                        tasks.push(tokio::spawn(async move {
                            processor.process_group(commands).await
                        }));
                    }

                    for task in tasks {
                        match task.await {
                            Ok(group_results) => results.extend(group_results),
                            Err(e) => tracing::error!(error = ?e, "invoice task panicked"),
                        }
                    }
                }
            }
        }

        results.sort_by_key(|result| result.index);
        results
    }
}

/// Split a batch at barrier commands
fn segments(batch: Vec<LedgerCommand>) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current: Vec<(usize, LedgerCommand)> = Vec::new();

    for (index, command) in batch.into_iter().enumerate() {
        if command.invoice().is_some() {
            current.push((index, command));
        } else {
            if !current.is_empty() {
                segments.push(Segment::Invoices(std::mem::take(&mut current)));
            }
            segments.push(Segment::Barrier(index, command));
        }
    }
    if !current.is_empty() {
        segments.push(Segment::Invoices(current));
    }

    segments
}
