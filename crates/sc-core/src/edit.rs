//! Edit transactions and undo history
//!
//! Writes made between [`EditHistory::begin`] and [`EditHistory::end`] form
//! one transaction. Repeated writes to the same (prim, attribute, time) slot
//! coalesce: the transaction keeps the value from before the first write and
//! the value after the last one, so a whole drag undoes in one step.

use glam::DVec3;

use crate::path::PrimPath;
use crate::prim::XformOp;
use crate::time::TimeCode;

/// Maximum number of transactions kept for undo
pub const MAX_UNDO_DEPTH: usize = 256;

/// One attribute slot change. `None` means the slot had (or has) no opinion.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRecord {
    pub path: PrimPath,
    pub op: XformOp,
    pub time: TimeCode,
    pub before: Option<DVec3>,
    pub after: Option<DVec3>,
}

/// Group of changes undone and redone together
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub label: String,
    pub records: Vec<EditRecord>,
}

impl Transaction {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            records: Vec::new(),
        }
    }

    /// True when every record ends where it started
    fn is_noop(&self) -> bool {
        self.records.iter().all(|r| r.before == r.after)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Edit transaction '{0}' is already open")]
    TransactionOpen(String),
    #[error("No edit transaction is open")]
    NoTransaction,
}

#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    open: Option<Transaction>,
    undo: Vec<Transaction>,
    redo: Vec<Transaction>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a transaction. Transactions do not nest.
    pub fn begin(&mut self, label: impl Into<String>) -> Result<(), EditError> {
        if let Some(open) = &self.open {
            return Err(EditError::TransactionOpen(open.label.clone()));
        }
        self.open = Some(Transaction::new(label));
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn open_label(&self) -> Option<&str> {
        self.open.as_ref().map(|t| t.label.as_str())
    }

    /// Record a write. Outside a transaction the write becomes its own
    /// undo step.
    pub fn record(&mut self, record: EditRecord) {
        match &mut self.open {
            Some(transaction) => {
                let existing = transaction.records.iter_mut().find(|r| {
                    r.path == record.path && r.op == record.op && r.time == record.time
                });
                match existing {
                    Some(existing) => existing.after = record.after,
                    None => transaction.records.push(record),
                }
            }
            None => {
                let label = format!("Set {}", record.op.attribute_name());
                let transaction = Transaction {
                    label,
                    records: vec![record],
                };
                self.push(transaction);
            }
        }
    }

    /// Close the open transaction. Returns true when it changed anything and
    /// was pushed onto the undo stack.
    pub fn end(&mut self) -> Result<bool, EditError> {
        let transaction = self.open.take().ok_or(EditError::NoTransaction)?;
        if transaction.records.is_empty() || transaction.is_noop() {
            return Ok(false);
        }
        self.push(transaction);
        Ok(true)
    }

    fn push(&mut self, transaction: Transaction) {
        self.redo.clear();
        self.undo.push(transaction);
        if self.undo.len() > MAX_UNDO_DEPTH {
            self.undo.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        self.open.is_none() && !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.open.is_none() && !self.redo.is_empty()
    }

    /// Pop the transaction to undo; the caller applies `before` values
    pub(crate) fn take_undo(&mut self) -> Option<Transaction> {
        if self.open.is_some() {
            return None;
        }
        self.undo.pop()
    }

    pub(crate) fn push_redo(&mut self, transaction: Transaction) {
        self.redo.push(transaction);
    }

    /// Pop the transaction to redo; the caller applies `after` values
    pub(crate) fn take_redo(&mut self) -> Option<Transaction> {
        if self.open.is_some() {
            return None;
        }
        self.redo.pop()
    }

    pub(crate) fn push_undo(&mut self, transaction: Transaction) {
        self.undo.push(transaction);
    }

    pub fn undo_labels(&self) -> impl Iterator<Item = &str> {
        self.undo.iter().rev().map(|t| t.label.as_str())
    }

    pub fn clear(&mut self) {
        self.open = None;
        self.undo.clear();
        self.redo.clear();
    }
}
