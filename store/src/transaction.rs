//! Transaction handles.
//!
//! Handles are opaque trait objects; backends downcast to their concrete
//! transaction type via `as_any`/`as_any_mut`. Only one write transaction is
//! active at a time (single-writer discipline); readers observe a consistent
//! snapshot.

use std::any::Any;

/// Opaque read transaction handle.
pub trait ReadTxn {
    fn as_any(&self) -> &dyn Any;
}

/// Writable transaction handle (extends ReadTxn).
pub trait WriteTxn: ReadTxn {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// View this write transaction as a read transaction.
    fn as_read(&self) -> &dyn ReadTxn;

    /// Commit all writes performed under this transaction.
    fn commit(self: Box<Self>) -> Result<(), crate::StoreError>;
}
