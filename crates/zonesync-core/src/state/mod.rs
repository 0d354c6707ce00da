// # Reconciliation State
//
// The only state carried from one cycle to the next is the registrar tally:
// the set of registrar domains seen by the previous diff. It lives in memory
// for the lifetime of the engine that owns it and is never persisted.

pub mod tally;

pub use tally::TallyStore;
