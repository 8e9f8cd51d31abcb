//! State snapshots: capture from the ledger, storage, and diffing

pub mod capture;
pub mod state;
pub mod store;

pub use capture::*;
pub use state::*;
pub use store::*;
