//! Ledger module containing the simulated node, its state, test accounts and transaction building

pub mod account;
pub mod core;
pub mod state;
pub mod transaction;

pub use account::*;
pub use core::*;
pub use state::*;
pub use transaction::*;
