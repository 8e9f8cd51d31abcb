//! # Ledger Testkit
//!
//! Test support for code that talks to a distributed ledger: a simulated
//! ledger node, synthetic funded accounts, and before/after state snapshots so
//! tests can assert on balance changes without a live network.
//!
//! ## Features
//!
//! - **Simulated ledger**: account registration, round advancement and payment
//!   submission with balance checks and fee burning
//! - **Snapshots**: capture account state, store it by name and diff captures
//! - **Index**: block-explorer style lookups by account and round range
//! - **Test accounts**: funded accounts with canonical addresses, factory and pool
//! - **Transactions**: builder with network defaults and common payment patterns
//! - **Sandbox**: simulated start/stop lifecycle of a local node
//!
//! ## Quick Start
//!
//! ```rust
//! use ledger_testkit::{AccountInfo, SimulatedLedger, SnapshotCapture, TransactionBuilder};
//!
//! # tokio_test_block(async {
//! let ledger = SimulatedLedger::in_memory();
//! ledger.register(AccountInfo::new("SENDER", 10_000_000)).await?;
//! ledger.register(AccountInfo::new("RECEIVER", 1_000_000)).await?;
//!
//! let capture = SnapshotCapture::new(ledger.clone());
//! let accounts = vec!["SENDER".to_string(), "RECEIVER".to_string()];
//! let before = capture.capture(&accounts, Some("before"), None).await?;
//!
//! let tx = TransactionBuilder::payment("SENDER").to("RECEIVER").amount(2_000_000).build()?;
//! ledger.submit_transaction(&tx).await?;
//!
//! let after = capture.capture(&accounts, Some("after"), None).await?;
//! let diff = after.diff_from(&before);
//! assert_eq!(diff.delta("SENDER"), -2_001_000);
//! assert_eq!(diff.delta("RECEIVER"), 2_000_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod assertions;
pub mod config;
pub mod indexer;
pub mod ledger;
pub mod logging;
pub mod sandbox;
pub mod snapshot;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::TestkitConfig;
pub use indexer::*;
pub use ledger::*;
pub use sandbox::*;
pub use snapshot::*;
pub use traits::*;
pub use types::*;

// Re-export transaction patterns for convenience
pub use ledger::transaction::patterns;
