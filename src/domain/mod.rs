//! Domain Layer - Core watch logic for Balance Sentinel
//!
//! Pure types and decision logic with no I/O beyond the registry store.
//! All external interactions happen through the ports layer.
//!
//! - `account`: watched wallet and address/chain grammar
//! - `snapshot`: one balance read and the comparison metric
//! - `registry`: insertion-ordered set of watched wallets
//! - `change_detector`: Initial / NoChange / Changed decision
//! - `persistence`: flat JSON registry store
//! - `format`: shared display helpers

pub mod account;
pub mod snapshot;
pub mod registry;
pub mod change_detector;
pub mod persistence;
pub mod format;

pub use account::{normalize_chain_tag, normalize_identifier, WatchedAccount};
pub use snapshot::{round_usd, ComparisonMetric, Snapshot};
pub use registry::{RegistryError, WalletRegistry};
pub use change_detector::{evaluate, evaluate_at, ChangeEvent, Direction, Evaluation};
pub use persistence::{PersistError, PersistedWallet, RecoveryStatus, RegistryStore};
pub use format::{format_balance, format_observed, format_timestamp, short_identifier};
