//! Operation controller and command-line front end for LocalizePipe
//!
//! Ties the scanner and writer from `localize-pipe` to the translation
//! pipeline from `localize-pipe-mt`:
//!
//! - [`OperationController`] runs one operation at a time and publishes
//!   immutable [`ControllerState`] snapshots
//! - [`LocalizePipeConfig`] reads `localize-pipe.toml`
//! - [`cli`] implements the `localize-pipe` binary

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod providers;
pub mod state;

pub use config::{ConfigError, LocalizePipeConfig, ProjectScanSettings};
pub use controller::{ControllerTimings, ListenerId, OperationController};
pub use error::{SessionError, SessionResult};
pub use providers::{FixedScope, ScopeResolver, SettingsProvider, StaticSettings};
pub use state::{ControllerState, UiOperation, merge_rescanned_rows, should_trigger_rescan};
