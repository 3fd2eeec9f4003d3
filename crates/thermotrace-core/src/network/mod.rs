//! Ledger network topology and chaincode invocation.

pub mod command;
pub mod profile;
pub mod script;

pub use command::{InvokeCommand, ShellArg, compose_invoke};
pub use profile::{NetworkConfig, OrdererConfig, OrganizationProfile};
pub use script::emit_script;
