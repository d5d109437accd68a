//! Consumers of lowered transactions.
//!
//! A lowered [`TransactionDetails`] is complete, ordered, and
//! argument-resolved; this crate turns it into something runnable.
//!
//! # Modules
//!
//! - [`builder`] -- replays operations against a transaction builder API
//! - [`typescript`] -- renders operations as a TypeScript module
//! - [`error`] -- Error types for both consumers

pub mod builder;
pub mod error;
pub mod typescript;

pub use builder::{apply_details, AddressKind, RecordingBuilder, TransactionBuilder, UnsignedTransaction};
pub use error::CodegenError;
pub use typescript::render_typescript;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use txgraph_plan::TransactionDetails;

/// Ledger network a transaction is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    MainNet,
    StageNet,
    NextNet,
    LocalNet,
    Igor,
    Esmeralda,
}

impl Network {
    /// Wire byte identifying the network.
    pub fn as_byte(self) -> u8 {
        match self {
            Network::MainNet => 0x00,
            Network::StageNet => 0x01,
            Network::NextNet => 0x02,
            Network::LocalNet => 0x10,
            Network::Igor => 0x24,
            Network::Esmeralda => 0x26,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::MainNet => "MainNet",
            Network::StageNet => "StageNet",
            Network::NextNet => "NextNet",
            Network::LocalNet => "LocalNet",
            Network::Igor => "Igor",
            Network::Esmeralda => "Esmeralda",
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::LocalNet
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    /// Case-insensitive network name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::MainNet),
            "stagenet" => Ok(Network::StageNet),
            "nextnet" => Ok(Network::NextNet),
            "localnet" => Ok(Network::LocalNet),
            "igor" => Ok(Network::Igor),
            "esmeralda" => Ok(Network::Esmeralda),
            _ => Err(format!(
                "invalid network '{s}', expected MainNet/StageNet/NextNet/LocalNet/Igor/Esmeralda"
            )),
        }
    }
}

/// Options for building a live transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildOptions {
    pub network: Network,

    /// Ask the validator node to execute without committing.
    pub dry_run: bool,
}

/// Builds an unsigned transaction from `details` with the recording builder.
pub fn build_transaction(
    details: &TransactionDetails,
    options: &BuildOptions,
) -> Result<UnsignedTransaction, CodegenError> {
    let mut builder = RecordingBuilder::new(options.network);
    apply_details(details, &mut builder)?;
    Ok(builder.build_unsigned_transaction(options.dry_run))
}
