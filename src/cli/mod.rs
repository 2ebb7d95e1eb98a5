// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;
pub mod demo;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Fabstir Model Verifier CLI
#[derive(Parser, Debug)]
#[command(name = "model-verifier")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Tools for model commitments, proof-system ids and verification", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive the 4-byte id of a canonical proof-system name
    ProofSystemId(commands::ProofSystemIdArgs),

    /// Derive the 4-byte selector of an operation signature
    Selector(commands::SelectorArgs),

    /// Compute an input commitment from hex-encoded inputs
    InputCommitment(commands::InputCommitmentArgs),

    /// Load and validate verifier configuration
    CheckConfig(commands::CheckConfigArgs),

    /// Run a register -> verify -> store scenario against the mock backend
    Demo(demo::DemoArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::ProofSystemId(args) => commands::proof_system_id(args),
        Commands::Selector(args) => commands::selector(args),
        Commands::InputCommitment(args) => commands::input_commitment(args),
        Commands::CheckConfig(args) => commands::check_config(args),
        Commands::Demo(args) => demo::run_demo(args).await,
    }
}
