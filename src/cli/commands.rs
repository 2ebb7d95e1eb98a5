// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::config::VerifierConfig;
use crate::crypto::{OperationSelector, ProofSystemId};
use crate::verifier::{random_nonce, InputCommitment};

/// Arguments for proof-system-id command
#[derive(Args, Debug)]
pub struct ProofSystemIdArgs {
    /// Canonical name, e.g. groth16-bn254-v1
    pub name: String,
}

/// Arguments for selector command
#[derive(Args, Debug)]
pub struct SelectorArgs {
    /// Operation signature, e.g. "transfer(address,uint256)"
    pub signature: String,
}

/// Arguments for input-commitment command
#[derive(Args, Debug)]
pub struct InputCommitmentArgs {
    /// Public inputs (hex)
    #[arg(long)]
    pub public: String,

    /// Private inputs (hex)
    #[arg(long)]
    pub private: String,

    /// 32-byte nonce (hex)
    #[arg(long, conflicts_with = "random_nonce")]
    pub nonce: Option<String>,

    /// Salt with a freshly generated nonce
    #[arg(long, conflicts_with = "nonce")]
    pub random_nonce: bool,
}

/// Arguments for check-config command
#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// TOML config file (defaults to VERIFIER_* environment variables)
    #[arg(long, env = "VERIFIER_CONFIG")]
    pub file: Option<PathBuf>,
}

pub(crate) fn decode_hex(label: &str, input: &str) -> Result<Vec<u8>> {
    let stripped = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(stripped).with_context(|| format!("--{} is not valid hex", label))
}

pub(crate) fn decode_nonce(input: &str) -> Result<[u8; 32]> {
    let bytes = decode_hex("nonce", input)?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow!("--nonce must be 32 bytes, got {}", b.len()))
}

pub fn proof_system_id(args: ProofSystemIdArgs) -> Result<()> {
    let id = ProofSystemId::from_name(&args.name)?;
    println!("{}", id);
    Ok(())
}

pub fn selector(args: SelectorArgs) -> Result<()> {
    let selector = OperationSelector::from_signature(&args.signature)?;
    println!("{}", selector);
    Ok(())
}

pub fn input_commitment(args: InputCommitmentArgs) -> Result<()> {
    let public = decode_hex("public", &args.public)?;
    let private = decode_hex("private", &args.private)?;

    let nonce = match (&args.nonce, args.random_nonce) {
        (Some(hex), _) => Some(decode_nonce(hex)?),
        (None, true) => Some(random_nonce()),
        (None, false) => None,
    };

    let commitment = match &nonce {
        Some(nonce) => InputCommitment::with_nonce(&public, &private, nonce),
        None => InputCommitment::commit(&public, &private),
    };

    if let Some(nonce) = nonce {
        println!("nonce:      0x{}", hex::encode(nonce));
    }
    println!("commitment: 0x{}", hex::encode(commitment.as_bytes()));
    Ok(())
}

pub fn check_config(args: CheckConfigArgs) -> Result<()> {
    let config = match &args.file {
        Some(path) => {
            info!("📄 Loading config from {}", path.display());
            VerifierConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => {
            let config = VerifierConfig::from_env();
            config.validate()?;
            config
        }
    };

    println!("✅ Configuration is valid\n");
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
