use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use filechain_ledger::DeletionPolicy;

#[derive(Parser)]
#[command(
    name = "filechain",
    about = "Tamper-evident ledger of uploaded files, sealed with proof of work",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Validate an exported chain file
    Verify(VerifyArgs),
    /// Build a sample chain and show how tampering is detected
    Demo(DemoArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML settings file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, env = "FILECHAIN_BIND")]
    pub bind: Option<SocketAddr>,
    #[arg(long, env = "FILECHAIN_DIFFICULTY")]
    pub difficulty: Option<u32>,
    #[arg(long)]
    pub policy: Option<PolicyArg>,
    /// Threads per nonce search
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyArg {
    Rebuild,
    Tombstone,
}

impl From<PolicyArg> for DeletionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Rebuild => Self::Rebuild,
            PolicyArg::Tombstone => Self::Tombstone,
        }
    }
}

#[derive(Args)]
pub struct VerifyArgs {
    /// JSON array of blocks, as served by /api/blockchain
    pub file: PathBuf,
    #[arg(long, default_value = "4")]
    pub difficulty: u32,
}

#[derive(Args)]
pub struct DemoArgs {
    /// Leading zero hex characters each digest needs
    #[arg(long, default_value = "4")]
    pub difficulty: u32,
    #[arg(long, value_enum, default_value = "all")]
    pub scenario: Scenario,
    /// Also write the untampered chain here
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Scenario {
    /// Rewrite the newest record and forge its digest
    TamperBlock,
    /// Break the back-link of block 2
    CorruptChain,
    /// Replace the newest digest with one lacking enough zeros
    InvalidPow,
    All,
}

impl Scenario {
    pub fn expand(self) -> Vec<Scenario> {
        match self {
            Self::All => vec![Self::TamperBlock, Self::CorruptChain, Self::InvalidPow],
            one => vec![one],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TamperBlock => "tamper-block",
            Self::CorruptChain => "corrupt-chain",
            Self::InvalidPow => "invalid-pow",
            Self::All => "all",
        }
    }
}
