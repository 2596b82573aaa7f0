//! privote command line
//!
//! Casts private votes against a ledger kept in a local JSON snapshot.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use privote_circuit::{Halo2Oracle, PoseidonHasher};
use privote_ledger::{
    wire, CastOutcome, FileSecretStore, LedgerSnapshot, SecretStore, VoteLedger, VotingSession,
};
use privote_runtime::{
    config::{DEFAULT_CACHE_DIR, DEFAULT_K},
    oracle, LedgerConfig, Mode, Nullifier, ProverConfig,
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "privote")]
#[command(about = "Private voting with nullifiers and zero-knowledge proofs", long_about = None)]
struct Cli {
    /// Ledger snapshot file
    #[arg(long, global = true, env = "PRIVOTE_LEDGER_FILE", default_value = ".privote/ledger.json")]
    ledger: PathBuf,

    /// Voter secret file
    #[arg(long, global = true, env = "PRIVOTE_SECRET_FILE", default_value = ".privote/secret")]
    secret_file: PathBuf,

    /// Ledger mode (development or production), overrides PRIVOTE_MODE
    #[arg(long, global = true)]
    mode: Option<Mode>,

    /// Network label, overrides PRIVOTE_NETWORK
    #[arg(long, global = true)]
    network: Option<String>,

    /// Circuit parameter k (size = 2^k)
    #[arg(short, long, global = true, default_value_t = DEFAULT_K)]
    k: u32,

    /// Cache directory for IPA params and the circuit manifest
    #[arg(long, global = true, default_value = DEFAULT_CACHE_DIR)]
    cache_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and cache the proving parameters
    Setup,

    /// Create the voter secret if needed and print its nullifier for a proposal
    Secret {
        /// Proposal to derive the nullifier for
        #[arg(short, long, default_value_t = 1)]
        proposal: u64,
    },

    /// Cast a vote (0 = no, 1 = yes)
    Cast {
        #[arg(short, long)]
        proposal: u64,

        #[arg(short, long)]
        vote: u64,
    },

    /// Submit a JSON vote request and print the response
    Submit {
        /// Path to the request body
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Show the vote total for a proposal
    Results {
        #[arg(short, long)]
        proposal: u64,
    },

    /// Check whether a nullifier has been used
    HasVoted {
        /// Nullifier as hex64; defaults to this voter's nullifier
        #[arg(short, long)]
        nullifier: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        proposal: u64,
    },

    /// List the demo proposals with their totals
    Proposals,

    /// Clear the ledger (development mode only)
    Reset,

    /// Show ledger mode, network and size
    Status,
}

impl Cli {
    fn ledger_config(&self) -> Result<LedgerConfig> {
        let mut config = LedgerConfig::from_env().context("Failed to read ledger configuration")?;
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(network) = &self.network {
            config.network = network.clone();
        }
        Ok(config)
    }

    fn prover_config(&self) -> ProverConfig {
        ProverConfig::new(self.k, &self.cache_dir)
    }
}

fn load_snapshot(path: &Path) -> Result<LedgerSnapshot> {
    if !path.exists() {
        debug!(path = ?path, "no ledger snapshot, starting empty");
        return Ok(LedgerSnapshot::default());
    }

    let content =
        fs::read_to_string(path).context(format!("Failed to read ledger file: {:?}", path))?;
    serde_json::from_str(&content).context("Failed to parse ledger JSON")
}

fn save_snapshot(path: &Path, snapshot: &LedgerSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .context(format!("Failed to create ledger directory: {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize ledger")?;
    fs::write(path, json).context(format!("Failed to write ledger file: {:?}", path))
}

struct Opened {
    ledger: Arc<VoteLedger>,
    oracle: Arc<Halo2Oracle>,
}

fn open(cli: &Cli) -> Result<Opened> {
    let oracle = Arc::new(Halo2Oracle::setup(&cli.prover_config())?);
    let snapshot = load_snapshot(&cli.ledger)?;
    let ledger = VoteLedger::from_snapshot(cli.ledger_config()?, oracle.clone(), snapshot)
        .context("Failed to restore ledger")?;
    Ok(Opened { ledger: Arc::new(ledger), oracle })
}

fn voter_nullifier(cli: &Cli, proposal_id: u64) -> Result<Nullifier> {
    let mut store = FileSecretStore::new(&cli.secret_file);
    let secret = store.load_or_create().context("Failed to load voter secret")?;
    Ok(oracle::nullifier(&PoseidonHasher::new(), &secret, proposal_id)?)
}

fn cast(cli: &Cli, proposal_id: u64, vote: u64) -> Result<()> {
    let ctx = open(cli)?;
    let mut session = VotingSession::new(
        ctx.ledger.clone(),
        Arc::new(PoseidonHasher::new()),
        ctx.oracle,
        Box::new(FileSecretStore::new(&cli.secret_file)),
    );

    match session.cast_vote(proposal_id, vote)? {
        CastOutcome::Accepted(receipt) => {
            save_snapshot(&cli.ledger, &ctx.ledger.snapshot())?;
            println!("Vote accepted");
            println!("   Proposal: {}", receipt.entry.proposal_id);
            println!("   Tx hash:  {}", receipt.tx_hash);
            println!("   Mode:     {}", receipt.mode.wire_label());
        }
        CastOutcome::AlreadyVoted { nullifier } => {
            println!("Already voted on proposal {}", proposal_id);
            println!("   Nullifier: {}", nullifier);
        }
    }
    println!("   Total:    {}", ctx.ledger.tally(proposal_id));
    Ok(())
}

fn submit(cli: &Cli, request: &Path) -> Result<()> {
    let body = fs::read_to_string(request)
        .context(format!("Failed to read request file: {:?}", request))?;
    let ctx = open(cli)?;

    let response = wire::handle_submit(&ctx.ledger, &body);
    if response.status == 200 {
        save_snapshot(&cli.ledger, &ctx.ledger.snapshot())?;
    }
    println!("{} {}", response.status, serde_json::to_string_pretty(&response.body)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Setup => {
            let config = cli.prover_config();
            let oracle = Halo2Oracle::setup(&config)?;
            info!(k = oracle.k(), cache_dir = ?config.cache_dir(), "prover ready");
            println!("Setup complete (k = {}, cache: {:?})", oracle.k(), config.cache_dir());
        }
        Commands::Secret { proposal } => {
            let nullifier = voter_nullifier(&cli, *proposal)?;
            println!("Secret file: {:?}", cli.secret_file);
            println!("Nullifier for proposal {}: {}", proposal, nullifier);
        }
        Commands::Cast { proposal, vote } => cast(&cli, *proposal, *vote)?,
        Commands::Submit { request } => submit(&cli, request)?,
        Commands::Results { proposal } => {
            let ctx = open(&cli)?;
            let response = wire::handle_results(&ctx.ledger, &proposal.to_string());
            println!("{}", serde_json::to_string_pretty(&response.body)?);
        }
        Commands::HasVoted { nullifier, proposal } => {
            let nullifier = match nullifier {
                Some(hex) => hex.clone(),
                None => voter_nullifier(&cli, *proposal)?.to_hex(),
            };
            let ctx = open(&cli)?;
            let response = wire::handle_has_voted(&ctx.ledger, &nullifier);
            println!("{}", serde_json::to_string_pretty(&response.body)?);
        }
        Commands::Proposals => {
            let ctx = open(&cli)?;
            let proposals = wire::demo_proposals(&ctx.ledger);
            println!("{}", serde_json::to_string_pretty(&proposals)?);
        }
        Commands::Reset => {
            let ctx = open(&cli)?;
            ctx.ledger.reset()?;
            save_snapshot(&cli.ledger, &ctx.ledger.snapshot())?;
            println!("Ledger reset");
        }
        Commands::Status => {
            let ctx = open(&cli)?;
            let status = ctx.ledger.status();
            let health = wire::HealthResponse::from(status);
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
    }

    Ok(())
}
