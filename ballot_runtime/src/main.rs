//! `ballot`: operate a persisted ballot session from the command line.

use std::path::PathBuf;

use anyhow::Context;
use ballot_kernel::domain::CandidateId;
use ballot_runtime::config::{from_toml_path, RuntimeConfig};
use ballot_runtime::drift;
use ballot_runtime::logging::init_logging;
use ballot_runtime::session::Session;
use ballot_runtime::snapshot_codec::{export_snapshot_to_file, snapshot_hash};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ballot", about = "Single-election ballot with a persisted command log")]
struct Cli {
    /// TOML config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base directory holding session directories.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    session: Option<String>,
    /// Snapshot every N commands (0 disables).
    #[arg(long)]
    snapshot_interval: Option<u64>,
    /// Default log directive when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the ballot. The admin is the deploying identity.
    Init {
        #[arg(long)]
        admin: String,
        /// Candidate names; ids follow argument order from 0.
        names: Vec<String>,
    },
    /// Register a voter (admin only).
    Register {
        #[arg(long)]
        caller: String,
        voter: String,
    },
    /// Cast the caller's single vote.
    Vote {
        #[arg(long)]
        caller: String,
        candidate_id: CandidateId,
    },
    /// Show one candidate.
    Candidate { candidate_id: CandidateId },
    /// List every candidate with its tally.
    Candidates,
    /// Show a voter record.
    Voter { identity: String },
    /// Print the canonical state hash.
    Hash,
    /// Rebuild from the log, check determinism and the latest snapshot.
    Replay,
    /// Write the full ballot state as JSON.
    Export { path: PathBuf },
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<RuntimeConfig> {
        let mut config: RuntimeConfig = match &self.config {
            Some(path) => from_toml_path(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => RuntimeConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(session) = &self.session {
            config.session_id = session.clone();
        }
        if let Some(interval) = self.snapshot_interval {
            config.snapshot_interval = interval;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    init_logging(&config.log_level)?;

    let mut session = Session::from_config(&config)
        .with_context(|| format!("opening session {}", config.session_dir().display()))?;

    match cli.command {
        Command::Init { admin, names } => {
            session.initialize(admin.as_str(), None, names.as_slice())?;
            println!("initialized {} candidates, admin {}", names.len(), admin);
        }
        Command::Register { caller, voter } => {
            session.register_voter(caller.as_str(), voter.as_str())?;
            println!("registered {}", voter);
        }
        Command::Vote {
            caller,
            candidate_id,
        } => {
            let cast = session.vote(caller.as_str(), candidate_id)?;
            println!("vote cast for candidate {}", cast.candidate_id);
        }
        Command::Candidate { candidate_id } => {
            let c = session.state()?.candidate(candidate_id)?;
            println!("{}\t{}\t{}", c.id, c.name, c.vote_count);
        }
        Command::Candidates => {
            let state = session.state()?;
            println!("total: {}", state.total_candidates());
            for c in state.candidates() {
                println!("{}\t{}\t{}", c.id, c.name, c.vote_count);
            }
        }
        Command::Voter { identity } => {
            let v = session.state()?.voter(&identity.as_str().into());
            let choice = v
                .voted_candidate_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "registered={} has_voted={} candidate={}",
                v.registered, v.has_voted, choice
            );
        }
        Command::Hash => {
            println!("{}", session.current_hash()?);
        }
        Command::Replay => {
            let before = session.state()?.clone();
            let (after, hash) = session.replay_full()?;
            let report = drift::compare_states(&before, &after);
            anyhow::ensure!(
                report.is_unchanged(),
                "replayed state differs from live state: {:?}",
                report
            );

            drift::verify_determinism(&session.logged_commands()?)?;

            println!("sequence {} hash {}", session.current_sequence(), hash);
            match session.verify_latest_snapshot()? {
                Some(true) => println!("latest snapshot verified"),
                Some(false) => anyhow::bail!("latest snapshot does not match the log"),
                None => println!("no snapshots"),
            }
        }
        Command::Export { path } => {
            let state = session.state()?;
            export_snapshot_to_file(state, &path)?;
            println!("exported {} ({})", path.display(), snapshot_hash(state)?);
        }
    }
    Ok(())
}
