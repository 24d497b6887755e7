//! voto: command-line front end for the citizen voting portal.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use voto_candidates::FilterUpdate;
use voto_portal::{PortalConfig, VotingPortal};
use voto_types::{CandidateId, ElectionResults, RegisterData, Timestamp};
use voto_utils::{format_elapsed, init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "voto", about = "Citizen voting portal")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "VOTO_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the election service (e.g. "http://127.0.0.1:3000/api").
    #[arg(long, env = "VOTO_API_URL")]
    api_url: Option<String>,

    /// File the session token is kept in between runs.
    #[arg(long, env = "VOTO_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Seconds between tally refreshes with `results --watch`.
    #[arg(long, env = "VOTO_POLL_INTERVAL")]
    poll_interval: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VOTO_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VOTO_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Log in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "VOTO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in.
    Register {
        #[arg(long)]
        name: String,
        /// National identity document number.
        #[arg(long)]
        dni: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// End the saved session.
    Logout,
    /// Show the logged-in user and whether they have voted.
    Whoami,
    /// List candidates, optionally filtered.
    Candidates {
        /// Case-insensitive match on name or party.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        party: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Show the current tally.
    Results {
        /// Keep polling and print every new tally until Ctrl-C.
        #[arg(long)]
        watch: bool,
    },
    /// Cast your vote.
    Vote {
        /// Candidate id as listed by `voto candidates`.
        candidate_id: u64,
    },
}

/// File settings overridden by flags and environment.
fn load_config(cli: &Cli) -> anyhow::Result<PortalConfig> {
    let base = match &cli.config {
        Some(path) => PortalConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PortalConfig::default(),
    };

    let config = PortalConfig {
        api_url: cli.api_url.clone().unwrap_or(base.api_url),
        session_file: cli.session_file.clone().unwrap_or(base.session_file),
        poll_interval_secs: cli.poll_interval.unwrap_or(base.poll_interval_secs),
        log_level: cli.log_level.clone().unwrap_or(base.log_level),
        log_format: cli.log_format.unwrap_or(base.log_format),
        ..base
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    let portal = VotingPortal::from_config(&config)?;

    match cli.command {
        Command::Login { email, password } => {
            let session = portal.login(&email, &password).await?;
            println!("Logged in as {} <{}>", session.user.name, session.user.email);
        }
        Command::Register {
            name,
            dni,
            email,
            password,
            confirm_password,
        } => {
            let data = RegisterData {
                name,
                dni,
                email,
                password,
                confirm_password,
            };
            let session = portal.register(&data).await?;
            println!("Registered and logged in as {}", session.user.name);
        }
        Command::Logout => {
            portal.start().await?;
            if let Some(revocation) = portal.logout() {
                let _ = tokio::time::timeout(Duration::from_secs(5), revocation).await;
            }
            println!("Logged out");
        }
        Command::Whoami => match portal.start().await? {
            None => println!("Not logged in"),
            Some(session) => {
                let voted = match portal.voting_status().await {
                    Ok(true) => "has voted",
                    Ok(false) => "has not voted yet",
                    Err(_) => "voting status unknown",
                };
                println!(
                    "{} <{}> (user {}), {voted}",
                    session.user.name, session.user.email, session.user.id
                );
            }
        },
        Command::Candidates {
            search,
            party,
            color,
        } => {
            portal.load_candidates().await?;
            portal
                .set_filters(FilterUpdate {
                    search_term: search,
                    party,
                    color,
                })
                .await;
            let candidates = portal.filtered_candidates().await;
            if candidates.is_empty() {
                println!("No candidates match");
            }
            for c in candidates {
                println!("{:>4}  {:<28} {:<16} {}", c.id.get(), c.name, c.party, c.color);
            }
        }
        Command::Results { watch: false } => {
            portal.refresh_results().await?;
            if let Some(results) = portal.results() {
                print_results(&results, portal.tally().last_fetched());
            }
        }
        Command::Results { watch: true } => {
            let mut rx = portal.watch_results();
            loop {
                tokio::select! {
                    biased;
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("received SIGINT, stopping");
                        break;
                    }
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = rx.borrow_and_update().clone();
                        if let Some(snapshot) = snapshot {
                            print_results(&snapshot.results, Some(snapshot.fetched_at));
                        }
                    }
                }
            }
            portal.shutdown();
        }
        Command::Vote { candidate_id } => {
            portal.start().await?;
            let candidate_id = CandidateId::new(candidate_id);
            let name = match portal.load_candidates().await {
                Ok(_) => portal.candidate(candidate_id).await.map(|c| c.name),
                Err(_) => None,
            };
            let vote = portal.cast_vote(candidate_id).await?;
            let label = match vote {
                Some(vote) => format!("Vote {}", vote.id),
                None => "Vote".to_string(),
            };
            match name {
                Some(name) => println!("{label} recorded for {name}"),
                None => println!("{label} recorded for candidate {candidate_id}"),
            }
            if let Some(results) = portal.results() {
                print_results(&results, portal.tally().last_fetched());
            }
        }
    }

    Ok(())
}

fn print_results(results: &ElectionResults, fetched_at: Option<Timestamp>) {
    let status = if results.is_finalized { "final" } else { "live" };
    let age = fetched_at
        .map(|t| format_elapsed(t.elapsed_since(Timestamp::now())))
        .unwrap_or_else(|| "never".to_string());
    println!("Results ({status}, {} votes, fetched {age})", results.total_votes);
    for c in results.ranking() {
        println!(
            "  {:<28} {:<16} {:>6} {:>6.1}%",
            c.name,
            c.party,
            c.vote_count(),
            c.percentage.unwrap_or(0.0)
        );
    }
    if let Some(leader) = results.leader() {
        println!("Leading: {} ({})", leader.name, leader.party);
    }
}
