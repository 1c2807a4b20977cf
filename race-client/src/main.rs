use std::{
    io::{BufRead, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use race_client::{
    ClientError, HttpProgressApi, IdentityStore, LocalCache, ProgressApi, SyncClient, View,
    WatchCommand, render, resolve_unit,
};
use race_utils::TOTAL_UNITS;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::MissedTickBehavior,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Track the syllabus race from the terminal", long_about = None)]
struct Cli {
    /// Base URL of the progress server
    #[arg(long, env = "RACE_SERVER", default_value = "http://localhost:5000")]
    server: String,

    /// File holding the local identity
    #[arg(long, env = "RACE_IDENTITY_FILE", default_value = ".race-identity.json")]
    identity_file: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// How often to poll the server, in milliseconds
    #[arg(long, default_value_t = race_client::POLL_INTERVAL_MS)]
    poll_ms: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the race and keep it up to date (default)
    Watch,
    /// Mark a unit as done, or not done with --off
    Toggle {
        /// Flattened unit index, or the subject number when UNIT is given
        index: usize,
        /// Unit number inside the subject
        unit: Option<usize>,
        #[arg(long)]
        off: bool,
    },
    /// Clear every unit of the current player
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print the leaderboard once
    Leaderboard,
    /// Store a player name and register it with the server
    Login { name: String },
}

/// Asks on the terminal for a line of input. `None` on EOF or read failure.
fn ask(question: &str) -> Option<String> {
    print!("{question}");
    std::io::stdout().flush().ok()?;
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(e) => {
            log::error!("Failed to read from stdin: {e}");
            None
        }
    }
}

fn ask_name() -> Option<String> {
    ask("What's your name? ")
}

/// Redraws the whole screen on every change.
fn draw(cache: &LocalCache) {
    print!("\x1B[2J\x1B[H{}", render::render(cache));
    println!("\ntoggle|check|uncheck <#> or <subject#> <unit#>, reset, refresh, help, quit");
    std::io::stdout().flush().ok();
}

fn quiet(_: &LocalCache) {}

const HELP: &str = "\
toggle <#>       flip a unit (by index, or as <subject#> <unit#>)
check <#>        mark a unit as done
uncheck <#>      mark a unit as not done
reset confirm    clear all of your units
refresh          poll the server now
quit             exit";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let api = Arc::new(
        HttpProgressApi::new(&cli.server, Duration::from_secs(cli.timeout_secs))
            .context("Failed to build HTTP client")?,
    );
    let identity = IdentityStore::new(cli.identity_file.clone());

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(api, identity, Duration::from_millis(cli.poll_ms)).await,
        Command::Toggle { index, unit, off } => {
            let index = resolve_unit(index, unit).map_err(anyhow::Error::msg)?;
            let mut client = SyncClient::new(api, identity, quiet);
            let name = client.bootstrap(ask_name).await.context("Failed to start")?;
            client
                .toggle(index, !off)
                .context("Failed to toggle unit")?
                .await
                .context("Update task panicked")?;
            client.poll().await.context("Failed to fetch progress")?;
            let completed = client
                .cache()
                .selected_player()
                .map(|(_, player)| player.completed_count())
                .unwrap_or(0);
            let label = render::unit_label(index).unwrap_or_else(|| format!("unit #{index}"));
            let state = if off { "not done" } else { "done" };
            println!("{name}: {label} {state}, {completed}/{TOTAL_UNITS} completed");
            Ok(())
        }
        Command::Reset { yes } => {
            let mut client = SyncClient::new(api, identity, quiet);
            let name = client.bootstrap(ask_name).await.context("Failed to start")?;
            if !yes && !confirm_reset(&name) {
                println!("Nothing changed.");
                return Ok(());
            }
            client
                .reset()
                .context("Failed to reset")?
                .await
                .context("Reset task panicked")?;
            println!("Progress for {name} cleared.");
            Ok(())
        }
        Command::Leaderboard => {
            let store = api
                .fetch_progress()
                .await
                .context("Failed to fetch progress")?;
            print!("{}", render::render_leaderboard(&store));
            Ok(())
        }
        Command::Login { name } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("Player name cannot be empty");
            }
            identity.set(name).context("Failed to store identity")?;
            let response = api
                .create_user(name)
                .await
                .context("Failed to register with the server")?;
            if response.exists {
                println!("Welcome back, {name}.");
            } else {
                println!("Registered {name}.");
            }
            Ok(())
        }
    }
}

fn confirm_reset(name: &str) -> bool {
    ask(&format!("Clear all progress for {name}? [y/N] "))
        .is_some_and(|answer| matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn watch<A: ProgressApi>(
    api: Arc<A>,
    identity: IdentityStore,
    poll_every: Duration,
) -> Result<()> {
    let mut client = SyncClient::new(api, identity, draw);
    client.bootstrap(ask_name).await.context("Failed to start")?;

    let mut ticker = tokio::time::interval(poll_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // the first tick fires immediately and bootstrap just fetched
    ticker.tick().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // failures are logged inside poll and the stale cache stays up
                client.poll().await.ok();
            }
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        stdin_open = false;
                        continue;
                    }
                    Err(e) => {
                        log::error!("Failed to read from stdin: {e}");
                        stdin_open = false;
                        continue;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<WatchCommand>() {
                    Ok(WatchCommand::Quit) => break,
                    Ok(command) => run_command(&mut client, command).await,
                    Err(e) => println!("{e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

async fn run_command<A: ProgressApi, V: View>(
    client: &mut SyncClient<A, V>,
    command: WatchCommand,
) {
    let result = match command {
        WatchCommand::Flip(index) => client.flip(index).map(drop),
        WatchCommand::Set(index, value) => client.toggle(index, value).map(drop),
        WatchCommand::Reset { confirmed: true } => client.reset().map(drop),
        WatchCommand::Reset { confirmed: false } => {
            println!("Type `reset confirm` to clear all of your units.");
            Ok(())
        }
        WatchCommand::Refresh => {
            client.poll().await.ok();
            Ok(())
        }
        WatchCommand::Help => {
            println!("{HELP}");
            Ok(())
        }
        WatchCommand::Quit => Ok(()),
    };

    match result {
        Ok(()) => {}
        Err(ClientError::Progress(e)) => println!("{e}"),
        Err(e) => log::error!("{e}"),
    }
}
