use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use portal::SESSION_KEY;
use portal::boundary::{self, BoundaryAction, BoundaryDecision};
use portal::cookie::SessionCookie;
use portal::credentials::{Authenticator, PasswordPolicy};
use portal::directory::MockDirectory;
use portal::guard::{Area, GuardDecision, RouteGuard};
use portal::identity::Role;
use portal::pose::{AnalysisTiming, DEFAULT_SESSION_LABEL, PoseError, PoseModel, PoseStudio, simulate_upload};
use portal::session::{SessionError, SessionStore};
use portal::storage::{CookieMirror, FileStore, StorageError};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("pose studio failed: {0}")]
    Pose(#[from] PoseError),
    #[error("not signed in; run `kinetic login` first")]
    NotSignedIn,
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "kinetic", about = "Kinetic portal session CLI")]
struct Cli {
    /// File holding local entries and cookies between runs.
    #[arg(long, env = "KINETIC_STATE_FILE", default_value = ".kinetic/session.json")]
    state_file: PathBuf,

    #[arg(long, env = "KINETIC_LOGIN_DELAY_MS", default_value_t = 500)]
    login_delay_ms: u64,

    /// Require the stored password for known accounts.
    #[arg(long, env = "KINETIC_STRICT_PASSWORDS", default_value_t = false)]
    strict_passwords: bool,

    /// Repeat for more log output on stderr.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Portal the login goes through.
        #[arg(long)]
        portal: Option<Role>,
    },
    Logout,
    Whoami,
    /// Show where a page request would end up.
    Visit {
        path: String,
    },
    Pose(PoseCommand),
}

#[derive(Args, Debug)]
struct PoseCommand {
    #[command(subcommand)]
    command: PoseSubcommand,
}

#[derive(Subcommand, Debug)]
enum PoseSubcommand {
    Models,
    Analyze {
        #[arg(long)]
        model: Option<PoseModel>,
        /// Write the report JSON here.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    Upload {
        #[arg(long, default_value_t = 200)]
        interval_ms: u64,
    },
}

/// Persisted client state for one invocation.
struct Client {
    store: Arc<FileStore>,
    sessions: SessionStore,
}

impl Client {
    fn open(state_file: PathBuf, authenticator: Authenticator) -> Self {
        let store = Arc::new(FileStore::new(state_file));
        let sessions = SessionStore::new(store.clone(), store.clone(), authenticator);
        Self { store, sessions }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).init();

    let policy = if cli.strict_passwords { PasswordPolicy::Verify } else { PasswordPolicy::Trust };
    let authenticator = Authenticator::new(Arc::new(MockDirectory::new()))
        .with_policy(policy)
        .with_delay(Duration::from_millis(cli.login_delay_ms));
    let client = Client::open(cli.state_file, authenticator);

    match cli.command {
        Command::Login { email, password, portal } => run_login(&client, &email, &password, portal).await,
        Command::Logout => run_logout(&client),
        Command::Whoami => run_whoami(&client),
        Command::Visit { path } => run_visit(&client, &path).await,
        Command::Pose(pose) => run_pose(&client, pose).await,
    }
}

async fn run_login(client: &Client, email: &str, password: &str, portal: Option<Role>) -> Result<(), CliError> {
    client.sessions.initialize();
    let identity = client.sessions.login(email, password, portal).await?;
    println!("signed in as {} <{}> ({})", identity.name, identity.email, identity.role);
    println!("redirect: {}", identity.role.dashboard_path());
    Ok(())
}

fn run_logout(client: &Client) -> Result<(), CliError> {
    client.sessions.initialize();
    let redirect = client.sessions.logout()?;
    println!("signed out");
    println!("redirect: {redirect}");
    Ok(())
}

fn run_whoami(client: &Client) -> Result<(), CliError> {
    match client.sessions.initialize().identity {
        Some(identity) => print_json(&serde_json::to_value(identity)?),
        None => {
            println!("not signed in");
            Ok(())
        }
    }
}

async fn run_visit(client: &Client, path: &str) -> Result<(), CliError> {
    client.sessions.initialize();
    let cookie = client.store.read_cookie(SESSION_KEY)?;
    let decision = boundary::check(path, cookie.as_deref());
    if decision.clear_cookie {
        client.store.write_cookie(&SessionCookie::expired())?;
    }
    println!("{}", describe_boundary(&decision));

    if decision.action == BoundaryAction::Allow {
        if let Some(area) = Area::from_path(path) {
            let mut sessions = client.sessions.subscribe();
            let guard = RouteGuard::new(area).settle(&mut sessions).await;
            println!("{}", describe_guard(guard));
        }
    }
    Ok(())
}

async fn run_pose(client: &Client, pose: PoseCommand) -> Result<(), CliError> {
    match pose.command {
        PoseSubcommand::Models => {
            for model in PoseModel::ALL {
                println!("{}", describe_model(model));
            }
            Ok(())
        }
        PoseSubcommand::Analyze { model, report } => {
            let studio = PoseStudio::load(client.store.clone(), AnalysisTiming::default());
            if let Some(model) = model {
                studio.select_model(model)?;
            }
            studio.start_camera();
            eprintln!("analyzing with {}...", studio.model());
            let analysis = studio.analyze().await?;
            studio.stop_camera();
            print_json(&serde_json::to_value(&analysis)?)?;

            if let Some(path) = report {
                let patient = client.sessions.initialize().identity.ok_or(CliError::NotSignedIn)?.name;
                let report = studio.report(&patient, DEFAULT_SESSION_LABEL)?;
                let rendered = serde_json::to_string_pretty(&report)?;
                std::fs::write(&path, rendered).map_err(|source| CliError::Write { path: path.clone(), source })?;
                eprintln!("report written to {}", path.display());
            }
            Ok(())
        }
        PoseSubcommand::Upload { interval_ms } => {
            let mut progress = simulate_upload(Duration::from_millis(interval_ms));
            while let Some(percent) = progress.recv().await {
                println!("upload {percent}%");
            }
            Ok(())
        }
    }
}

fn describe_boundary(decision: &BoundaryDecision) -> String {
    let action = match decision.action {
        BoundaryAction::Allow => "boundary: allow".to_owned(),
        BoundaryAction::Redirect(to) => format!("boundary: redirect -> {to}"),
    };
    if decision.clear_cookie { format!("{action} (cookie cleared)") } else { action }
}

fn describe_guard(decision: GuardDecision) -> String {
    match decision {
        GuardDecision::Pending => "guard: pending".to_owned(),
        GuardDecision::Render => "guard: render".to_owned(),
        GuardDecision::RedirectToLogin(to) | GuardDecision::RedirectToOwnDashboard(to) => {
            format!("guard: redirect -> {to}")
        }
    }
}

fn describe_model(model: PoseModel) -> String {
    format!("{:<10} {:<5} {}", model.as_str(), model.version(), model.description())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
