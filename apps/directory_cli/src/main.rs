use std::{process::ExitCode, time::Duration};

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    EmployeeQuery, EmployeeStore, StoreConfig, StoreError, StoreEvent, SyncPolicy,
};
use shared::domain::{Department, EmployeeForm, EmployeeStatus};
use tokio::sync::broadcast;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod output;

const DEFAULT_COLLECTION_URL: &str = "http://127.0.0.1:8787/employees";

#[derive(Parser, Debug)]
#[command(name = "directory-cli", about = "Browse and edit the employee directory")]
struct Cli {
    #[arg(long, env = "DIRECTORY_COLLECTION_URL", default_value = DEFAULT_COLLECTION_URL)]
    collection_url: String,
    #[arg(long, env = "DIRECTORY_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,
    /// Reload the whole directory after every write instead of patching it.
    #[arg(long)]
    refetch: bool,
    /// Print employees as JSON instead of a table.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List employees, optionally filtered.
    List(ListArgs),
    Create(EmployeeArgs),
    /// Edit the employee with the given email; omitted fields keep their value.
    Update {
        #[arg(value_name = "EMAIL")]
        key: String,
        #[command(flatten)]
        fields: EmployeeArgs,
    },
    Delete {
        #[arg(value_name = "EMAIL")]
        key: String,
    },
}

#[derive(Args, Debug, Default)]
struct ListArgs {
    /// Matches name, email or role.
    #[arg(long, short)]
    query: Option<String>,
    #[arg(long)]
    department: Option<Department>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    status: Option<EmployeeStatus>,
}

#[derive(Args, Debug, Default)]
struct EmployeeArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    status: Option<EmployeeStatus>,
}

impl EmployeeArgs {
    /// Overlays the given fields onto `base`.
    fn apply_to(self, mut base: EmployeeForm) -> EmployeeForm {
        if let Some(v) = self.name {
            base.name = v;
        }
        if let Some(v) = self.email {
            base.email = v;
        }
        if let Some(v) = self.department {
            base.department = v;
        }
        if let Some(v) = self.role {
            base.role = v;
        }
        if self.status.is_some() {
            base.status = self.status;
        }
        base
    }
}

impl From<ListArgs> for EmployeeQuery {
    fn from(args: ListArgs) -> Self {
        Self {
            text: args.query,
            department: args.department,
            role: args.role,
            status: args.status,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config = StoreConfig {
        collection_url: cli.collection_url,
        timeout: Duration::from_secs(cli.timeout_secs),
        policy: if cli.refetch {
            SyncPolicy::Refetch
        } else {
            SyncPolicy::Merge
        },
    };
    debug!(url = %config.collection_url, policy = ?config.policy, "connecting to directory");
    let store = match EmployeeStore::connect(&config) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("failed to set up directory client: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut events = store.subscribe_events();

    let loaded = store.load().await;
    report(&mut events);
    if loaded.is_err() {
        return ExitCode::FAILURE;
    }

    let outcome = run(&store, cli.command, cli.json).await;
    report(&mut events);
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(message) = unreported(&err) {
                eprintln!("{message}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(store: &EmployeeStore, command: Command, json: bool) -> Result<()> {
    let shown = match command {
        Command::List(args) => store.search(&args.into()).await,
        Command::Create(fields) => {
            store.create(&fields.apply_to(EmployeeForm::default())).await?;
            store.employees().await
        }
        Command::Update { key, fields } => {
            let existing = store
                .find(&key)
                .await
                .ok_or_else(|| anyhow!("no employee with email {key}"))?;
            store.update(&key, &fields.apply_to(existing.to_form())).await?;
            store.employees().await
        }
        Command::Delete { key } => {
            store.delete(&key).await?;
            store.employees().await
        }
    };

    if json {
        output::print_json(&shown)?;
    } else {
        output::print_table(&shown);
    }
    Ok(())
}

fn report(events: &mut broadcast::Receiver<StoreEvent>) {
    while let Ok(event) = events.try_recv() {
        eprintln!("{}", output::notification(&event));
    }
}

/// Store failures already reached the user as notifications.
fn unreported(err: &anyhow::Error) -> Option<String> {
    match err.downcast_ref::<StoreError>() {
        Some(_) => None,
        None => Some(format!("error: {err:#}")),
    }
}
