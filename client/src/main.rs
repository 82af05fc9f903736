//! `logitrack` command: drive a LogiTrack account from the terminal.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use client::domain::{
    Amount, Navigation, Role, Transaction, TransactionChanges, TransactionDraft, TransactionId,
};
use client::outbound::notifications::TerminalNotifier;
use client::{Application, ClientSettings};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroizing;

/// `logitrack` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "logitrack",
    about = "Manage LogiTrack shipments from the command line",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and remember the session.
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account.
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and forget the session.
    Logout,
    /// Show the signed-in profile.
    Whoami,
    /// List your transactions.
    List,
    /// Show one transaction.
    Show { id: u64 },
    /// Request a new shipment.
    Create(CreateArgs),
    /// Change transaction details.
    Update {
        id: u64,
        #[command(flatten)]
        changes: ChangeArgs,
    },
    /// Delete a transaction.
    Delete { id: u64 },
    /// Pay for a transaction.
    Pay { id: u64 },
    /// Set the delivery status.
    SetStatus { id: u64, status: String },
    /// Set the delivery date.
    SetDate { id: u64, date: String },
    /// Set the amount due (administrators only).
    SetAmount { id: u64, amount: f64 },
    /// Resolve a route and print where navigation ends.
    Open { path: String },
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long = "kind", value_name = "type")]
    kind: String,
    #[arg(long)]
    date: String,
    #[arg(long = "from", value_name = "city")]
    source_city: String,
    #[arg(long = "to", value_name = "city")]
    destination_city: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    amount: Option<f64>,
}

#[derive(Debug, Args)]
struct ChangeArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long = "kind", value_name = "type")]
    kind: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long = "from", value_name = "city")]
    source_city: Option<String>,
    #[arg(long = "to", value_name = "city")]
    destination_city: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

impl From<ChangeArgs> for TransactionChanges {
    fn from(args: ChangeArgs) -> Self {
        Self {
            name: args.name,
            kind: args.kind,
            date: args.date,
            source_city: args.source_city,
            destination_city: args.destination_city,
            description: args.description,
        }
    }
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = ClientSettings::load_from_iter([OsString::from("logitrack")])
        .map_err(|error| io::Error::other(format!("load configuration: {error}")))?;
    let app = Application::from_settings(&settings, Arc::new(TerminalNotifier::stderr()))
        .map_err(io::Error::other)?;

    let outcome = run(&app, args.command, &mut io::stdout().lock()).await;
    app.process_events().await;
    outcome
}

async fn run(app: &Application, command: Command, out: &mut impl Write) -> io::Result<()> {
    match command {
        Command::Login { username, password } => {
            enter(app, "/login").await?;
            let password = Zeroizing::new(password);
            let user = app
                .session()
                .login(&username, &password)
                .await
                .map_err(io::Error::other)?;
            writeln!(out, "signed in as {}", user.username())
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            enter(app, "/register").await?;
            let password = Zeroizing::new(password);
            let message = app
                .session()
                .register(&username, &email, &password)
                .await
                .map_err(io::Error::other)?;
            writeln!(out, "{message}")
        }
        Command::Logout => {
            app.session().end_session().await;
            writeln!(out, "signed out")
        }
        Command::Whoami => {
            enter(app, "/profile").await?;
            match app.session().snapshot().user() {
                Some(user) => {
                    let roles: Vec<&str> = user.roles().iter().map(Role::as_str).collect();
                    writeln!(
                        out,
                        "{} <{}> [{}]",
                        user.username(),
                        user.email(),
                        roles.join(", ")
                    )
                }
                None => writeln!(out, "not signed in"),
            }
        }
        Command::List => {
            enter(app, "/transactions").await?;
            app.transactions()
                .fetch_transactions()
                .await
                .map_err(io::Error::other)?;
            for transaction in app.transactions().transactions() {
                write_summary(out, &transaction)?;
            }
            Ok(())
        }
        Command::Show { id } => {
            enter(app, &transaction_path(id)).await?;
            let transaction = app
                .transactions()
                .get_transaction(TransactionId::new(id))
                .await
                .map_err(io::Error::other)?;
            write_details(out, &transaction)
        }
        Command::Create(args) => {
            enter(app, "/transactions/create").await?;
            let amount = args
                .amount
                .map(Amount::new)
                .transpose()
                .map_err(io::Error::other)?;
            let draft = TransactionDraft {
                name: args.name,
                kind: args.kind,
                date: args.date,
                source_city: args.source_city,
                destination_city: args.destination_city,
                description: args.description,
                amount,
            };
            let message = app
                .transactions()
                .create_transaction(&draft)
                .await
                .map_err(io::Error::other)?;
            writeln!(out, "{message}")
        }
        Command::Update { id, changes } => {
            enter(app, &transaction_path(id)).await?;
            let message = app
                .transactions()
                .update_transaction(TransactionId::new(id), &changes.into())
                .await
                .map_err(io::Error::other)?;
            writeln!(out, "{message}")
        }
        Command::Delete { id } => {
            enter(app, &transaction_path(id)).await?;
            let message = app
                .transactions()
                .delete_transaction(TransactionId::new(id))
                .await
                .map_err(io::Error::other)?;
            writeln!(out, "{message}")
        }
        Command::Pay { id } => {
            enter(app, &transaction_path(id)).await?;
            let message = app
                .transactions()
                .pay_transaction(TransactionId::new(id))
                .await
                .map_err(io::Error::other)?;
            writeln!(out, "{message}")
        }
        Command::SetStatus { id, status } => {
            enter(app, &transaction_path(id)).await?;
            let message = app
                .transactions()
                .update_delivery_status(TransactionId::new(id), &status)
                .await
                .map_err(io::Error::other)?;
            writeln!(out, "{message}")
        }
        Command::SetDate { id, date } => {
            enter(app, &transaction_path(id)).await?;
            let message = app
                .transactions()
                .update_delivery_date(TransactionId::new(id), &date)
                .await
                .map_err(io::Error::other)?;
            writeln!(out, "{message}")
        }
        Command::SetAmount { id, amount } => {
            enter(app, "/admin").await?;
            let message = app
                .transactions()
                .update_amount(TransactionId::new(id), amount)
                .await
                .map_err(io::Error::other)?;
            writeln!(out, "{message}")
        }
        Command::Open { path } => {
            let navigation = app.navigate(&path).await.map_err(io::Error::other)?;
            let route = navigation.location.route();
            writeln!(
                out,
                "{} ({}) view={}",
                navigation.location.path(),
                route.name(),
                route.view()
            )?;
            if let Some(from) = navigation.redirected_from {
                writeln!(out, "redirected from {from}")?;
            }
            Ok(())
        }
    }
}

/// Navigate to `path`, failing when the guard sends the user elsewhere.
async fn enter(app: &Application, path: &str) -> io::Result<Navigation> {
    let navigation = app.navigate(path).await.map_err(io::Error::other)?;
    if navigation.was_redirected() {
        return Err(io::Error::other(format!(
            "{path} is not available; redirected to {}",
            navigation.location.path()
        )));
    }
    Ok(navigation)
}

fn transaction_path(id: u64) -> String {
    format!("/transactions/{id}")
}

fn write_summary(out: &mut impl Write, transaction: &Transaction) -> io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{} -> {}\t{}\t{}\t{}",
        transaction.id,
        transaction.name,
        transaction.source_city,
        transaction.destination_city,
        transaction.delivery_status,
        transaction.amount,
        if transaction.is_paid() { "paid" } else { "unpaid" }
    )
}

fn write_details(out: &mut impl Write, transaction: &Transaction) -> io::Result<()> {
    writeln!(out, "id:               {}", transaction.id)?;
    writeln!(out, "name:             {}", transaction.name)?;
    writeln!(out, "type:             {}", transaction.kind)?;
    writeln!(out, "owner:            {}", transaction.user)?;
    writeln!(out, "date:             {}", transaction.date)?;
    writeln!(out, "delivery date:    {}", transaction.delivery_date)?;
    writeln!(
        out,
        "route:            {} -> {}",
        transaction.source_city, transaction.destination_city
    )?;
    writeln!(out, "status:           {}", transaction.internal_status)?;
    writeln!(out, "delivery status:  {}", transaction.delivery_status)?;
    writeln!(out, "amount:           {}", transaction.amount)?;
    if !transaction.description.is_empty() {
        writeln!(out, "description:      {}", transaction.description)?;
    }
    Ok(())
}
