use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shellsquid_console::models::{HandlerProtocol, Record, RecordDraft, UserDraft};
use shellsquid_console::{ClientConfig, ClientError, Console, Navigator};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Filter variable for log output.
const LOG_ENV: &str = "SHELLSQUID_LOG";

#[derive(Parser, Debug)]
#[command(name = "squidctl")]
#[command(author, version, about = "Manage shellsquid records and users", long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server URL, overriding the config file
    #[arg(long, global = true, env = "SHELLSQUID_SERVER")]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SHELLSQUID_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Drop the stored session token
    Logout,
    /// Show session state and server info
    Status,
    /// Show server version and proxy listeners
    Info,
    /// Manage records
    #[command(subcommand)]
    Records(RecordCommand),
    /// Manage users
    #[command(subcommand)]
    Users(UserCommand),
}

#[derive(Subcommand, Debug)]
enum RecordCommand {
    List,
    Show {
        id: String,
    },
    New {
        #[arg(long)]
        fqdn: String,
        #[arg(long)]
        handler_host: String,
        #[arg(long)]
        handler_port: u16,
        #[arg(long, default_value = "http")]
        handler_protocol: HandlerProtocol,
    },
    Blacklist {
        id: String,
    },
    Unblacklist {
        id: String,
    },
    /// Forget every client address seen for the record
    ClearClients {
        id: String,
    },
    /// Reassign the record to the user with this email
    Owner {
        id: String,
        email: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    List,
    /// Show a user and the records it owns
    Show {
        id: String,
    },
    New {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SHELLSQUID_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Passwd {
        id: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    Delete {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }

    let console = Console::open(config)?;
    match cli.command {
        Command::Login { email, password } => match console.login(&email, &password).await {
            Ok(route) => println!("Logged in as {email} ({route})"),
            Err(message) => bail!(message),
        },
        Command::Logout => {
            console.logout();
            println!("Logged out");
        }
        Command::Status => status(&console).await,
        Command::Info => {
            if !console.check_authenticated().await {
                bail!("Not logged in");
            }
            match console.info() {
                Some(info) => print_info(&info),
                None => bail!("Server info unavailable"),
            }
        }
        Command::Records(cmd) => records(&console, cmd).await?,
        Command::Users(cmd) => users(&console, cmd).await?,
    }
    Ok(())
}

async fn status(console: &Console) {
    if !console.check_authenticated().await {
        println!("Not logged in");
        return;
    }
    println!("Logged in to {}", console.config().server_url);
    if let Some(expiry) = console.guard().current_token().and_then(|t| t.expires_at()) {
        println!("Session expires {}", expiry.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(info) = console.info() {
        print_info(&info);
    }
}

fn print_info(info: &shellsquid_console::models::ServerInfo) {
    println!("shellsquid {}", info.version);
    for (name, listener) in [("ssl", &info.proxy.ssl), ("http", &info.proxy.http)] {
        let state = if listener.enabled { "enabled" } else { "disabled" };
        println!("  {name:<5} {state:<9} {}", listener.listener);
    }
}

fn print_record(record: &Record) {
    println!(
        "{}  {}  -> {}://{}:{}  owner={}  blacklist={}  clients={}",
        record.id,
        record.fqdn,
        record.handler_protocol,
        record.handler_host,
        record.handler_port,
        record.owner.email,
        record.blacklist,
        record.clients.len()
    );
}

/// Turn a failed call into the message the notification center shows.
fn failure(console: &Console, err: ClientError) -> anyhow::Error {
    if err.is_permission() {
        return anyhow::anyhow!("Not logged in (now at {})", console.router().current());
    }
    match console.notifications().snapshot().error_message {
        Some(message) => anyhow::anyhow!(message),
        None => err.into(),
    }
}

async fn records(console: &Console, cmd: RecordCommand) -> Result<()> {
    match cmd {
        RecordCommand::List => {
            let records = console.records().await.map_err(|e| failure(console, e))?;
            records.iter().for_each(print_record);
        }
        RecordCommand::Show { id } => {
            let screen = console.open_record(&id).await.map_err(|e| failure(console, e))?;
            print_record(screen.record());
            if screen.owner().is_none() {
                println!("  owner {} no longer resolves to a user", screen.record().owner.id);
            }
            for client in &screen.record().clients {
                println!("  client {client}");
            }
        }
        RecordCommand::New {
            fqdn,
            handler_host,
            handler_port,
            handler_protocol,
        } => {
            let draft = RecordDraft {
                fqdn,
                handler_host,
                handler_port,
                handler_protocol,
            };
            let route = console.new_record(&draft).await.map_err(|e| failure(console, e))?;
            println!("Created {route}");
        }
        RecordCommand::Blacklist { id } => set_blacklist(console, &id, true).await?,
        RecordCommand::Unblacklist { id } => set_blacklist(console, &id, false).await?,
        RecordCommand::ClearClients { id } => {
            let mut screen = console.open_record(&id).await.map_err(|e| failure(console, e))?;
            screen.clear_clients().await.map_err(|e| failure(console, e))?;
            println!("Cleared clients of {id}");
        }
        RecordCommand::Owner { id, email } => {
            let mut screen = console.open_record(&id).await.map_err(|e| failure(console, e))?;
            if !screen.save_owner(&email).await.map_err(|e| failure(console, e))? {
                println!("No user with email {email}; owner unchanged");
            }
            print_record(screen.record());
        }
        RecordCommand::Delete { id } => {
            let screen = console.open_record(&id).await.map_err(|e| failure(console, e))?;
            screen.delete().await.map_err(|e| failure(console, e))?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

async fn set_blacklist(console: &Console, id: &str, blacklist: bool) -> Result<()> {
    let mut screen = console.open_record(id).await.map_err(|e| failure(console, e))?;
    screen.set_blacklist(blacklist).await.map_err(|e| failure(console, e))?;
    print_record(screen.record());
    Ok(())
}

async fn users(console: &Console, cmd: UserCommand) -> Result<()> {
    match cmd {
        UserCommand::List => {
            let users = console.users().await.map_err(|e| failure(console, e))?;
            for user in users {
                println!("{}  {}", user.id, user.email);
            }
        }
        UserCommand::Show { id } => {
            let screen = console.open_user(&id).await.map_err(|e| failure(console, e))?;
            println!("{}  {}", screen.user().id, screen.user().email);
            screen.records().iter().for_each(print_record);
        }
        UserCommand::New { email, password } => {
            let draft = UserDraft { email, password };
            let route = console.new_user(&draft).await.map_err(|e| failure(console, e))?;
            println!("Created user ({route})");
        }
        UserCommand::Passwd { id, password, confirm } => {
            let mut screen = console.open_user(&id).await.map_err(|e| failure(console, e))?;
            screen.password = password;
            screen.confirm_password = confirm;
            screen.change_password().await;
            if let Some(message) = screen.error() {
                bail!(message);
            }
            if let Some(message) = screen.success() {
                println!("{message}");
            }
        }
        UserCommand::Delete { id } => {
            let screen = console.open_user(&id).await.map_err(|e| failure(console, e))?;
            screen.delete().await.map_err(|e| failure(console, e))?;
            println!("Deleted user {id}");
        }
    }
    Ok(())
}
