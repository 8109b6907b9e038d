mod clock;
mod config;
mod credentials;
mod error;
mod handlers;
mod lifecycle;
mod policy;
mod principals;
mod server;
mod views;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use prontuario_crypto::{generate_salt, hash_password};
use prontuario_storage::{
    CreatePrincipalParams, CreateStudentParams, HealthProfile, Role, Specialty, Store,
};
use prontuario_store_sqlite::SqliteStore;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::ServerConfig;
use handlers::auth::LoginRequest;
use handlers::entries::CreateEntryRequest;
use handlers::reports::{MonthlyReportRequest, StudentReportRequest};
use server::ProntuarioServer;

// ────────────────────────────────────── CLI Types ──────────────────────────────────────

#[derive(Parser)]
#[command(name = "prontuario-server")]
#[command(about = "Prontuario clinical-record CLI for administration and access")]
struct Cli {
    /// Database URL (sqlite://path/to/store.db). Defaults to ~/.prontuario/store.db
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Credential key returned by `login`
    #[arg(long, global = true, env = "PRONTUARIO_CREDENTIAL", hide_env_values = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or upgrade the database schema
    Migrate,
    /// Principal management commands
    Principal {
        #[command(subcommand)]
        principal_cmd: PrincipalCommand,
    },
    /// Student management commands
    Student {
        #[command(subcommand)]
        student_cmd: StudentCommand,
    },
    /// Log in and print a credential key
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PRONTUARIO_PASSWORD", hide_env_values = true)]
        password: String,
        /// Output only the key (for scripts)
        #[arg(long)]
        plain: bool,
    },
    /// Discard the current credential
    Logout,
    /// Show the principal behind the current credential
    Whoami,
    /// Credential maintenance
    Credential {
        #[command(subcommand)]
        credential_cmd: CredentialCommand,
    },
    /// Medical entry commands
    Entry {
        #[command(subcommand)]
        entry_cmd: EntryCommand,
    },
    /// Report generation
    Report {
        #[command(subcommand)]
        report_cmd: ReportCommand,
    },
}

#[derive(Subcommand)]
enum PrincipalCommand {
    /// Create a principal
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// admin, manager or health_prof
        #[arg(long)]
        role: Role,
        #[arg(long, env = "PRONTUARIO_PASSWORD", hide_env_values = true)]
        password: String,
        /// Required for a health_prof to see or write entries
        #[arg(long)]
        specialty: Option<Specialty>,
        /// Professional council registration number
        #[arg(long, requires = "specialty")]
        council_number: Option<String>,
    },
    /// Deactivate a principal; its credentials stop working immediately
    Deactivate {
        #[arg(long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum StudentCommand {
    /// Register a student
    Create {
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum CredentialCommand {
    /// Delete every credential past its lifetime
    Sweep,
}

#[derive(Subcommand)]
enum EntryCommand {
    /// List visible entries, newest first
    List {
        /// Only this student's entries
        #[arg(long)]
        student: Option<String>,
    },
    /// Show one entry
    Show { id: i64 },
    /// Write a new entry
    Create {
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        description: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Retire an entry
    Delete {
        id: i64,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReportCommand {
    /// All visible entries of one month
    Monthly {
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        month: Option<String>,
        /// Output directory (defaults to PRONTUARIO_REPORT_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// One student's entries between two dates (YYYY-MM-DD)
    Student {
        #[arg(long)]
        student: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

// ────────────────────────────────────── Commands ──────────────────────────────────────

async fn open_store(database_url: Option<&str>) -> Result<Arc<SqliteStore>, Box<dyn std::error::Error>> {
    let store = match database_url {
        Some(url) => SqliteStore::open(url).await?,
        None => SqliteStore::open_default().await?,
    };
    Ok(Arc::new(store))
}

fn require_key(key: Option<&str>) -> Result<&str, Box<dyn std::error::Error>> {
    key.ok_or_else(|| "no credential: pass --key or set PRONTUARIO_CREDENTIAL".into())
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_principal_create(
    store: &dyn Store,
    email: String,
    first_name: String,
    last_name: String,
    role: Role,
    password: String,
    specialty: Option<Specialty>,
    council_number: Option<String>,
) -> CliResult {
    if specialty.is_some() && role != Role::HealthProf {
        return Err("--specialty is only valid for health_prof principals".into());
    }
    if role == Role::HealthProf && specialty.is_none() {
        warn!("Creating health_prof without a specialty; it will see no entries");
    }

    let salt = generate_salt();
    let password_hash = hash_password(&password, &salt)?;
    let principal_id = store
        .create_principal(&CreatePrincipalParams {
            email: email.trim().to_lowercase(),
            first_name,
            last_name,
            role,
            password_hash,
            password_salt: salt.to_vec(),
            health_profile: specialty.map(|specialty| HealthProfile {
                specialty,
                council_number: council_number.unwrap_or_default(),
            }),
        })
        .await?;

    info!("Created principal {} with role {}", principal_id, role);
    println!("✓ Principal created: {principal_id}");
    Ok(())
}

async fn cmd_principal_deactivate(store: &dyn Store, email: &str) -> CliResult {
    let record = store.get_login(&email.trim().to_lowercase()).await?;
    store.set_principal_active(&record.principal_id, false).await?;
    info!("Deactivated principal {}", record.principal_id);
    println!("✓ Principal deactivated: {}", record.principal_id);
    Ok(())
}

async fn cmd_student_create(store: &dyn Store, name: &str) -> CliResult {
    let name = name.trim();
    if name.is_empty() {
        return Err("student name must not be empty".into());
    }
    let student_id = store
        .create_student(&CreateStudentParams {
            name: name.to_string(),
        })
        .await?;
    println!("✓ Student created: {student_id}");
    Ok(())
}

async fn cmd_login(server: &ProntuarioServer, email: String, password: String, plain: bool) -> CliResult {
    let response = handlers::auth::login(server, LoginRequest { email, password }).await?;
    if plain {
        println!("{}", response.key);
    } else {
        print_json(&response)?;
    }
    Ok(())
}

async fn cmd_report(
    server: &ProntuarioServer,
    rendered: prontuario_reports::RenderedReport,
    out: Option<PathBuf>,
) -> CliResult {
    let dir = out.unwrap_or_else(|| server.config.report_dir.clone());
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(&rendered.filename);
    std::fs::write(&path, &rendered.bytes)?;
    println!("✓ Report written to {}", path.display());
    Ok(())
}

async fn run(cli: Cli) -> CliResult {
    let config = ServerConfig::from_env()?;
    let store = open_store(cli.database_url.as_deref()).await?;
    let server = ProntuarioServer::new_sqlite(store.clone(), config);
    let key = cli.key.as_deref();

    match cli.command {
        Command::Migrate => {
            println!("✓ Database is up to date");
        }
        Command::Principal { principal_cmd } => match principal_cmd {
            PrincipalCommand::Create {
                email,
                first_name,
                last_name,
                role,
                password,
                specialty,
                council_number,
            } => {
                cmd_principal_create(
                    store.as_ref(),
                    email,
                    first_name,
                    last_name,
                    role,
                    password,
                    specialty,
                    council_number,
                )
                .await?;
            }
            PrincipalCommand::Deactivate { email } => {
                cmd_principal_deactivate(store.as_ref(), &email).await?;
            }
        },
        Command::Student { student_cmd } => match student_cmd {
            StudentCommand::Create { name } => cmd_student_create(store.as_ref(), &name).await?,
        },
        Command::Login {
            email,
            password,
            plain,
        } => cmd_login(&server, email, password, plain).await?,
        Command::Logout => {
            handlers::auth::logout(&server, require_key(key)?).await?;
            println!("✓ Logged out");
        }
        Command::Whoami => {
            print_json(&handlers::auth::check_auth(&server, require_key(key)?).await?)?;
        }
        Command::Credential { credential_cmd } => match credential_cmd {
            CredentialCommand::Sweep => {
                let removed = server.credentials().sweep().await?;
                println!("✓ Removed {removed} expired credentials");
            }
        },
        Command::Entry { entry_cmd } => {
            let key = require_key(key)?;
            match entry_cmd {
                EntryCommand::List { student: Some(student) } => {
                    print_json(
                        &handlers::entries::list_student_entries(&server, key, &student).await?,
                    )?;
                }
                EntryCommand::List { student: None } => {
                    print_json(&handlers::entries::list_entries(&server, key, None).await?)?;
                }
                EntryCommand::Show { id } => {
                    print_json(&handlers::entries::get_entry(&server, key, id).await?)?;
                }
                EntryCommand::Create {
                    student,
                    description,
                    notes,
                } => {
                    let entry = handlers::entries::create_entry(
                        &server,
                        key,
                        CreateEntryRequest {
                            student_id: student,
                            description,
                            notes,
                        },
                    )
                    .await?;
                    print_json(&entry)?;
                }
                EntryCommand::Delete { id, reason } => {
                    let entry =
                        handlers::entries::delete_entry(&server, key, id, reason.as_deref()).await?;
                    print_json(&entry)?;
                }
            }
        }
        Command::Report { report_cmd } => {
            let key = require_key(key)?;
            match report_cmd {
                ReportCommand::Monthly { year, month, out } => {
                    let rendered = handlers::reports::monthly_report(
                        &server,
                        key,
                        MonthlyReportRequest { year, month },
                    )
                    .await?;
                    cmd_report(&server, rendered, out).await?;
                }
                ReportCommand::Student {
                    student,
                    start,
                    end,
                    out,
                } => {
                    let rendered = handlers::reports::student_report(
                        &server,
                        key,
                        StudentReportRequest {
                            student_id: student,
                            start_date: start,
                            end_date: end,
                        },
                    )
                    .await?;
                    cmd_report(&server, rendered, out).await?;
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> CliResult {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli).await
}
