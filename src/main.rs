//! rag-console: command-line console for the RAG document service.
//!
//! Usage:
//!   rag-console login -e admin@example.com -p secret123
//!   rag-console open /            # role-dispatched dashboard
//!   rag-console upload -f report.pdf
//!   rag-console admin org <org-id>
//!   rag-console logout

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use rag_console::config::Config;
use rag_console::console::{
    format_timestamp, ActionOutcome, AdminConsole, OrgDetailConsole, TenantConsole,
};
use rag_console::credential::{FileCredentialStore, SharedCredentials};
use rag_console::error::Result;
use rag_console::models::{ApiKeyInfo, OrgLimits};
use rag_console::routing::{dispatch, ConsoleKind, Route};
use rag_console::session::{self, SessionState};
use rag_console::{logging, App, Gateway, ResourceClient, Screen};

#[derive(Parser)]
#[command(name = "rag-console")]
#[command(about = "Console for the multi-tenant RAG document service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL (overrides RAG_CONSOLE_API_BASE)
    #[arg(long)]
    api_base: Option<String>,

    /// Credential file (overrides RAG_CONSOLE_TOKEN_DIR)
    #[arg(long)]
    token_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the first administrator
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    Logout,
    /// Resolve the stored credential to a user
    Whoami,
    /// Open a console path: /, /org/<id>, /admin/vector, /login
    Open {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Upload a document to your org
    Upload {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Ask your org's documents a question
    Ask {
        #[arg(short, long)]
        question: String,
    },
    /// Your org's API keys
    #[command(subcommand)]
    Keys(KeyCommands),
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand)]
enum KeyCommands {
    List,
    Create,
}

#[derive(Subcommand)]
enum AdminCommands {
    /// All orgs with upload counts
    Orgs,
    /// Org detail: prompts, limits, keys, uploads
    Org { id: String },
    CreateOrg {
        #[arg(short, long)]
        name: String,
    },
    /// Create an org together with its first user
    RegisterOrg {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Show the default RAG prompt
    Prompt,
    /// Set an org's custom prompt; empty content deletes it
    SetPrompt {
        id: String,
        #[arg(short, long, default_value = "")]
        content: String,
    },
    ClearPrompt { id: String },
    SetLimits {
        id: String,
        #[arg(long)]
        max_pdfs: Option<u32>,
        #[arg(long)]
        max_chars: Option<u64>,
        #[arg(long)]
        upload_enabled: Option<bool>,
    },
    /// Issue a new key for an org, revoking the previous one
    CreateKey { id: String },
    Keys { id: String },
    /// Vector store statistics and recent chunks
    Vector,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base;
    }
    let _guard = logging::init(&config)?;
    debug!(api_base = %config.api_base, "console starting");

    let credentials: SharedCredentials = match cli.token_file {
        Some(path) => Arc::new(FileCredentialStore::at(path)),
        None => Arc::new(FileCredentialStore::in_dir(&config.token_dir)),
    };
    let gateway = Gateway::new(config.api_base.clone(), config.timeout, credentials)?;
    let app = App::new(ResourceClient::new(gateway));

    let code = match cli.command {
        Commands::Register { email, password } => {
            match app.client().register(&email, &password).await {
                Ok(res) => {
                    println!("Registered {} ({})", res.user.email, res.user.role);
                    show(&app.open(Route::Home).await)
                }
                Err(e) => fail(format!("Registration failed: {}", e)),
            }
        }
        Commands::Login { email, password } => {
            match app.client().login(&email, &password).await {
                Ok(res) => {
                    println!("Signed in as {} ({})", res.user.email, res.user.role);
                    show(&app.open(Route::Home).await)
                }
                Err(e) => fail(format!("Login failed: {}", e)),
            }
        }
        Commands::Logout => {
            app.client().logout()?;
            println!("Signed out.");
            ExitCode::SUCCESS
        }
        Commands::Whoami => match session::resolve(app.client()).await {
            SessionState::Authenticated(user) => {
                let console = match dispatch(&user) {
                    ConsoleKind::Admin => "admin",
                    ConsoleKind::Tenant => "tenant",
                };
                println!("{} | role {} | {} console", user.email, user.role, console);
                if let Some(org_id) = &user.org_id {
                    println!("org {}", org_id);
                }
                ExitCode::SUCCESS
            }
            SessionState::Unauthenticated => fail("Not signed in."),
        },
        Commands::Open { path } => show(&app.open(Route::from_path(&path)).await),
        Commands::Upload { file } => {
            let mut console = match tenant(&app).await {
                Ok(console) => console,
                Err(code) => return Ok(code),
            };
            let bytes = tokio::fs::read(&file).await?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document.pdf".to_string());
            let outcome = console.upload(&filename, bytes).await;
            let done = outcome.is_done();
            let code = report(outcome);
            if done {
                println!("{} documents uploaded", console.uploads().len());
            }
            code
        }
        Commands::Ask { question } => match tenant(&app).await {
            Ok(console) => report(console.ask(&question).await),
            Err(code) => code,
        },
        Commands::Keys(cmd) => {
            let mut console = match tenant(&app).await {
                Ok(console) => console,
                Err(code) => return Ok(code),
            };
            match cmd {
                KeyCommands::List => {
                    print_keys(console.api_keys());
                    ExitCode::SUCCESS
                }
                KeyCommands::Create => {
                    let code = report(console.create_api_key().await);
                    reveal(console.take_revealed_key());
                    code
                }
            }
        }
        Commands::Admin(cmd) => admin_command(&app, cmd).await,
    };
    Ok(code)
}

async fn admin_command(app: &App, cmd: AdminCommands) -> ExitCode {
    match cmd {
        AdminCommands::Orgs => show(&app.open(Route::Home).await),
        AdminCommands::Org { id } => show(&app.open(Route::OrgDetail(id)).await),
        AdminCommands::Vector => show(&app.open(Route::VectorStore).await),
        AdminCommands::CreateOrg { name } => match admin(app).await {
            Ok(mut console) => report(console.create_org(&name).await),
            Err(code) => code,
        },
        AdminCommands::RegisterOrg {
            name,
            email,
            password,
        } => match admin(app).await {
            Ok(mut console) => {
                let code = report(console.register_org_user(&name, &email, &password).await);
                print!("{}", console);
                code
            }
            Err(code) => code,
        },
        AdminCommands::Prompt => match default_prompt(app).await {
            Some(content) => {
                println!("{}", content);
                ExitCode::SUCCESS
            }
            None => ExitCode::FAILURE,
        },
        AdminCommands::SetPrompt { id, content } => match org_detail(app, id).await {
            Ok(mut console) => report(console.set_prompt(&content).await),
            Err(code) => code,
        },
        AdminCommands::ClearPrompt { id } => match org_detail(app, id).await {
            Ok(mut console) => report(console.delete_prompt().await),
            Err(code) => code,
        },
        AdminCommands::SetLimits {
            id,
            max_pdfs,
            max_chars,
            upload_enabled,
        } => match org_detail(app, id).await {
            Ok(mut console) => {
                let limits = OrgLimits {
                    max_pdfs,
                    max_chars,
                    upload_enabled: upload_enabled.or(console.limits().upload_enabled),
                };
                let code = report(console.set_limits(&limits).await);
                print!("{}", console);
                code
            }
            Err(code) => code,
        },
        AdminCommands::CreateKey { id } => match org_detail(app, id).await {
            Ok(mut console) => {
                let code = report(console.create_api_key().await);
                reveal(console.take_revealed_key());
                code
            }
            Err(code) => code,
        },
        AdminCommands::Keys { id } => match org_detail(app, id).await {
            Ok(console) => {
                print_keys(console.api_keys());
                ExitCode::SUCCESS
            }
            Err(code) => code,
        },
    }
}

/// Default prompt, fetched behind the usual gate and session check.
async fn default_prompt(app: &App) -> Option<String> {
    admin(app).await.ok()?;
    match app.client().default_prompt().await {
        Ok(res) => Some(res.content),
        Err(e) => {
            fail(e);
            None
        }
    }
}

async fn tenant(app: &App) -> std::result::Result<TenantConsole, ExitCode> {
    match app.open(Route::Home).await {
        Screen::Tenant(console) => Ok(console),
        Screen::Admin(_) => Err(fail("This command needs a tenant account.")),
        other => Err(show(&other)),
    }
}

async fn admin(app: &App) -> std::result::Result<AdminConsole, ExitCode> {
    match app.open(Route::Home).await {
        Screen::Admin(console) => Ok(console),
        Screen::Tenant(_) => Err(fail("This command needs an administrator account.")),
        other => Err(show(&other)),
    }
}

async fn org_detail(app: &App, id: String) -> std::result::Result<OrgDetailConsole, ExitCode> {
    match app.open(Route::OrgDetail(id)).await {
        Screen::OrgDetail(console) => Ok(console),
        other => Err(show(&other)),
    }
}

fn show(screen: &Screen) -> ExitCode {
    print!("{}", screen);
    match screen {
        Screen::Login | Screen::Failed { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

fn report(outcome: ActionOutcome) -> ExitCode {
    match outcome {
        ActionOutcome::Done(message) => {
            println!("{}", message);
            ExitCode::SUCCESS
        }
        ActionOutcome::Inline(message) => fail(message),
        ActionOutcome::SignedOut => fail("Session expired. Sign in again with `rag-console login`."),
    }
}

fn print_keys(keys: &[ApiKeyInfo]) {
    if keys.is_empty() {
        println!("No API keys.");
    }
    for key in keys {
        println!("{}", key_line(key));
    }
}

fn key_line(key: &ApiKeyInfo) -> String {
    format!("{}  {}", key.key_prefix, format_timestamp(key.created_at.as_deref()))
}

fn reveal(key: Option<String>) {
    if let Some(key) = key {
        println!("Copy this key now. It won't be shown again:");
        println!("{}", key);
    }
}

fn fail(message: impl std::fmt::Display) -> ExitCode {
    eprintln!("error: {}", message);
    ExitCode::FAILURE
}
