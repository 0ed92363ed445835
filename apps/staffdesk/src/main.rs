use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mimalloc::MiMalloc;
use paging::{PageRequest, SortDir};
use personnel::config::PersonnelConfig;
use personnel::contract::model::{PeopleFilter, PeopleQuery, TaskStatus};
use personnel::domain::ports::SystemClock;
use personnel::infra::token_store::FileTokenStore;
use personnel::{build_workspace, Endpoints, Workspace};
use runtime::{AppConfig, CliArgs};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Staffdesk - personnel directory client
#[derive(Parser)]
#[command(name = "staffdesk")]
#[command(about = "Staffdesk - command line client for the personnel directory")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Personnel API base URL (overrides config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Authentication service base URL (overrides config)
    #[arg(long, global = true)]
    auth_url: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        /// Falls back to the STAFFDESK_PASSWORD environment variable
        #[arg(long, env = "STAFFDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Print the dashboard for the signed-in role
    Dashboard,
    /// Search the people directory
    People {
        #[arg(long, default_value_t = 0)]
        page: u64,
        #[arg(long, default_value_t = 10)]
        size: u64,
        #[arg(long, default_value = "id")]
        sort_by: String,
        #[arg(long)]
        desc: bool,
        /// Free-text search
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        department_id: Option<i64>,
        #[arg(long)]
        title_id: Option<i64>,
        #[arg(long)]
        gender: Option<String>,
    },
    /// Move a task along its lifecycle
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Check configuration
    Check,
}

#[derive(Subcommand)]
enum TaskAction {
    /// Advance a task one step
    Advance {
        id: i64,
        #[arg(long, value_enum)]
        to: Step,
    },
    /// Close a completed task
    Close { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum Step {
    InProgress,
    Completed,
}

impl From<Step> for TaskStatus {
    fn from(step: Step) -> Self {
        match step {
            Step::InProgress => TaskStatus::InProgress,
            Step::Completed => TaskStatus::Completed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        api_base_url: cli.api_url.clone(),
        auth_base_url: cli.auth_url.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.client.home_dir));
    tracing::info!("Staffdesk starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command {
        None => bail!("no command given; see --help"),
        Some(command) => run_command(command, &config).await,
    }
}

async fn run_command(command: Commands, config: &AppConfig) -> Result<()> {
    let workspace = open_workspace(config)?;
    match command {
        Commands::Login { email, password } => {
            let identity = workspace.try_login(&email, &password).await?;
            println!("Signed in as {} ({})", identity.email, identity.role);
        }
        Commands::Logout => {
            workspace.logout();
            println!("Signed out");
        }
        Commands::Whoami => {
            require_session(&workspace).await?;
            let identity = workspace.identity().context("session has no identity")?;
            println!("{}", serde_json::to_string_pretty(&identity)?);
        }
        Commands::Dashboard => {
            require_session(&workspace).await?;
            let dashboard = workspace.dashboard(workspace.today())?;
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        }
        Commands::People {
            page,
            size,
            sort_by,
            desc,
            q,
            department_id,
            title_id,
            gender,
        } => {
            require_session(&workspace).await?;
            let direction = if desc { SortDir::Desc } else { SortDir::Asc };
            let query = PeopleQuery {
                page: PageRequest::new(page, size).sorted_by(sort_by, direction),
                filter: PeopleFilter {
                    q,
                    email: None,
                    department_id,
                    title_id,
                    gender,
                },
            };
            let result = workspace.search_people(&query).await?;
            for p in &result.items {
                let dept = p.department.as_ref().map(|d| d.name.as_str()).unwrap_or("-");
                println!("{:>6}  {:<32}  {:<36}  {}", p.id, p.full_name(), p.email, dept);
            }
            println!(
                "page {} of {} ({} people)",
                result.page_info.number + 1,
                result.total_pages().max(1),
                result.page_info.total_elements
            );
        }
        Commands::Task { action } => {
            require_session(&workspace).await?;
            let task = match action {
                TaskAction::Advance { id, to } => workspace.advance_task(id, to.into()).await?,
                TaskAction::Close { id } => workspace.close_task(id).await?,
            };
            println!("Task {} is now {}", task.id, task.status);
        }
        Commands::Check => check_config(config)?,
    }
    Ok(())
}

fn open_workspace(config: &AppConfig) -> Result<Workspace> {
    let module_cfg: PersonnelConfig = config.module_config("personnel")?;
    let token_path = config.home_dir().join(&module_cfg.token_file);

    let endpoints = Endpoints {
        auth_base_url: config.client.auth_base_url.clone(),
        api_base_url: config.client.api_base_url.clone(),
        timeout: config.client.request_timeout(),
    };
    tracing::debug!(token = %token_path.display(), "Using token file");

    build_workspace(
        &module_cfg,
        &endpoints,
        Arc::new(FileTokenStore::new(token_path)),
        Arc::new(SystemClock),
    )
}

async fn require_session(workspace: &Workspace) -> Result<()> {
    if !workspace.restore().await {
        bail!("not signed in; run `staffdesk login` first");
    }
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    let module_cfg: PersonnelConfig = config.module_config("personnel")?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Personnel cache TTL: {}s", module_cfg.cache_ttl_sec);
    println!("{}", config.to_yaml()?);
    Ok(())
}
