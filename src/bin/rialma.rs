use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use rialma_console::{
    AuthOutcome, ClientConfig, ConsoleClient, FileStorage, NewGroup, NewUser, RefreshOutcome,
    ReqwestTransport, StorageSessionRepository, UserId,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type Client = ConsoleClient<ReqwestTransport, StorageSessionRepository<FileStorage>>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Console(#[from] rialma_console::Error),
    #[error("login failed: {0}")]
    LoginFailed(String),
    #[error("session could not be refreshed; log in again")]
    RefreshFailed,
    #[error("not logged in")]
    NotLoggedIn,
    #[error("invalid --api-url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "rialma", about = "Rialma console API client")]
struct Cli {
    #[arg(long, env = "RIALMA_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "RIALMA_SESSION_DIR", default_value = ".rialma")]
    session_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        email: String,
        #[arg(long, env = "RIALMA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    Refresh,
    Users(UsersCommand),
    Groups(GroupsCommand),
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    /// Self-service registration (no session needed).
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "RIALMA_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        mobile: Option<String>,
        #[arg(long, default_value_t = false)]
        must_change_password: bool,
    },
    Block {
        id: i64,
    },
    Unblock {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct GroupsCommand {
    #[command(subcommand)]
    command: GroupsSubcommand,
}

#[derive(Subcommand, Debug)]
enum GroupsSubcommand {
    List,
    Create {
        code: String,
        description: String,
    },
    Delete {
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Load .env (if present)
    let _ = dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.api_url {
        Some(url) => ClientConfig::new(url.parse()?),
        None => ClientConfig::from_env()?,
    };
    let sessions = StorageSessionRepository::new(FileStorage::new(&cli.session_dir));
    let client = ConsoleClient::with_reqwest(config, sessions);

    match cli.command {
        Command::Login { email, password } => run_login(&client, &email, &password).await,
        Command::Logout => {
            client.logout().await;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let user = client.current_user().ok_or(CliError::NotLoggedIn)?;
            println!("{} <{}> (#{})", user.name, user.email, user.id);
            if client.should_change_password() {
                println!("password change required");
            }
            Ok(())
        }
        Command::Refresh => match client.refresh().await {
            RefreshOutcome::Renewed => {
                println!("tokens refreshed");
                Ok(())
            }
            RefreshOutcome::Failed => Err(CliError::RefreshFailed),
        },
        Command::Users(users) => run_users(&client, users).await,
        Command::Groups(groups) => run_groups(&client, groups).await,
    }
}

async fn run_login(client: &Client, email: &str, password: &str) -> Result<(), CliError> {
    match client.authenticate(email, password).await {
        AuthOutcome::Authenticated(user) => {
            println!("logged in as {} (#{})", user.name, user.id);
            if user.must_change_password {
                println!("password change required");
            }
            Ok(())
        }
        AuthOutcome::Rejected(failure) => Err(CliError::LoginFailed(failure.reason)),
    }
}

async fn run_users(client: &Client, users: UsersCommand) -> Result<(), CliError> {
    match users.command {
        UsersSubcommand::List => {
            let page = client.list_users().await?;
            for user in &page.users {
                let state = if user.is_blocked() { "blocked" } else { "active" };
                println!("{:>6}  {:<30}  {:<40}  {state}", user.id, user.name, user.email);
            }
            println!("{} of {} users", page.users.len(), page.total);
            Ok(())
        }
        UsersSubcommand::Register {
            name,
            email,
            password,
            mobile,
            must_change_password,
        } => {
            let mut form =
                NewUser::new(name, email, password).with_must_change_password(must_change_password);
            if let Some(mobile) = mobile {
                form = form.with_mobile(mobile);
            }
            let created = client.register_user(&form).await?;
            match created.id {
                Some(id) => println!("created user #{id}"),
                None => println!("user created"),
            }
            Ok(())
        }
        UsersSubcommand::Block { id } => {
            client.block_user(UserId(id)).await?;
            println!("user #{id} blocked");
            Ok(())
        }
        UsersSubcommand::Unblock { id } => {
            client.unblock_user(UserId(id)).await?;
            println!("user #{id} unblocked");
            Ok(())
        }
        UsersSubcommand::Delete { id } => {
            client.delete_user(UserId(id)).await?;
            println!("user #{id} deleted");
            Ok(())
        }
    }
}

async fn run_groups(client: &Client, groups: GroupsCommand) -> Result<(), CliError> {
    match groups.command {
        GroupsSubcommand::List => {
            let groups = client.list_groups().await?;
            println!("{}", serde_json::to_string_pretty(&groups)?);
            Ok(())
        }
        GroupsSubcommand::Create { code, description } => {
            let group = client
                .create_group(&NewGroup::new(code, description))
                .await?;
            println!("created group {}", group.code);
            Ok(())
        }
        GroupsSubcommand::Delete { code } => {
            client.delete_group(&code).await?;
            println!("group {code} deleted");
            Ok(())
        }
    }
}
