use agrimove_cli::commands::{account, request, truck, Session};
use clap::{Parser, Subcommand};
#[derive(Parser)]
#[command(name = "agrimove")]
#[command(author, version, about = "AgriMove transport request CLI", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    endpoint: String,
    /// Bearer token from `agrimove login`
    #[arg(short, long, env = "AGRIMOVE_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Commands,
}
#[derive(Subcommand)]
enum Commands {
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Whoami,
    Request {
        #[command(subcommand)]
        command: request::RequestCommands,
    },
    Trucks,
}
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let session = Session::new(cli.endpoint, cli.token);
    match cli.command {
        Commands::Login { username, password } => {
            account::login(&session, &username, &password).await?
        }
        Commands::Register {
            username,
            password,
            full_name,
            email,
        } => account::register(&session, &username, &password, full_name, email).await?,
        Commands::Whoami => account::whoami(&session).await?,
        Commands::Request { command } => request::execute(command, &session).await?,
        Commands::Trucks => truck::execute(&session).await?,
    }
    Ok(())
}
