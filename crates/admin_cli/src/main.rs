use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{EngineError, IssuedToken, SqlAuthProvider};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "pocketbook_admin")]
#[command(about = "Admin utilities for Pocketbook (bootstrap users and API tokens)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./pocketbook.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register a user and print its first token.
    Create(UserArgs),
    /// Replace a user's token, invalidating the old one.
    RotateToken(UserArgs),
}

#[derive(Args, Debug)]
struct UserArgs {
    #[arg(long)]
    email: String,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_token(action: &str, email: &str, issued: &IssuedToken) {
    println!("{action} user: {email} ({})", issued.uid);
    println!("token: {}", issued.token);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let auth = SqlAuthProvider::new(db);

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => match auth.create_user(&args.email).await {
            Ok(issued) => print_token("created", &args.email, &issued),
            Err(EngineError::ExistingKey(email)) => {
                eprintln!("user already exists: {email}");
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        },
        Command::User(User {
            command: UserCommand::RotateToken(args),
        }) => match auth.rotate_token(&args.email).await {
            Ok(issued) => print_token("rotated token for", &args.email, &issued),
            Err(EngineError::KeyNotFound(_)) => {
                eprintln!("user not found: {}", args.email);
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        },
    }

    Ok(())
}
