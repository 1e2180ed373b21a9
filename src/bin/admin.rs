//! CLI administration tool for shortspan.
//!
//! API tokens are the only way to reach the authenticated API, and they are
//! issued here rather than over HTTP. The tool also answers quick operational
//! questions (row counts, connectivity) without touching the running service.
//!
//! # Usage
//!
//! ```bash
//! # Create a new API token (prints the raw token once)
//! cargo run --bin admin -- token create
//!
//! # Create a second token for an existing owner
//! cargo run --bin admin -- token create --user 6f9d...c2 --name "CI importer"
//!
//! # List all tokens
//! cargo run --bin admin -- token list
//!
//! # Revoke a token by name or id
//! cargo run --bin admin -- token revoke "Production API"
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `TOKEN_SIGNING_SECRET` (required for token commands): HMAC key, must
//!   match the server's value or issued tokens will never authenticate

use shortspan::application::services::hash_token;
use shortspan::infrastructure::persistence::PgTokenRepository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// CLI tool for managing shortspan.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Token management subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Create a new API token
    Create {
        /// Token name (e.g., "Production API", "CI importer")
        #[arg(short, long)]
        name: Option<String>,

        /// Owner id to bind the token to (a fresh one is generated if omitted)
        #[arg(short, long)]
        user: Option<Uuid>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token
    Revoke {
        /// Token name or id to revoke
        name_or_id: String,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Connect to database
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Token { action } => handle_token_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches token management commands.
async fn handle_token_action(action: TokenAction, pool: &PgPool) -> Result<()> {
    let repo = Arc::new(PgTokenRepository::new(Arc::new(pool.clone())));

    match action {
        TokenAction::Create { name, user, yes } => {
            create_token(repo, name, user, yes).await?;
        }
        TokenAction::List => {
            list_tokens(repo).await?;
        }
        TokenAction::Revoke { name_or_id } => {
            revoke_token(repo, name_or_id).await?;
        }
    }

    Ok(())
}

/// Creates a new API token with interactive prompts.
///
/// # Flow
///
/// 1. Prompt for token name (or use provided)
/// 2. Pick the owner id (provided, or a freshly generated one)
/// 3. Generate a random token and display it with a warning
/// 4. Confirm creation (unless `--yes` flag)
/// 5. Hash the token with HMAC-SHA256 under `TOKEN_SIGNING_SECRET`
/// 6. Store in database
/// 7. Display usage instructions
///
/// # Security
///
/// - Only the keyed hash is stored in the database
/// - Raw token is displayed once and cannot be retrieved later
/// - Tokens are 48 characters (alphanumeric) for high entropy
async fn create_token(
    repo: Arc<PgTokenRepository>,
    name: Option<String>,
    user: Option<Uuid>,
    skip_confirm: bool,
) -> Result<()> {
    let secret = std::env::var("TOKEN_SIGNING_SECRET")
        .context("TOKEN_SIGNING_SECRET must be set to issue tokens")?;

    println!("{}", "🔑 Create API Token".bright_blue().bold());
    println!();

    // Get token name
    let token_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name")
            .with_initial_text("Production API")
            .interact_text()?,
    };

    // Every link created with this token will belong to this owner id.
    let user_id = match user {
        Some(id) => {
            println!("{}", "🔗 Binding token to existing owner".green());
            id
        }
        None => {
            let generated = Uuid::new_v4();
            println!("{}", "✨ Generated new owner id".green());
            generated
        }
    };

    let token_value = generate_token();

    // Show token details
    println!();
    println!("{}", "Token details:".bright_white().bold());
    println!("  Name:  {}", token_name.cyan());
    println!("  Owner: {}", user_id.to_string().bright_black());
    println!("  Token: {}", token_value.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  IMPORTANT: Save this token now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();

    // Confirm
    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    // Hash token
    let token_hash = hash_token(&secret, &token_value);

    // Save to database
    repo.create_token(&token_name, &token_hash, user_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!();
    println!("{}", "✅ Token created successfully!".green().bold());
    println!();
    println!("{}", "Add this to your requests:".bright_white());
    println!(
        "  {}: Bearer {}",
        "Authorization".bright_cyan(),
        token_value.bright_yellow()
    );
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" \\",
        token_value.bright_yellow()
    );
    println!("       -H \"Content-Type: application/json\" \\");
    println!("       -d '{{\"original_url\": \"https://example.com\"}}' \\");
    println!("       http://localhost:3000/api/links");
    println!();

    Ok(())
}

/// Lists all API tokens with status indicators.
///
/// # Output Format
///
/// ```text
/// 📋 API Tokens
///
///   ID  Name                 Owner      Created              Status
///   ──────────────────────────────────────────────────────────────────
///   1   Production API       6f9d…11c2  2026-01-15 10:30     ACTIVE
///   2   CI importer          6f9d…11c2  2026-01-16 14:20     REVOKED
/// ```
async fn list_tokens(repo: Arc<PgTokenRepository>) -> Result<()> {
    println!("{}", "📋 API Tokens".bright_blue().bold());
    println!();

    let tokens = repo
        .list_tokens()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list tokens: {}", e))?;

    if tokens.is_empty() {
        println!("{}", "  No tokens found".yellow());
        println!();
        println!(
            "  Create one with: {} admin token create",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<3} {:<24} {:<10} {:<20} {:<10}",
        "ID".bright_white().bold(),
        "Name".bright_white().bold(),
        "Owner".bright_white().bold(),
        "Created".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(72).bright_black());

    for token in &tokens {
        let status = if token.revoked_at.is_some() {
            "REVOKED".red()
        } else {
            "ACTIVE".green()
        };

        println!(
            "  {:<3} {:<24} {:<10} {:<20} {}",
            token.id.to_string().bright_black(),
            token.name.cyan(),
            short_uuid(&token.user_id).bright_black(),
            token
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            status
        );
    }

    println!();
    println!(
        "  Total: {}",
        tokens.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Revokes a token by name or id with confirmation prompt.
///
/// # Lookup
///
/// - If input is numeric, lookup by id
/// - Otherwise, lookup by name (exact match)
///
/// # Safety
///
/// - Requires confirmation (default: No)
/// - Prevents double-revocation
async fn revoke_token(repo: Arc<PgTokenRepository>, name_or_id: String) -> Result<()> {
    println!("{}", "🔒 Revoke API Token".bright_blue().bold());
    println!();

    // Try to find by name or id
    let token = match name_or_id.parse::<i64>() {
        Ok(id) => repo
            .find_by_id(id)
            .await
            .map_err(|e| anyhow::anyhow!("Database error: {}", e))?,
        Err(_) => repo
            .find_by_name(&name_or_id)
            .await
            .map_err(|e| anyhow::anyhow!("Database error: {}", e))?,
    };

    let token = token.context("Token not found")?;

    if token.revoked_at.is_some() {
        println!("{}", "⚠️  This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token: {}", token.name.cyan());
    println!("  ID:    {}", token.id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    repo.revoke_token(token.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))?;

    println!();
    println!("{}", "✅ Token revoked successfully!".green().bold());
    println!();

    Ok(())
}

/// Displays system statistics.
///
/// Shows:
/// - Total number of links
/// - Total redirects served (as of the last reconciliation pass)
/// - Number of active API tokens
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
        .fetch_one(pool)
        .await?;

    let redirects_count: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(redirect_count), 0) FROM links")
            .fetch_one(pool)
            .await?;

    let tokens_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL")
            .fetch_one(pool)
            .await?;

    println!(
        "  Links:         {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Redirects:     {}",
        redirects_count.to_string().bright_green().bold()
    );
    println!(
        "  Active tokens: {}",
        tokens_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}

/// Generates a cryptographically random token.
///
/// # Format
///
/// - Length: 48 characters
/// - Character set: A-Z, a-z, 0-9
/// - Entropy: ~286 bits
fn generate_token() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    const TOKEN_LEN: usize = 48;

    let mut rng = rand::rng();

    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// First and last four hex digits of an id, for compact table output.
fn short_uuid(id: &Uuid) -> String {
    let s = id.simple().to_string();
    format!("{}…{}", &s[..4], &s[s.len() - 4..])
}
