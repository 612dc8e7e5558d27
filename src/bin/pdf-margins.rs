//! PDF Margins CLI tool
//!
//! Runs the margin HTTP service, or applies a margin policy to local files.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_margins::auth::UserStore;
use pdf_margins::config::ServerConfig;
use pdf_margins::margin::{PolicyForm, DEFAULT_MARGINS};
use pdf_margins::pdf::{apply_margins_file, extract_metadata};

/// PDF Margins - Expand or shrink PDF page boundaries
#[derive(Parser)]
#[command(name = "pdf-margins")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Run the HTTP service on port 8000
    pdf-margins serve --port 8000

    # Add 20 units on every edge of every page
    pdf-margins apply input.pdf -o output.pdf --mode all --margins 20,20,20,20

    # Wider inner margin for a bound book
    pdf-margins apply book.pdf -o bound.pdf --mode odd_even --margins-odd 40,0,0,0 --margins-even 0,0,40,0

    # Different margins for page ranges
    pdf-margins apply input.pdf -o output.pdf --mode groups --group-margins \"1-3:10,10,10,10;4-9:0,30,0,30\"")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to listen on (overrides HOST/PORT)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Port to listen on (overrides PORT)
        #[arg(long, conflicts_with = "bind")]
        port: Option<u16>,

        /// Database URL (overrides DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Apply a margin policy to a PDF file
    Apply {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Show page count and page boundaries of a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },

    /// Create a user for the login endpoint
    AddUser {
        username: String,
        password: String,

        /// Database URL (overrides DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,
    },
}

/// Policy options, using the same syntax as the upload form fields
#[derive(Args)]
struct PolicyArgs {
    /// Policy: all, odd_even, selected or groups
    #[arg(long)]
    mode: String,

    /// Margins as left,top,right,bottom (modes all and selected)
    #[arg(long, default_value = DEFAULT_MARGINS, allow_hyphen_values = true)]
    margins: String,

    /// Margins for odd pages (mode odd_even)
    #[arg(long, default_value = DEFAULT_MARGINS, allow_hyphen_values = true)]
    margins_odd: String,

    /// Margins for even pages (mode odd_even)
    #[arg(long, default_value = DEFAULT_MARGINS, allow_hyphen_values = true)]
    margins_even: String,

    /// Comma-separated page numbers, starting at 1 (mode selected)
    #[arg(long, default_value = "")]
    selected_pages: String,

    /// Groups as "start-end:l,t,r,b;..." (mode groups)
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    group_margins: String,
}

impl From<PolicyArgs> for PolicyForm {
    fn from(args: PolicyArgs) -> Self {
        PolicyForm {
            mode: args.mode,
            margins: args.margins,
            margins_odd: args.margins_odd,
            margins_even: args.margins_even,
            selected_pages: args.selected_pages,
            group_margins: args.group_margins,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_margins=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { bind, port, database_url } => cmd_serve(bind, port, database_url).await,
        Commands::Apply { input, output, policy } => cmd_apply(input, output, policy.into()),
        Commands::Info { input } => cmd_info(input),
        Commands::AddUser { username, password, database_url } => {
            cmd_add_user(username, password, database_url).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Run the HTTP service
async fn cmd_serve(
    bind: Option<SocketAddr>,
    port: Option<u16>,
    database_url: Option<String>,
) -> anyhow::Result<()> {
    let mut config = ServerConfig::from_env()?;
    if let Some(bind) = bind {
        config.bind = bind;
    }
    if let Some(port) = port {
        config.bind.set_port(port);
    }
    if let Some(url) = database_url {
        config.database_url = url;
    }

    pdf_margins::server::serve(config).await?;
    Ok(())
}

/// Apply a margin policy to a local file
fn cmd_apply(input: PathBuf, output: PathBuf, form: PolicyForm) -> anyhow::Result<()> {
    let policy = form.to_policy()?;

    eprintln!("Applying {} margins to {}...", form.mode, input.display());
    let changed = apply_margins_file(&input, &output, &policy)
        .with_context(|| format!("failed to process {}", input.display()))?;

    eprintln!("Updated {} page(s)", changed);
    eprintln!("Output: {}", output.display());
    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> anyhow::Result<()> {
    let metadata = extract_metadata(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count());

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    for (i, rect) in metadata.pages.iter().enumerate() {
        println!("  Page {}: {} ({} x {})", i + 1, rect, rect.width(), rect.height());
    }

    Ok(())
}

/// Create a user record
async fn cmd_add_user(
    username: String,
    password: String,
    database_url: Option<String>,
) -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;
    let url = database_url.unwrap_or(config.database_url);

    let users = UserStore::connect(&url, config.session_ttl).await?;
    users.create_user(&username, &password).await?;

    eprintln!("Created user: {}", username);
    Ok(())
}
