//! CLI entry point for petalpost

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use petalpost::commands::new::{parse_tags, NewPost};

#[derive(Parser)]
#[command(name = "petalpost")]
#[command(version)]
#[command(about = "Markdown content pipeline for a personal static blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new post
    New {
        /// Title of the new post; the file name is derived from it
        title: String,

        /// Short summary shown in listings
        #[arg(short, long)]
        excerpt: Option<String>,

        /// Comma separated tags
        #[arg(short, long)]
        tags: Option<String>,

        /// Author (defaults to new_post.author from the config)
        #[arg(short, long)]
        author: Option<String>,
    },

    /// List site information
    List {
        /// Type of content to list (post, tag, path)
        #[arg(default_value = "post")]
        r#type: String,

        /// Only list posts carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the static page path of every post
    Paths,

    /// Render one post
    Show {
        /// Post identifier (file name without .md)
        id: String,

        /// Print the post and its page metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search post titles, excerpts and tags
    Search {
        query: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Serve the posts API and static assets
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "petalpost=debug,info"
    } else {
        "petalpost=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::New {
            title,
            excerpt,
            tags,
            author,
        } => {
            let blog = petalpost::Blog::new(&base_dir)?;
            tracing::info!("Creating new post with title: {}", title);
            let post = NewPost {
                title,
                excerpt,
                tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
                author,
            };
            petalpost::commands::new::create_post(&blog, &post)?;
        }

        Commands::List { r#type, tag, json } => {
            let blog = petalpost::Blog::new(&base_dir)?;
            match tag {
                Some(tag) => print!("{}", petalpost::commands::list::tagged(&blog, &tag, json)?),
                None => petalpost::commands::list::run(&blog, &r#type, json)?,
            }
        }

        Commands::Paths => {
            let blog = petalpost::Blog::new(&base_dir)?;
            petalpost::commands::list::run(&blog, "path", false)?;
        }

        Commands::Show { id, json } => {
            let blog = petalpost::Blog::new(&base_dir)?;
            if !petalpost::commands::show::run(&blog, &id, json).await? {
                std::process::exit(1);
            }
        }

        Commands::Search { query, json } => {
            let blog = petalpost::Blog::new(&base_dir)?;
            print!("{}", petalpost::commands::list::search(&blog, &query, json)?);
        }

        Commands::Server { port, ip } => {
            let blog = petalpost::Blog::new(&base_dir)?;
            let ip = ip.unwrap_or_else(|| blog.config.server.ip.clone());
            let port = port.unwrap_or(blog.config.server.port);

            tracing::info!("Starting server at http://{}:{}", ip, port);
            petalpost::server::start(blog, &ip, port).await?;
        }

        Commands::Version => {
            println!("petalpost version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
