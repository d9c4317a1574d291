use anyhow::Result;
use clap::{Parser, Subcommand};

use colloquy::cli::{active, advise, last, list, resolve, search, since};
use colloquy::config::Config;
use colloquy::store::ConversationStore;

#[derive(Parser)]
#[command(name = "colloquy")]
#[command(about = "Conversation log access and query tool for Cline-style editor extensions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "colloquy.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the most recent messages of a conversation
    Last {
        /// Conversation id, or ACTIVE_A / ACTIVE_B for the active one
        conversation_id: String,

        /// How many messages (server-clamped)
        #[arg(short, long, default_value_t = colloquy::store::DEFAULT_LIMIT)]
        limit: usize,

        /// Read ui_messages.json instead of the API history
        #[arg(long)]
        ui: bool,
    },

    /// Show messages at or after a timestamp
    Since {
        /// Conversation id, or ACTIVE_A / ACTIVE_B for the active one
        conversation_id: String,

        /// Epoch milliseconds or RFC3339
        since: String,

        /// How many messages (server-clamped)
        #[arg(short, long, default_value_t = colloquy::store::MAX_LIMIT)]
        limit: usize,

        /// Read ui_messages.json instead of the API history
        #[arg(long)]
        ui: bool,
    },

    /// Search message content, across conversations or within one
    Search {
        /// Case-insensitive substring to look for
        term: String,

        /// Restrict the search to one conversation
        #[arg(short = 't', long)]
        conversation: Option<String>,

        /// Show a window of N messages around the first match
        #[arg(short = 'C', long)]
        context: Option<usize>,

        /// Stop after this many conversations match (broad search)
        #[arg(short, long, default_value_t = 5)]
        max_results: usize,

        /// Read ui_messages.json instead of the API history
        #[arg(long)]
        ui: bool,
    },

    /// Show the active conversation marker(s)
    Active {
        /// Restrict to one label (A or B)
        #[arg(short, long)]
        label: Option<String>,
    },

    /// List conversations across all install roots
    List,

    /// Resolve a conversation id to its on-disk location
    Resolve {
        /// Conversation id, or ACTIVE_A / ACTIVE_B for the active one
        conversation_id: String,
    },

    /// Write an advice notification into a conversation
    Advise {
        /// Conversation id, or ACTIVE_A / ACTIVE_B for the active one
        conversation_id: String,

        /// Advice body
        content: String,

        /// Optional advice title
        #[arg(long)]
        title: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config).unwrap_or_default();

    // Initialize the access layer
    let store = ConversationStore::new(&config);

    match cli.command {
        Commands::Last {
            conversation_id,
            limit,
            ui,
        } => {
            last::run(&store, &conversation_id, limit, ui).await?;
        }
        Commands::Since {
            conversation_id,
            since,
            limit,
            ui,
        } => {
            since::run(&store, &conversation_id, &since, limit, ui).await?;
        }
        Commands::Search {
            term,
            conversation,
            context,
            max_results,
            ui,
        } => {
            search::run(&store, &term, conversation, context, max_results, ui).await?;
        }
        Commands::Active { label } => {
            active::run(&store, label).await?;
        }
        Commands::List => {
            list::run(&store)?;
        }
        Commands::Resolve { conversation_id } => {
            resolve::run(&store, &conversation_id).await?;
        }
        Commands::Advise {
            conversation_id,
            content,
            title,
        } => {
            advise::run(&store, &conversation_id, content, title).await?;
        }
    }

    Ok(())
}
