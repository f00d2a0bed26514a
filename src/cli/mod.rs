use clap::{ Parser, Subcommand };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Backend Args ---
    /// Base URL of the chat backend (e.g., https://chat-backend.example.com)
    #[arg(long, env = "API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Request timeout in seconds for backend calls. 0 disables the timeout.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    /// Delay before the conversation list is refreshed after a first exchange, in milliseconds.
    #[arg(long, env = "TITLE_REFRESH_MS", default_value = "500")]
    pub title_refresh_ms: u64,

    // --- Page Args ---
    /// Public address of the chat page; conversation links are built as <APP_URL>?id=<conversation>.
    #[arg(long, env = "APP_URL", default_value = crate::conversation::DEFAULT_APP_URL)]
    pub app_url: String,

    // --- Local Storage Args ---
    /// Path of the local storage file. Defaults to the platform data directory.
    #[arg(long, env = "STORAGE_PATH")]
    pub storage_path: Option<String>,

    /// Keep preferences and guest identity in memory only.
    #[arg(long, env = "EPHEMERAL", default_value = "false")]
    pub ephemeral: bool,

    // --- Admin Args ---
    /// Operator account allowed to use the admin commands.
    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Interactive chat (default)
    Chat {
        /// Conversation to open: a page URL carrying ?id=..., or a bare id
        #[arg(long)]
        open: Option<String>,
    },
    /// List your conversations
    List,
    /// Print the thread of a conversation
    History {
        conversation: String,
    },
    /// Send one message and print the reply
    Send {
        conversation: String,
        message: String,
    },
    /// Delete a conversation
    Delete {
        conversation: String,
    },
    /// Show or change theme and display name
    Settings {
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Record a signed-in account obtained from the OAuth provider
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Forget the signed-in account and continue as guest
    Logout,
    /// Show the identity used for backend requests
    Whoami,
    /// Operator statistics and search
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommand {
    /// Aggregate counters
    Stats,
    /// Every known user id
    Users,
    /// Most recent messages across all users
    Messages {
        #[arg(long, default_value_t = crate::api::admin::DEFAULT_MESSAGE_LIMIT)]
        limit: usize,
    },
    /// Full-text search over stored messages
    Search {
        query: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value_t = crate::api::admin::DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_is_optional_and_flags_parse() {
        let args = Args::try_parse_from(["orion-chat", "--api-url", "http://api.test"]).unwrap();
        assert_eq!(args.api_url, "http://api.test");
        assert!(args.command.is_none());

        let args = Args::try_parse_from([
            "orion-chat",
            "admin",
            "search",
            "thesis",
            "--user",
            "ada@example.com",
        ]).unwrap();
        match args.command {
            Some(Command::Admin { command: AdminCommand::Search { query, user, limit } }) => {
                assert_eq!(query, "thesis");
                assert_eq!(user.as_deref(), Some("ada@example.com"));
                assert_eq!(limit, 50);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
