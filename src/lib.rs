pub mod api;
pub mod app;
pub mod cli;
pub mod conversation;
pub mod identity;
pub mod install_prompt;
pub mod models;
pub mod preferences;
pub mod render;
pub mod repl;
pub mod storage;

use app::{ App, AppResult };
use cli::{ Args, Command };
use log::info;

pub async fn run(args: Args) -> AppResult<()> {
    info!("--- Client Configuration ---");
    info!("Backend URL: {}", args.api_url);
    info!("App URL: {}", args.app_url);
    info!("Request Timeout (s): {}", args.request_timeout_secs);
    info!("Title Refresh (ms): {}", args.title_refresh_ms);
    info!("Ephemeral Storage: {}", args.ephemeral);
    if let Some(path) = &args.storage_path {
        info!("Storage Path: {}", path);
    }
    info!("Admin Configured: {}", args.admin_email.is_some());
    info!("----------------------------");

    let command = args.command.clone().unwrap_or(Command::Chat { open: None });
    let mut app = App::new(args)?;

    match command {
        Command::Chat { open } => repl::run_chat(&mut app, open.as_deref()).await,
        Command::List => app.list().await,
        Command::History { conversation } => app.history(&conversation).await,
        Command::Send { conversation, message } => app.send(&conversation, &message).await,
        Command::Delete { conversation } => app.delete(&conversation).await,
        Command::Settings { theme, name } => app.settings(theme.as_deref(), name.as_deref()),
        Command::Login { email, name } => app.login(&email, name.as_deref()),
        Command::Logout => app.logout(),
        Command::Whoami => {
            println!("{}", app.describe_identity());
            Ok(())
        }
        Command::Admin { command } => app.admin(&command).await,
    }
}
