use crate::app::{ sidebar, App, AppResult };
use crate::conversation::{ conversation_id_from, ConversationClient };
use crate::identity::DEFAULT_DISPLAY_NAME;
use crate::install_prompt::InstallPrompt;
use crate::preferences::{ self, Theme };
use crate::render;
use chrono::Utc;
use log::{ error, warn };
use std::io::Write;
use tokio::io::{ AsyncBufReadExt, BufReader };

#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Message(String),
    New,
    List,
    Open(String),
    Delete(String),
    History,
    Settings {
        theme: Option<String>,
        name: Option<String>,
    },
    Whoami,
    DismissInstall,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ReplCommand::Empty;
        }
        if !trimmed.starts_with('/') {
            return ReplCommand::Message(line.trim_end_matches(['\r', '\n']).to_string());
        }
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let rest = parts.next().map(str::trim).unwrap_or_default();
        match command {
            "/new" => ReplCommand::New,
            "/list" => ReplCommand::List,
            "/open" if !rest.is_empty() => ReplCommand::Open(rest.to_string()),
            "/delete" if !rest.is_empty() => ReplCommand::Delete(rest.to_string()),
            "/history" => ReplCommand::History,
            "/settings" => {
                let mut words = rest.splitn(2, char::is_whitespace);
                let theme = words.next().filter(|w| !w.is_empty()).map(str::to_string);
                let name = words.next().map(str::trim).filter(|w| !w.is_empty()).map(str::to_string);
                ReplCommand::Settings { theme, name }
            }
            "/whoami" => ReplCommand::Whoami,
            "/dismiss-install" => ReplCommand::DismissInstall,
            "/help" => ReplCommand::Help,
            "/quit" | "/exit" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        }
    }
}

const HELP: &str =
    "Commands:
  /new                      start a new conversation
  /list                     list conversations
  /open <id|url|n>          open a conversation (n = position in /list)
  /delete <id|n>            delete a conversation
  /history                  reload the current thread
  /settings <dark|light> [name]
                            save theme and display name
  /whoami                   show the active identity
  /dismiss-install          hide the install tip for 24 hours
  /quit                     leave
Anything else is sent as a message.";

/// Resolves `n` (1-based position in the sidebar) or an id/URL to a conversation id.
fn resolve_target(client: &ConversationClient, target: &str) -> Option<String> {
    if let Ok(position) = target.parse::<usize>() {
        return client.conversations().get(position.checked_sub(1)?).cloned();
    }
    conversation_id_from(target)
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_banner(app: &App, client: &ConversationClient) {
    if app.preferences.display_name.trim().is_empty() {
        println!("What's on the agenda today?");
    } else {
        println!("Hello {}!", app.preferences.display_name);
    }
    println!("{}", app.describe_identity());
    println!("Conversation: {}", client.location());
    if InstallPrompt::new(app.store.as_ref()).should_show(Utc::now()) {
        println!(
            "Install tip: put `orion-chat` on your PATH for quick access. /dismiss-install hides this for 24 hours."
        );
    }
    println!("Type /help for commands.");
}

pub async fn run_chat(app: &mut App, open: Option<&str>) -> AppResult<()> {
    let client = app.conversation_client()?;
    match open.map(|target| (target, conversation_id_from(target))) {
        Some((_, Some(id))) => client.open_conversation(&id).await?,
        Some((target, None)) => {
            warn!("Ignoring unusable conversation reference '{}'", target);
            client.list_conversations().await;
        }
        None => {
            client.list_conversations().await;
        }
    }

    print_banner(app, &client);
    let thread = client.messages();
    if !thread.is_empty() {
        println!("{}", render::render_thread(&thread, &app.user_label()));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match ReplCommand::parse(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Message(text) => {
                match client.send_message(&text).await {
                    Ok(reply) => println!("{}", render::render_message(&reply, &app.user_label())),
                    Err(e) => println!("{}", e),
                }
            }
            ReplCommand::New => {
                client.start_conversation();
                println!("Conversation: {}", client.location());
            }
            ReplCommand::List => {
                client.list_conversations().await;
                println!("{}", sidebar(&client));
            }
            ReplCommand::Open(target) => {
                let Some(id) = resolve_target(&client, &target) else {
                    println!("Unknown conversation '{}'", target);
                    continue;
                };
                match client.open_conversation(&id).await {
                    Ok(()) => {
                        println!("Conversation: {} - {}", client.title(&id), client.location());
                        println!("{}", render::render_thread(&client.messages(), &app.user_label()));
                    }
                    Err(e) => println!("{}", e),
                }
            }
            ReplCommand::Delete(target) => {
                let Some(id) = resolve_target(&client, &target) else {
                    println!("Unknown conversation '{}'", target);
                    continue;
                };
                if let Err(e) = client.delete_conversation(&id).await {
                    println!("{}", e);
                    continue;
                }
                println!("Deleted {}", id);
                println!("{}", sidebar(&client));
            }
            ReplCommand::History => {
                let id = client.active_id();
                client.load_history(&id).await;
                println!("{}", render::render_thread(&client.messages(), &app.user_label()));
            }
            ReplCommand::Settings { theme, name } => {
                let theme = match theme.as_deref().map(str::parse::<Theme>) {
                    Some(Ok(theme)) => theme,
                    Some(Err(e)) => {
                        println!("{}", e);
                        continue;
                    }
                    None => app.preferences.theme,
                };
                let name = name.unwrap_or_else(|| app.preferences.display_name.clone());
                match preferences::save_preferences(app.store.as_ref(), theme, &name) {
                    Ok(saved) => {
                        client.set_display_name(&saved.display_name);
                        let shown = if saved.display_name.is_empty() {
                            DEFAULT_DISPLAY_NAME
                        } else {
                            saved.display_name.as_str()
                        };
                        println!("Saved: theme {}, name {}", saved.theme, shown);
                        app.preferences = saved;
                    }
                    Err(e) => {
                        error!("Could not save preferences: {}", e);
                        println!("Could not save preferences: {}", e);
                    }
                }
            }
            ReplCommand::Whoami => println!("{}", app.describe_identity()),
            ReplCommand::DismissInstall => {
                match InstallPrompt::new(app.store.as_ref()).dismiss(Utc::now()) {
                    Ok(()) => println!("Install tip hidden for 24 hours."),
                    Err(e) => println!("Could not save: {}", e),
                }
            }
            ReplCommand::Unknown(command) => println!("Unknown command {}. Type /help.", command),
        }
    }
    Ok(())
}
