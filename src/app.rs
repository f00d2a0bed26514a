use crate::api::admin::AdminClient;
use crate::api::HttpBackend;
use crate::cli::{ AdminCommand, Args };
use crate::conversation::{ conversation_id_from, ClientOptions, ConversationClient };
use crate::identity::{ self, Identity, IdentityKind, OAuthSession };
use crate::models::admin::AdminMessage;
use crate::preferences::{ self, Preferences, Theme };
use crate::render::{ self, SidebarEntry };
use crate::storage::{ create_local_store, LocalStore, UnavailableStore };
use chrono::Utc;
use log::{ info, warn };
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub type AppResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Everything resolved once at start-up: storage, identity, preferences and the backend handle.
pub struct App {
    pub args: Args,
    pub store: Arc<dyn LocalStore>,
    pub identity: Identity,
    pub preferences: Preferences,
    pub backend: HttpBackend,
}

impl App {
    pub fn new(args: Args) -> AppResult<Self> {
        let store: Arc<dyn LocalStore> = match create_local_store(&args) {
            Ok(store) => store,
            Err(e) => {
                warn!("Local storage unavailable: {}", e);
                Arc::new(UnavailableStore)
            }
        };
        let session = identity::stored_session(store.as_ref());
        let identity = identity::resolve_identity(session.as_ref(), store.as_ref());
        let preferences = preferences::load_preferences(store.as_ref());
        let timeout = (args.request_timeout_secs > 0).then(||
            Duration::from_secs(args.request_timeout_secs)
        );
        let backend = HttpBackend::new(&args.api_url, timeout)?;
        info!("Acting as {} ({:?})", identity.id, identity.kind);

        Ok(Self { args, store, identity, preferences, backend })
    }

    pub fn conversation_client(&self) -> AppResult<ConversationClient> {
        let app_url = Url::parse(&self.args.app_url).map_err(|e|
            format!("Invalid APP_URL '{}': {}", self.args.app_url, e)
        )?;
        let options = ClientOptions {
            title_refresh_delay: Duration::from_millis(self.args.title_refresh_ms),
            ..ClientOptions::new(app_url)
        };
        let client = ConversationClient::new(
            Arc::new(self.backend.clone()),
            self.identity.clone(),
            options
        );
        if !self.preferences.display_name.trim().is_empty() {
            client.set_display_name(&self.preferences.display_name);
        }
        Ok(client)
    }

    pub fn user_label(&self) -> String {
        if self.preferences.display_name.trim().is_empty() {
            "You".to_string()
        } else {
            self.preferences.display_name.clone()
        }
    }

    pub fn describe_identity(&self) -> String {
        let mode = match self.identity.kind {
            IdentityKind::Session => "Signed In",
            IdentityKind::Guest => "Guest Mode",
            IdentityKind::Fallback => "Guest Mode (not persisted)",
        };
        format!("{} <{}> - {}", self.identity.display_name, self.identity.id, mode)
    }

    pub async fn list(&self) -> AppResult<()> {
        let client = self.conversation_client()?;
        if !client.list_conversations().await {
            return Err("Could not fetch conversations".into());
        }
        println!("{}", sidebar(&client));
        Ok(())
    }

    pub async fn history(&self, target: &str) -> AppResult<()> {
        let client = self.conversation_client()?;
        let id = conversation_id_from(target).ok_or("Invalid conversation id")?;
        client.open_conversation(&id).await?;
        let messages = client.messages();
        if messages.is_empty() {
            println!("No messages in {}", id);
        } else {
            println!("{}", render::render_thread(&messages, &self.user_label()));
        }
        Ok(())
    }

    pub async fn send(&self, target: &str, message: &str) -> AppResult<()> {
        let client = self.conversation_client()?;
        let id = conversation_id_from(target).ok_or("Invalid conversation id")?;
        client.open_conversation(&id).await?;
        let reply = client.send_message(message).await?;
        println!("{}", render::render_message(&reply, &self.user_label()));
        Ok(())
    }

    pub async fn delete(&self, target: &str) -> AppResult<()> {
        let client = self.conversation_client()?;
        let id = conversation_id_from(target).ok_or("Invalid conversation id")?;
        client.delete_conversation(&id).await?;
        println!("Deleted {}", id);
        Ok(())
    }

    pub fn settings(&mut self, theme: Option<&str>, name: Option<&str>) -> AppResult<()> {
        if theme.is_some() || name.is_some() {
            let theme = match theme {
                Some(raw) => raw.parse::<Theme>()?,
                None => self.preferences.theme,
            };
            let name = name.map(str::to_string).unwrap_or_else(|| self.preferences.display_name.clone());
            self.preferences = preferences::save_preferences(self.store.as_ref(), theme, name.trim())?;
        }
        println!("theme: {}", self.preferences.theme);
        println!("name:  {}", self.preferences.display_name);
        Ok(())
    }

    pub fn login(&self, email: &str, name: Option<&str>) -> AppResult<()> {
        let session = OAuthSession {
            email: email.trim().to_string(),
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        };
        if session.email.is_empty() {
            return Err("Email must not be empty".into());
        }
        identity::sign_in(self.store.as_ref(), &session)?;
        println!("Signed in as {}", session.email);
        Ok(())
    }

    pub fn logout(&self) -> AppResult<()> {
        identity::sign_out(self.store.as_ref())?;
        println!("Signed out");
        Ok(())
    }

    pub async fn admin(&self, command: &AdminCommand) -> AppResult<()> {
        let admin = AdminClient::for_identity(
            self.backend.clone(),
            &self.identity,
            self.args.admin_email.as_deref()
        )?;
        match command {
            AdminCommand::Stats => {
                let stats = admin.stats().await?;
                println!("Total users:         {}", stats.total_users);
                println!("Active users:        {}", stats.active_users);
                println!("Total conversations: {}", stats.total_conversations);
                println!("Total messages:      {}", stats.total_messages);
                println!("Messages today:      {}", stats.today_messages);
            }
            AdminCommand::Users => {
                let users = admin.users().await?;
                println!("Users ({})", users.len());
                for user in users {
                    println!("  {}", user);
                }
            }
            AdminCommand::Messages { limit } => {
                print_admin_messages(&admin.all_messages(*limit).await?);
            }
            AdminCommand::Search { query, user, limit } => {
                print_admin_messages(&admin.search(query, user.as_deref(), *limit).await?);
            }
        }
        Ok(())
    }
}

pub fn sidebar(client: &ConversationClient) -> String {
    let active = client.active_id();
    let titles: Vec<(String, String)> = client
        .conversations()
        .into_iter()
        .map(|id| {
            let title = client.title(&id);
            (id, title)
        })
        .collect();
    let entries: Vec<SidebarEntry<'_>> = titles
        .iter()
        .map(|(id, title)| SidebarEntry { id, title, active: *id == active })
        .collect();
    render::render_sidebar(&entries, &Utc::now())
}

fn print_admin_messages(messages: &[AdminMessage]) {
    if messages.is_empty() {
        println!("No messages");
        return;
    }
    for msg in messages {
        let when = msg.timestamp.as_deref().unwrap_or("-");
        println!("[{}] {}", when, msg.user_email);
        println!("  User:     {}", msg.user_message);
        println!("  OrionBot: {}", msg.assistant_response);
    }
}
