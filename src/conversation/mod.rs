//! The conversation client: active conversation, its thread, and the
//! sidebar list, kept in sync with the chat backend.
//!
//! Local state is authoritative for the current session. Sends and deletes
//! mutate it before the backend answers and are never rolled back; the
//! backend becomes the source of truth again on the next history or list load.

mod location;

pub use location::{ conversation_id_from, conversation_location, ID_QUERY_PARAM };

use crate::api::{ BackendError, ChatBackend };
use crate::identity::Identity;
use crate::models::chat::{ ChatMessage, ChatRequest };
use chrono::Utc;
use log::{ debug, error, info, warn };
use std::collections::{ HashMap, HashSet };
use std::sync::{ Arc, Mutex, MutexGuard };
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TITLE: &str = "New conversation";
pub const DEFAULT_TITLE_REFRESH_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_APP_URL: &str = "http://localhost:3000/";
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Connection error. Please make sure the backend is running.";
pub const INVALID_RESPONSE_MESSAGE: &str = "Received an invalid response from the server.";

pub fn server_error_message(status: u16) -> String {
    format!("Server error: {}. Please try again.", status)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("a message is already being sent")]
    SendInProgress,

    #[error("conversation id must not be empty")]
    InvalidConversationId,

    #[error("conversation {0} was deleted")]
    Deleted(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    New,
    LoadingHistory,
    Ready,
    Sending,
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub app_url: Url,
    /// Wait before re-listing conversations after a first exchange, giving the
    /// backend time to assign a title.
    pub title_refresh_delay: Duration,
}

impl ClientOptions {
    pub fn new(app_url: Url) -> Self {
        Self { app_url, title_refresh_delay: DEFAULT_TITLE_REFRESH_DELAY }
    }
}

struct ClientState {
    active_id: String,
    messages: Vec<ChatMessage>,
    // The thread has been loaded or has had an exchange.
    ready: bool,
    history_pending: bool,
    // View generation of the outstanding send, whichever view is active now.
    sending_view: Option<u64>,
    conversations: Vec<String>,
    titles: HashMap<String, String>,
    deleted: HashSet<String>,
    user_name: Option<String>,
    location: Url,
    last_generated_millis: i64,
    // Bumped whenever the active conversation changes.
    view_generation: u64,
    // Bumped per history request and on every switch; only the latest may apply.
    history_generation: u64,
    list_generation: u64,
}

impl ClientState {
    fn activate(&mut self, conversation_id: String, app_url: &Url) {
        self.location = conversation_location(app_url, &conversation_id);
        self.active_id = conversation_id;
        self.messages.clear();
        self.ready = false;
        self.history_pending = false;
        self.view_generation += 1;
        self.history_generation += 1;
    }

    fn phase(&self) -> Phase {
        if self.sending_view == Some(self.view_generation) {
            Phase::Sending
        } else if self.history_pending {
            Phase::LoadingHistory
        } else if self.ready {
            Phase::Ready
        } else {
            Phase::New
        }
    }

    fn next_conversation_id(&mut self) -> String {
        let millis = Utc::now().timestamp_millis().max(self.last_generated_millis + 1);
        self.last_generated_millis = millis;
        format!("conv_{}", millis)
    }
}

#[derive(Clone)]
pub struct ConversationClient {
    backend: Arc<dyn ChatBackend>,
    identity: Arc<Identity>,
    options: Arc<ClientOptions>,
    state: Arc<Mutex<ClientState>>,
}

impl ConversationClient {
    /// Creates a client positioned on a freshly generated conversation.
    pub fn new(backend: Arc<dyn ChatBackend>, identity: Identity, options: ClientOptions) -> Self {
        let state = ClientState {
            active_id: String::new(),
            messages: Vec::new(),
            ready: false,
            history_pending: false,
            sending_view: None,
            conversations: Vec::new(),
            titles: HashMap::new(),
            deleted: HashSet::new(),
            user_name: identity.user_name().map(str::to_string),
            location: options.app_url.clone(),
            last_generated_millis: 0,
            view_generation: 0,
            history_generation: 0,
            list_generation: 0,
        };
        let client = Self {
            backend,
            identity: Arc::new(identity),
            options: Arc::new(options),
            state: Arc::new(Mutex::new(state)),
        };
        client.start_conversation();
        client
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn active_id(&self) -> String {
        self.state().active_id.clone()
    }

    pub fn phase(&self) -> Phase {
        self.state().phase()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().messages.clone()
    }

    pub fn conversations(&self) -> Vec<String> {
        self.state().conversations.clone()
    }

    pub fn titles(&self) -> HashMap<String, String> {
        self.state().titles.clone()
    }

    pub fn title(&self, conversation_id: &str) -> String {
        self.state()
            .titles.get(conversation_id)
            .filter(|title| !title.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    pub fn location(&self) -> Url {
        self.state().location.clone()
    }

    pub fn is_deleted(&self, conversation_id: &str) -> bool {
        self.state().deleted.contains(conversation_id)
    }

    /// Changes the name sent with subsequent chat requests.
    pub fn set_display_name(&self, name: &str) {
        let name = name.trim();
        self.state().user_name = if name.is_empty() { None } else { Some(name.to_string()) };
    }

    pub fn start_conversation(&self) -> String {
        let mut state = self.state();
        let id = state.next_conversation_id();
        state.activate(id.clone(), &self.options.app_url);
        info!("Started conversation {}", id);
        id
    }

    /// Switches to an existing conversation and loads its thread and the sidebar together.
    pub async fn open_conversation(&self, conversation_id: &str) -> Result<(), ConversationError> {
        let conversation_id = conversation_id.trim();
        if conversation_id.is_empty() {
            return Err(ConversationError::InvalidConversationId);
        }
        {
            let mut state = self.state();
            if state.deleted.contains(conversation_id) {
                return Err(ConversationError::Deleted(conversation_id.to_string()));
            }
            state.activate(conversation_id.to_string(), &self.options.app_url);
        }
        info!("Opened conversation {}", conversation_id);
        futures::join!(self.load_history(conversation_id), self.list_conversations());
        Ok(())
    }

    /// Replaces the thread with the backend's history, keeping messages sent
    /// while the request was in flight after it. Returns false when the
    /// conversation is not active or a newer load or a switch superseded it.
    pub async fn load_history(&self, conversation_id: &str) -> bool {
        let (generation, base) = {
            let mut state = self.state();
            if state.active_id != conversation_id {
                debug!("Not loading history for inactive conversation {}", conversation_id);
                return false;
            }
            state.history_generation += 1;
            state.history_pending = true;
            (state.history_generation, state.messages.len())
        };

        let messages = match self.backend.fetch_history(conversation_id).await {
            Ok(history) => history.into_messages(),
            Err(BackendError::Status(status)) => {
                debug!("No history for {} (HTTP {})", conversation_id, status);
                Vec::new()
            }
            Err(e) => {
                error!("Error fetching history for {}: {}", conversation_id, e);
                Vec::new()
            }
        };

        let mut state = self.state();
        if state.active_id != conversation_id || state.history_generation != generation {
            debug!("Discarding stale history response for {}", conversation_id);
            return false;
        }
        let base = base.min(state.messages.len());
        let sent_meanwhile = state.messages.split_off(base);
        state.messages = messages;
        state.messages.extend(sent_meanwhile);
        state.history_pending = false;
        state.ready = true;
        true
    }

    /// Refreshes the sidebar. Failures keep the previous list.
    pub async fn list_conversations(&self) -> bool {
        let generation = {
            let mut state = self.state();
            state.list_generation += 1;
            state.list_generation
        };

        match self.backend.fetch_conversations(&self.identity.id).await {
            Ok(list) => {
                let mut state = self.state();
                if state.list_generation != generation {
                    debug!("Discarding stale conversation list");
                    return false;
                }
                let deleted = &state.deleted;
                let conversations: Vec<String> = list.conversations
                    .into_iter()
                    .filter(|id| !deleted.contains(id))
                    .collect();
                let titles: HashMap<String, String> = list.titles
                    .into_iter()
                    .filter(|(id, _)| !deleted.contains(id))
                    .collect();
                state.conversations = conversations;
                state.titles = titles;
                true
            }
            Err(e) => {
                warn!("Error fetching conversations for {}: {}", self.identity.id, e);
                false
            }
        }
    }

    /// Appends the user's message, exchanges it with the backend and appends
    /// exactly one assistant reply. Backend failures become the reply text.
    pub async fn send_message(&self, text: &str) -> Result<ChatMessage, ConversationError> {
        if text.trim().is_empty() {
            return Err(ConversationError::EmptyMessage);
        }
        let (request, view, first_exchange) = {
            let mut state = self.state();
            if state.sending_view.is_some() {
                return Err(ConversationError::SendInProgress);
            }
            // With history still loading the thread may not be empty after all.
            let first_exchange = state.messages.is_empty() && !state.history_pending;
            state.messages.push(ChatMessage::user(text));
            let view = state.view_generation;
            state.sending_view = Some(view);
            let request = ChatRequest {
                message: text.to_string(),
                conversation_id: state.active_id.clone(),
                user_email: self.identity.id.clone(),
                user_name: state.user_name.clone(),
            };
            (request, view, first_exchange)
        };

        let (reply, succeeded) = match self.backend.send_chat(&request).await {
            Ok(resp) => (ChatMessage::assistant(resp.response), true),
            Err(BackendError::Status(status)) => {
                warn!("Chat request for {} failed with HTTP {}", request.conversation_id, status);
                (ChatMessage::assistant(server_error_message(status)), false)
            }
            Err(BackendError::Decode(e)) => {
                error!("Unreadable chat response: {}", e);
                (ChatMessage::assistant(INVALID_RESPONSE_MESSAGE), false)
            }
            Err(e) => {
                error!("Failed to send message: {}", e);
                (ChatMessage::assistant(CONNECTION_ERROR_MESSAGE), false)
            }
        };

        {
            let mut state = self.state();
            state.sending_view = None;
            if state.view_generation == view {
                state.messages.push(reply.clone());
                state.ready = true;
            } else {
                debug!("Reply for {} arrived after switching away", request.conversation_id);
            }
        }

        if succeeded && first_exchange {
            self.schedule_title_refresh();
        }
        Ok(reply)
    }

    fn schedule_title_refresh(&self) {
        let client = self.clone();
        let delay = self.options.title_refresh_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            client.list_conversations().await;
        });
    }

    /// Removes the conversation locally at once, then asks the backend to
    /// delete it. The request outcome is only logged.
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ConversationError> {
        let conversation_id = conversation_id.trim();
        if conversation_id.is_empty() {
            return Err(ConversationError::InvalidConversationId);
        }
        let was_active = {
            let mut state = self.state();
            state.conversations.retain(|id| id != conversation_id);
            state.titles.remove(conversation_id);
            state.deleted.insert(conversation_id.to_string());
            state.active_id == conversation_id
        };
        if was_active {
            self.start_conversation();
        }

        match self.backend.delete_conversation(conversation_id).await {
            Ok(()) => info!("Deleted conversation {}", conversation_id),
            Err(e) => warn!("Delete request for {} failed: {}", conversation_id, e),
        }

        self.list_conversations().await;
        Ok(())
    }
}
