//! Who is talking to the backend.
//!
//! An identity is resolved once at start-up and handed to the conversation
//! client explicitly. It changes only through [`sign_in`] and [`sign_out`].

use crate::storage::{ LocalStore, StorageError, GUEST_ID_KEY, SESSION_KEY, USER_NAME_KEY };
use log::{ info, warn };
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

pub const FALLBACK_USER_ID: &str = "guest";
pub const DEFAULT_DISPLAY_NAME: &str = "Guest";

/// What an external OAuth flow hands over after a successful sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthSession {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityKind {
    Session,
    Guest,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub kind: IdentityKind,
}

impl Identity {
    pub fn is_signed_in(&self) -> bool {
        self.kind == IdentityKind::Session
    }

    /// The name sent with chat requests. Nothing is sent while only the
    /// placeholder name is known, signed in or not.
    pub fn user_name(&self) -> Option<&str> {
        let name = self.display_name.trim();
        if name.is_empty() || name == DEFAULT_DISPLAY_NAME {
            None
        } else {
            Some(name)
        }
    }
}

pub fn resolve_identity(session: Option<&OAuthSession>, store: &dyn LocalStore) -> Identity {
    let stored_name = store
        .get(USER_NAME_KEY)
        .ok()
        .flatten()
        .filter(|name| !name.trim().is_empty());

    if let Some(session) = session.filter(|s| !s.email.trim().is_empty()) {
        let display_name = session.name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or(stored_name)
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());
        return Identity {
            id: session.email.clone(),
            display_name,
            kind: IdentityKind::Session,
        };
    }

    let display_name = stored_name.unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());
    match guest_id(store) {
        Ok(id) => Identity { id, display_name, kind: IdentityKind::Guest },
        Err(e) => {
            warn!("Local storage unavailable ({}); using shared guest identity", e);
            Identity {
                id: FALLBACK_USER_ID.to_string(),
                display_name,
                kind: IdentityKind::Fallback,
            }
        }
    }
}

fn guest_id(store: &dyn LocalStore) -> Result<String, StorageError> {
    if let Some(id) = store.get(GUEST_ID_KEY)?.filter(|id| !id.is_empty()) {
        return Ok(id);
    }
    let id = Uuid::new_v4().to_string();
    store.set(GUEST_ID_KEY, &id)?;
    info!("Generated guest identity {}", id);
    Ok(id)
}

pub fn stored_session(store: &dyn LocalStore) -> Option<OAuthSession> {
    let raw = store.get(SESSION_KEY).ok().flatten()?;
    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!("Ignoring unreadable stored session: {}", e);
            None
        }
    }
}

pub fn sign_in(store: &dyn LocalStore, session: &OAuthSession) -> Result<(), StorageError> {
    let raw = serde_json::to_string(session)?;
    store.set(SESSION_KEY, &raw)?;
    info!("Signed in as {}", session.email);
    Ok(())
}

pub fn sign_out(store: &dyn LocalStore) -> Result<(), StorageError> {
    store.remove(SESSION_KEY)?;
    info!("Signed out");
    Ok(())
}
