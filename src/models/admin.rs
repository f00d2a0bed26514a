use serde::{ Serialize, Deserialize };

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminMessage {
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub assistant_response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AdminMessages {
    #[serde(default)]
    pub messages: Vec<AdminMessage>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AdminUsers {
    #[serde(default)]
    pub users: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_messages: u64,
    #[serde(default)]
    pub total_conversations: u64,
    #[serde(default)]
    pub today_messages: u64,
    #[serde(default)]
    pub active_users: u64,
}
