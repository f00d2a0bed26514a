use crate::models::chat::{ ChatMessage, Role };
use chrono::{ DateTime, Local, Utc };

pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

/// Compact age used in the sidebar: `now`, `5h`, `3d`.
pub fn format_relative(ts: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let hours = (*now - *ts).num_minutes() as f64 / 60.0;
    if hours < 1.0 {
        "now".to_string()
    } else if hours < 24.0 {
        format!("{}h", hours.floor() as i64)
    } else {
        format!("{}d", (hours / 24.0).floor() as i64)
    }
}

/// Millisecond timestamp embedded in generated ids such as `conv_1700000000000`.
pub fn conversation_started_at(conversation_id: &str) -> Option<DateTime<Utc>> {
    conversation_id
        .strip_prefix("conv_")
        .and_then(|millis| millis.parse::<i64>().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

pub fn render_message(message: &ChatMessage, user_label: &str) -> String {
    let speaker = match message.role {
        Role::User => user_label,
        Role::Assistant => "OrionBot",
    };
    match &message.timestamp {
        Some(ts) => format!("[{}] {}: {}", format_time(ts), speaker, message.content),
        None => format!("{}: {}", speaker, message.content),
    }
}

pub fn render_thread(messages: &[ChatMessage], user_label: &str) -> String {
    messages
        .iter()
        .map(|m| render_message(m, user_label))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct SidebarEntry<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub active: bool,
}

pub fn render_sidebar(entries: &[SidebarEntry<'_>], now: &DateTime<Utc>) -> String {
    if entries.is_empty() {
        return "No conversations yet".to_string();
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let marker = if entry.active { "*" } else { " " };
            let age = conversation_started_at(entry.id)
                .map(|ts| format!(" ({})", format_relative(&ts, now)))
                .unwrap_or_default();
            format!("{} {:>2}. {}{}  [{}]", marker, i + 1, entry.title, age, entry.id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
