use url::Url;

pub const ID_QUERY_PARAM: &str = "id";

/// The shareable page address for a conversation, e.g. `http://host/?id=conv_1`.
pub fn conversation_location(app_url: &Url, conversation_id: &str) -> Url {
    let mut url = app_url.clone();
    url.set_fragment(None);
    url.query_pairs_mut().clear().append_pair(ID_QUERY_PARAM, conversation_id);
    url
}

/// Accepts either a page address carrying `?id=` or a bare conversation id.
pub fn conversation_id_from(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(input) {
        if !url.cannot_be_a_base() {
            return url
                .query_pairs()
                .find(|(key, _)| key == ID_QUERY_PARAM)
                .map(|(_, value)| value.trim().to_string())
                .filter(|id| !id.is_empty());
        }
    }
    if input.starts_with('?') || input.starts_with("/?") {
        let query = input.trim_start_matches('/').trim_start_matches('?');
        return url::form_urlencoded
            ::parse(query.as_bytes())
            .find(|(key, _)| key == ID_QUERY_PARAM)
            .map(|(_, value)| value.trim().to_string())
            .filter(|id| !id.is_empty());
    }
    if input.chars().any(char::is_whitespace) {
        return None;
    }
    Some(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_replaces_existing_query() {
        let app = Url::parse("http://localhost:3000/?id=old#top").unwrap();
        let url = conversation_location(&app, "conv_42");
        assert_eq!(url.as_str(), "http://localhost:3000/?id=conv_42");
    }

    #[test]
    fn ids_are_read_from_urls_queries_and_bare_values() {
        assert_eq!(
            conversation_id_from("https://chat.example.com/?id=conv_7").as_deref(),
            Some("conv_7")
        );
        assert_eq!(conversation_id_from("/?id=conv_8").as_deref(), Some("conv_8"));
        assert_eq!(conversation_id_from("conv_9").as_deref(), Some("conv_9"));
        assert_eq!(conversation_id_from("https://chat.example.com/"), None);
        assert_eq!(conversation_id_from("   "), None);
        assert_eq!(conversation_id_from("two words"), None);
    }
}
