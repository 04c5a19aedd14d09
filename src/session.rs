use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "event_session";

/// Identity the browser holds for one event: the resolved guest, the event,
/// and the invite token it originally entered. Stored client-side as a JSON
/// cookie with a 30-day expiry convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestSession {
    #[serde(alias = "guestId")]
    pub guest_id: Uuid,
    #[serde(alias = "eventId")]
    pub event_id: Uuid,
    #[serde(default, alias = "eventToken")]
    pub event_token: Option<String>,
}

/// Extractor surfacing the session once at the request boundary. Handlers
/// receive it as an explicit value; nothing below the routes reads cookies.
#[derive(Debug, Clone, Default)]
pub struct MaybeSession(pub Option<GuestSession>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(session_from_headers(&parts.headers)))
    }
}

fn session_from_headers(headers: &HeaderMap) -> Option<GuestSession> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix(SESSION_COOKIE) {
            let Some(value) = value.strip_prefix('=') else {
                continue;
            };
            // Browsers store the JSON percent-encoded; curl clients may not.
            let decoded = percent_decode(value);
            if let Ok(session) = serde_json::from_str::<GuestSession>(&decoded) {
                return Some(session);
            }
        }
    }

    None
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(b) = hex {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_plain_json_cookie() {
        let guest_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let cookie = format!(
            "other=1; event_session={{\"guest_id\":\"{}\",\"event_id\":\"{}\",\"event_token\":\"AB12CD34EF56\"}}",
            guest_id, event_id
        );
        let session = session_from_headers(&headers_with_cookie(&cookie)).unwrap();
        assert_eq!(session.guest_id, guest_id);
        assert_eq!(session.event_id, event_id);
        assert_eq!(session.event_token.as_deref(), Some("AB12CD34EF56"));
    }

    #[test]
    fn parses_percent_encoded_camel_case_cookie() {
        let guest_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let json = format!(
            "{{\"guestId\":\"{}\",\"eventId\":\"{}\",\"eventToken\":\"AB12CD34EF56\"}}",
            guest_id, event_id
        );
        let encoded: String = json
            .chars()
            .map(|c| match c {
                '{' => "%7B".to_string(),
                '}' => "%7D".to_string(),
                '"' => "%22".to_string(),
                ':' => "%3A".to_string(),
                ',' => "%2C".to_string(),
                other => other.to_string(),
            })
            .collect();
        let cookie = format!("event_session={}", encoded);
        let session = session_from_headers(&headers_with_cookie(&cookie)).unwrap();
        assert_eq!(session.guest_id, guest_id);
        assert_eq!(session.event_id, event_id);
    }

    #[test]
    fn missing_or_garbled_cookie_yields_none() {
        assert!(session_from_headers(&HeaderMap::new()).is_none());
        assert!(session_from_headers(&headers_with_cookie("event_session=not-json")).is_none());
        assert!(session_from_headers(&headers_with_cookie("unrelated=1")).is_none());
    }
}
