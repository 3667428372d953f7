//! Authorization-code flow helpers
//!
//! Generates the anti-forgery `state` value, builds the authorize URL, and
//! models the two ends of the browser round trip: the outbound redirect and
//! the inbound callback carrying `code` and `state`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;

use crate::config::Scope;
use crate::error::{Error, Result};

/// Position of a client in the authorization-code flow.
///
/// `Unauthenticated → RedirectIssued → CallbackPending → Authenticated`.
/// Client-credentials tokens jump straight to `Authenticated`.
///
/// `CallbackPending` only lasts while `process_auth_response` runs and is
/// reported in its logs. `OAuthClient::phase()` reads the store, so it
/// returns one of the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    RedirectIssued,
    CallbackPending,
    Authenticated,
}

impl AuthPhase {
    pub fn label(&self) -> &'static str {
        match self {
            AuthPhase::Unauthenticated => "unauthenticated",
            AuthPhase::RedirectIssued => "redirect_issued",
            AuthPhase::CallbackPending => "callback_pending",
            AuthPhase::Authenticated => "authenticated",
        }
    }
}

/// Generate a random anti-forgery state value.
///
/// 32 random bytes encoded as URL-safe base64 without padding (43 chars),
/// so it can be placed in a query string unescaped.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the authorize URL the user's browser is sent to.
///
/// `scope` is omitted when empty.
pub fn build_authorization_url(
    authorize_endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
    scope: &Scope,
) -> Result<String> {
    let joined = scope.joined();
    let mut params = vec![
        ("client_id", client_id),
        ("redirect_uri", redirect_uri),
        ("response_type", "code"),
        ("state", state),
    ];
    if !scope.is_empty() {
        params.push(("scope", joined.as_str()));
    }
    let query = serde_urlencoded::to_string(&params)
        .map_err(|e| Error::Protocol(format!("encoding authorize query: {e}")))?;
    Ok(format!("{authorize_endpoint}?{query}"))
}

/// A redirect the hosting web layer should send to the browser.
///
/// The request that produced it should end right after the response is
/// written; the flow resumes in the callback request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRedirect {
    location: String,
}

impl AuthRedirect {
    pub fn new(location: String) -> Self {
        Self { location }
    }

    /// Always 302 Found.
    pub fn status(&self) -> u16 {
        302
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// `Location` header pair ready to attach to a response.
    pub fn header(&self) -> (&'static str, &str) {
        ("Location", &self.location)
    }
}

/// Parameters the provider sends back to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Callback {
    pub code: Option<String>,
    pub state: Option<String>,
}

impl Callback {
    /// Explicit values, for callers that are not the redirect target itself.
    pub fn new(code: Option<&str>, state: Option<&str>) -> Self {
        Self {
            code: non_empty(code),
            state: non_empty(state),
        }
    }

    /// Parse `code` and `state` from an inbound query string.
    ///
    /// A leading `?` is accepted. Malformed input yields an empty callback,
    /// which then fails the missing-code check.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
        Self::new(find_pair(&pairs, "code"), find_pair(&pairs, "state"))
    }

    /// Fill fields missing here from `inbound`. Explicit values win.
    pub fn or(self, inbound: Callback) -> Self {
        Self {
            code: self.code.or(inbound.code),
            state: self.state.or(inbound.state),
        }
    }
}

fn find_pair<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORIZE: &str = "https://id.scene.org/oauth/authorize/";

    #[test]
    fn state_is_url_safe_base64() {
        let state = generate_state();
        assert_eq!(state.len(), 43);
        assert!(
            state
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "state must be URL-safe base64 (no padding): {state}"
        );
    }

    #[test]
    fn states_are_unique() {
        assert_ne!(generate_state(), generate_state());
    }

    #[test]
    fn authorization_url_contains_required_params() {
        let url = build_authorization_url(
            AUTHORIZE,
            "myPortalClientID",
            "http://my.domain.tld/return.url",
            "st4te",
            &Scope::from("basic user:read"),
        )
        .unwrap();

        assert!(url.starts_with(AUTHORIZE));
        assert!(url.contains("client_id=myPortalClientID"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Fmy.domain.tld%2Freturn.url"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=st4te"));
        assert!(url.contains("scope=basic+user%3Aread"));
    }

    #[test]
    fn authorization_url_omits_empty_scope() {
        let url =
            build_authorization_url(AUTHORIZE, "id", "http://r", "s", &Scope::default()).unwrap();
        assert!(!url.contains("scope="));
    }

    #[test]
    fn callback_parses_query_string() {
        let cb = Callback::from_query("?code=abc123&state=xyz&extra=1");
        assert_eq!(cb.code.as_deref(), Some("abc123"));
        assert_eq!(cb.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn callback_treats_empty_values_as_missing() {
        let cb = Callback::from_query("code=&state=");
        assert_eq!(cb, Callback::default());
    }

    #[test]
    fn explicit_callback_values_win() {
        let explicit = Callback::new(Some("explicit"), None);
        let merged = explicit.or(Callback::from_query("code=inbound&state=s1"));
        assert_eq!(merged.code.as_deref(), Some("explicit"));
        assert_eq!(merged.state.as_deref(), Some("s1"));
    }

    #[test]
    fn redirect_is_a_302_with_location() {
        let redirect = AuthRedirect::new("https://id.scene.org/oauth/authorize/?a=b".into());
        assert_eq!(redirect.status(), 302);
        assert_eq!(
            redirect.header(),
            ("Location", "https://id.scene.org/oauth/authorize/?a=b")
        );
    }

    #[test]
    fn phase_labels_are_snake_case() {
        assert_eq!(AuthPhase::RedirectIssued.label(), "redirect_issued");
        assert_eq!(AuthPhase::Authenticated.label(), "authenticated");
    }
}
