//! Login collaborators that yield the `LOGIN=` signature

use reqwest::header::REFERER;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::error::LoginError;

const CSRF_FIELD: &str = "csrfmiddlewaretoken";

/// Produces the opaque signature sent as `LOGIN=<signature>`.
///
/// Called once per connection attempt, before any inbound frame is read.
#[allow(async_fn_in_trait)]
pub trait SignatureProvider {
    async fn signature(&self) -> Result<String, LoginError>;
}

/// A signature obtained out of band (e.g. from `PIXEL_SIGNATURE`).
#[derive(Clone)]
pub struct StaticSignature(String);

impl StaticSignature {
    pub fn new(signature: impl Into<String>) -> Self {
        Self(signature.into())
    }
}

impl std::fmt::Debug for StaticSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticSignature(<redacted>)")
    }
}

impl SignatureProvider for StaticSignature {
    async fn signature(&self) -> Result<String, LoginError> {
        if self.0.is_empty() {
            return Err(LoginError::SignatureNotFound);
        }
        Ok(self.0.clone())
    }
}

/// Form login against the game's website.
///
/// GET the login page (for the session cookie and CSRF token), POST the
/// credentials, then read the signature out of the first inline script of
/// the page the server lands us on.
pub struct HttpLogin {
    client: Client,
    login_url: String,
    username: String,
    password: String,
}

impl HttpLogin {
    pub fn new(
        login_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        accept_invalid_certs: bool,
    ) -> Result<Self, LoginError> {
        let client = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            login_url: login_url.into(),
            username: username.into(),
            password: password.into(),
        })
    }
}

impl SignatureProvider for HttpLogin {
    #[instrument(name = "login.http", skip(self), fields(url = %self.login_url, user = %self.username))]
    async fn signature(&self) -> Result<String, LoginError> {
        let page = self
            .client
            .get(&self.login_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let csrf = extract_csrf_token(&page);
        if csrf.is_none() {
            warn!("Login page has no CSRF token, posting without one");
        }
        debug!(has_csrf = csrf.is_some(), "Fetched login page");

        let mut form = vec![
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];
        if let Some(token) = csrf.as_deref() {
            form.push((CSRF_FIELD, token));
        }

        let response = self
            .client
            .post(&self.login_url)
            .header(REFERER, &self.login_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            return Err(LoginError::Rejected(format!("HTTP {status}")));
        }
        let landing = response.error_for_status()?.text().await?;

        let signature = extract_signature(&landing).ok_or(LoginError::SignatureNotFound)?;
        info!("Obtained login signature");
        Ok(signature)
    }
}

/// Value of the hidden `csrfmiddlewaretoken` input, if the form has one.
fn extract_csrf_token(html: &str) -> Option<String> {
    tags(html, "input")
        .map(|(attrs, _)| parse_attributes(attrs))
        .find(|attrs| attrs.iter().any(|(k, v)| k == "name" && v == CSRF_FIELD))?
        .into_iter()
        .find(|(k, _)| k == "value")
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

/// The signature is the first single-quoted literal of the first statement
/// of the first `<script>` element, e.g. `var signature = 'abc';`.
fn extract_signature(html: &str) -> Option<String> {
    let (_, body_start) = tags(html, "script").next()?;
    let rest = &html[body_start..];
    let body_len = rest.to_ascii_lowercase().find("</script")?;
    let body = &rest[..body_len];

    let statement = body.split(';').next()?;
    let signature = statement.split('\'').nth(1)?;
    (!signature.is_empty()).then(|| signature.to_string())
}

/// Start tags named `name` (ASCII case-insensitive): the raw attribute text
/// and the byte offset just past the closing `>`.
fn tags<'a>(html: &'a str, name: &'a str) -> impl Iterator<Item = (&'a str, usize)> + 'a {
    html.match_indices('<').filter_map(move |(open, _)| {
        let inner_start = open + 1;
        let len = html[inner_start..].find('>')?;
        let inner = &html[inner_start..inner_start + len];
        let name_len = inner
            .find(|c: char| c.is_whitespace() || c == '/')
            .unwrap_or(inner.len());
        inner[..name_len]
            .eq_ignore_ascii_case(name)
            .then(|| (&inner[name_len..], inner_start + len + 1))
    })
}

/// `name="v"`, `name='v'`, `name=v` and bare `name` attributes, names
/// lower-cased, in source order.
fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = raw.trim_start();
    while !rest.is_empty() {
        let name_len = rest
            .find(|c: char| c == '=' || c == '/' || c.is_whitespace())
            .unwrap_or(rest.len());
        if name_len == 0 && !rest.starts_with('=') {
            rest = rest[1..].trim_start();
            continue;
        }
        let name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start();

        let mut value = String::new();
        if let Some(after) = rest.strip_prefix('=') {
            let after = after.trim_start();
            let (v, remainder) = match after.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let quoted = &after[1..];
                    let end = quoted.find(quote).unwrap_or(quoted.len());
                    (&quoted[..end], quoted.get(end + 1..).unwrap_or(""))
                }
                _ => {
                    let end = after.find(char::is_whitespace).unwrap_or(after.len());
                    (&after[..end], &after[end..])
                }
            };
            value = v.to_string();
            rest = remainder.trim_start();
        }
        if !name.is_empty() {
            attrs.push((name, value));
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"<html><body><form method="post">
        <input type="hidden" name="csrfmiddlewaretoken" value="tok123">
        <input id="id_username" name="username"><input id="id_password" name="password">
        </form></body></html>"#;

    const LANDING_PAGE: &str = r#"<html><head>
        <script>var signature = 'sig-abc.def'; var other = 'x';</script>
        <script src="/static/game.js"></script></head></html>"#;

    #[test]
    fn test_extract_csrf_token() {
        assert_eq!(extract_csrf_token(LOGIN_PAGE).as_deref(), Some("tok123"));
    }

    #[test]
    fn test_extract_csrf_token_value_before_name() {
        let html = r#"<input value="abc" type="hidden" name="csrfmiddlewaretoken">"#;
        assert_eq!(extract_csrf_token(html).as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_csrf_token_single_quotes() {
        let html = "<input type='hidden' name='csrfmiddlewaretoken' value='sq-tok'>";
        assert_eq!(extract_csrf_token(html).as_deref(), Some("sq-tok"));
    }

    #[test]
    fn test_extract_csrf_token_unquoted_and_upper_case_tag() {
        let html = "<INPUT TYPE=hidden VALUE=bare-tok NAME=csrfmiddlewaretoken />";
        assert_eq!(extract_csrf_token(html).as_deref(), Some("bare-tok"));
    }

    #[test]
    fn test_extract_csrf_token_skips_other_inputs() {
        let html = r#"<input name="username" value="nope">
            <input value='later' name="csrfmiddlewaretoken">"#;
        assert_eq!(extract_csrf_token(html).as_deref(), Some("later"));
    }

    #[test]
    fn test_extract_csrf_token_empty_value() {
        let html = r#"<input name="csrfmiddlewaretoken" value="">"#;
        assert!(extract_csrf_token(html).is_none());
    }

    #[test]
    fn test_parse_attributes() {
        let attrs = parse_attributes(r#" type=hidden disabled data-x='a b' NAME="n" /"#);
        assert_eq!(
            attrs,
            vec![
                ("type".to_string(), "hidden".to_string()),
                ("disabled".to_string(), String::new()),
                ("data-x".to_string(), "a b".to_string()),
                ("name".to_string(), "n".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_csrf_token_absent() {
        assert!(extract_csrf_token("<form></form>").is_none());
    }

    #[test]
    fn test_extract_signature() {
        assert_eq!(extract_signature(LANDING_PAGE).as_deref(), Some("sig-abc.def"));
    }

    #[test]
    fn test_extract_signature_upper_case_script_with_attributes() {
        let html = "<SCRIPT type='text/javascript'>var s = 'UP-sig';</SCRIPT>";
        assert_eq!(extract_signature(html).as_deref(), Some("UP-sig"));
    }

    #[test]
    fn test_extract_signature_missing_markup() {
        assert!(extract_signature("<html>no scripts here</html>").is_none());
        assert!(extract_signature("<script>var x = 1;</script>").is_none());
        assert!(extract_signature("<script>var s = '';</script>").is_none());
    }

    #[tokio::test]
    async fn test_static_signature() {
        let sig = StaticSignature::new("abc");
        assert_eq!(sig.signature().await.unwrap(), "abc");
        assert!(matches!(
            StaticSignature::new("").signature().await,
            Err(LoginError::SignatureNotFound)
        ));
    }

    #[test]
    fn test_static_signature_debug_is_redacted() {
        assert!(!format!("{:?}", StaticSignature::new("secret")).contains("secret"));
    }

    #[tokio::test]
    async fn test_http_login_posts_credentials_and_reads_signature() {
        let server = httpmock::MockServer::start_async().await;

        let page = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/login/");
                then.status(200).body(LOGIN_PAGE);
            })
            .await;
        let submit = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST)
                    .path("/login/")
                    .body_contains("username=wikibot")
                    .body_contains("password=hunter2")
                    .body_contains("csrfmiddlewaretoken=tok123");
                then.status(200).body(LANDING_PAGE);
            })
            .await;

        let login = HttpLogin::new(server.url("/login/"), "wikibot", "hunter2", false).unwrap();
        let sig = login.signature().await.unwrap();

        assert_eq!(sig, "sig-abc.def");
        page.assert_async().await;
        submit.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_login_without_signature_markup_fails() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/login/");
                then.status(200).body(LOGIN_PAGE);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST).path("/login/");
                then.status(200).body("<html>Please enter a correct username</html>");
            })
            .await;

        let login = HttpLogin::new(server.url("/login/"), "wikibot", "wrong", false).unwrap();
        assert!(matches!(
            login.signature().await,
            Err(LoginError::SignatureNotFound)
        ));
    }

    #[tokio::test]
    async fn test_http_login_client_error_is_rejected() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/login/");
                then.status(200).body(LOGIN_PAGE);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST).path("/login/");
                then.status(403).body("forbidden");
            })
            .await;

        let login = HttpLogin::new(server.url("/login/"), "wikibot", "pw", false).unwrap();
        assert!(matches!(login.signature().await, Err(LoginError::Rejected(_))));
    }
}
