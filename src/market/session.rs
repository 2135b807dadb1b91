//! Authenticated market session: device identity, credential and token
//! lifecycle, and the prefetch cache.

use std::collections::HashMap;

use bytes::Bytes;
use reqwest::blocking::Client;
use reqwest::header::{
    ACCEPT_ENCODING, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue,
    USER_AGENT,
};
use thiserror::Error;
use tracing::debug;

use super::codec::{self, DecodeError};
use super::proto::ResponseWrapper;

/// Production authentication endpoint.
pub const LOGIN_URL: &str = "https://android.clients.google.com/auth";
/// Production API endpoint; operations are relative paths under it.
pub const API_BASE: &str = "https://android.clients.google.com/fdfe";

const SERVICE: &str = "androidmarket";
const ACCOUNT_TYPE: &str = "HOSTED_OR_GOOGLE";
const LOGIN_APP: &str = "com.android.vending";
const SDK_VERSION: &str = "16";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";
const PROTO_CONTENT_TYPE: &str = "application/x-protobuf";

const MARKET_USER_AGENT: &str = "Android-Finsky/3.7.13 (api=3,versionCode=8013013,sdk=16,\
     device=crespo,hardware=herring,product=soju)";
const CLIENT_ID: &str = "am-android-google";
const ENABLED_EXPERIMENTS: &str = "cl:billing.select_add_instrument_by_default";
const UNSUPPORTED_EXPERIMENTS: &str = "nocache:billing.use_charging_poller,market_emails,\
     buyer_currency,prod_baseline,checkin.set_asset_paid_app_field,shekel_test,content_ratings,\
     buyer_currency_in_app,nocache:encrypted_apk,recent_changes";

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("server refused login: {0}")]
    Denied(String),

    #[error("auth token not found in login response")]
    TokenNotFound,

    #[error("session holds a stored token; no account credentials to log in with")]
    NoCredentials,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("response missing expected field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Login(#[from] LoginError),
}

/// Device identity and locale parameters sent with every request.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub android_id: String,
    /// `Accept-Language` locale for API requests.
    pub lang: String,
    pub device_country: String,
    pub operator_country: String,
    pub device_lang: String,
}

impl DeviceProfile {
    pub fn new(android_id: &str) -> Self {
        Self {
            android_id: android_id.to_string(),
            lang: "ru_RU".to_string(),
            device_country: "ru".to_string(),
            operator_country: "ru".to_string(),
            device_lang: "ru".to_string(),
        }
    }
}

/// How the session proves itself: account credentials or a previously
/// issued token. Exactly one variant exists per session.
#[derive(Debug, Clone)]
pub enum Credentials {
    Password { email: String, password: String },
    Token(String),
}

/// Endpoint pair; injectable so tests can point at a local server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub login_url: String,
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login_url: LOGIN_URL.to_string(),
            api_base: API_BASE.to_string(),
        }
    }
}

/// The body of a POST operation, carrying its content type.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded; charset=UTF-8`
    Form(String),
    /// `application/x-protobuf`
    Proto(Vec<u8>),
}

/// One authenticated protocol session.
///
/// Created once per run and discarded at process exit; only the token is
/// persisted, by the caller.
#[derive(Debug)]
pub struct Session {
    device: DeviceProfile,
    credentials: Credentials,
    token: Option<String>,
    /// Raw response bodies the server volunteered, keyed by request path.
    /// Entries are never evicted; each path is requested at most once per
    /// run in practice.
    prefetch: HashMap<String, Bytes>,
    client: Client,
    base_headers: HeaderMap,
    endpoints: Endpoints,
}

impl Session {
    pub fn new(device: DeviceProfile, credentials: Credentials, endpoints: Endpoints) -> Self {
        let token = match &credentials {
            Credentials::Token(token) => Some(token.clone()),
            Credentials::Password { .. } => None,
        };
        let client = Client::builder()
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            device,
            credentials,
            token,
            prefetch: HashMap::new(),
            client,
            base_headers: base_headers(),
            endpoints,
        }
    }

    /// True when an auth token is currently held.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// The current auth token, for persistence by the caller.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    /// The underlying HTTP client, for requests outside the API base
    /// (the signed artifact URL).
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Authenticate with the account credentials and store the token.
    ///
    /// The response is plain text: whitespace-separated `key=value`
    /// tokens with case-insensitive keys. An `auth` key carries the
    /// token; an `error` key carries the refusal reason. This format is
    /// a fixed external contract.
    pub fn login(&mut self) -> Result<(), LoginError> {
        let (email, password) = match &self.credentials {
            Credentials::Password { email, password } => (email.as_str(), password.as_str()),
            Credentials::Token(_) => return Err(LoginError::NoCredentials),
        };
        let form = [
            ("Email", email),
            ("Passwd", password),
            ("service", SERVICE),
            ("accountType", ACCOUNT_TYPE),
            ("has_permission", "1"),
            ("source", "android"),
            ("androidId", self.device.android_id.as_str()),
            ("app", LOGIN_APP),
            ("device_country", self.device.device_country.as_str()),
            ("operatorCountry", self.device.operator_country.as_str()),
            ("lang", self.device.device_lang.as_str()),
            ("sdk_version", SDK_VERSION),
        ];
        let body = self
            .client
            .post(&self.endpoints.login_url)
            .header(ACCEPT_ENCODING, HeaderValue::from_static(""))
            .form(&form)
            .send()?
            .text()?;

        let fields = parse_login_response(&body);
        if let Some(token) = fields.get("auth") {
            debug!("login succeeded");
            self.token = Some(token.clone());
            Ok(())
        } else if let Some(reason) = fields.get("error") {
            Err(LoginError::Denied(reason.clone()))
        } else {
            Err(LoginError::TokenNotFound)
        }
    }

    /// Issue one API request and decode the envelope.
    ///
    /// A body-less request whose path has a prefetch entry is answered
    /// from the cache with zero network calls. Otherwise the request is
    /// a GET (no body) or POST (with body) carrying the fixed protocol
    /// headers plus the per-session auth and device headers.
    pub fn authenticated_request(
        &mut self,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<ResponseWrapper, RequestError> {
        if body.is_none() {
            if let Some(cached) = self.prefetch.get(path) {
                debug!(path, "serving response from prefetch cache");
                return Ok(codec::decode_envelope(cached)?);
            }
        }

        let url = format!("{}/{}", self.endpoints.api_base, path);
        let token = self.token.as_deref().unwrap_or_default();
        let request = match body {
            None => self.client.get(&url),
            Some(RequestBody::Form(data)) => self
                .client
                .post(&url)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(data),
            Some(RequestBody::Proto(data)) => self
                .client
                .post(&url)
                .header(CONTENT_TYPE, PROTO_CONTENT_TYPE)
                .body(data),
        };
        let response = request
            .headers(self.base_headers.clone())
            .header(ACCEPT_LANGUAGE, self.device.lang.as_str())
            .header(AUTHORIZATION, format!("GoogleLogin auth={token}"))
            .header("X-DFE-Device-Id", self.device.android_id.as_str())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status(status));
        }
        let data = response.bytes()?;
        let envelope = codec::decode_envelope(&data)?;
        self.register_prefetch(&envelope);
        Ok(envelope)
    }

    /// Record any server-volunteered responses so a later request for the
    /// same path can skip the network.
    pub fn register_prefetch(&mut self, envelope: &ResponseWrapper) {
        for entry in &envelope.pre_fetch {
            if entry.url.is_empty() || entry.response.is_empty() {
                continue;
            }
            debug!(url = %entry.url, len = entry.response.len(), "registered prefetch entry");
            self.prefetch
                .insert(entry.url.clone(), Bytes::copy_from_slice(&entry.response));
        }
    }
}

/// Fixed protocol headers, built once per session.
fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "X-DFE-Enabled-Experiments",
        HeaderValue::from_static(ENABLED_EXPERIMENTS),
    );
    headers.insert(
        "X-DFE-Unsupported-Experiments",
        HeaderValue::from_static(UNSUPPORTED_EXPERIMENTS),
    );
    headers.insert("X-DFE-Client-Id", HeaderValue::from_static(CLIENT_ID));
    headers.insert(USER_AGENT, HeaderValue::from_static(MARKET_USER_AGENT));
    headers.insert("X-DFE-SmallestScreenWidthDp", HeaderValue::from_static("320"));
    headers.insert("X-DFE-Filter-Level", HeaderValue::from_static("3"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(""));
    headers
}

/// Parse the plain-text login body into lowercased `key=value` fields.
fn parse_login_response(body: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for item in body.split_whitespace() {
        let Some((key, value)) = item.split_once('=') else {
            continue;
        };
        fields.insert(key.trim().to_lowercase(), value.trim().to_string());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::proto::PreFetch;

    fn password_session(endpoints: Endpoints) -> Session {
        Session::new(
            DeviceProfile::new("3c67a4bb8d2a3e50"),
            Credentials::Password {
                email: "user@example.com".to_string(),
                password: "secret".to_string(),
            },
            endpoints,
        )
    }

    #[test]
    fn login_response_parsing() {
        let fields = parse_login_response("SID=x\nLSID=y\nAuth=XYZ123 other=1");
        assert_eq!(fields.get("auth").map(String::as_str), Some("XYZ123"));
        assert_eq!(fields.get("sid").map(String::as_str), Some("x"));

        assert!(parse_login_response("").is_empty());
        assert!(parse_login_response("no-equals-here").is_empty());
    }

    #[test]
    fn login_stores_token_from_auth_key() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/auth")
            .with_body("SID=123\nAuth=XYZ123\nother=1")
            .create();

        let mut session = password_session(Endpoints {
            login_url: format!("{}/auth", server.url()),
            api_base: server.url(),
        });
        session.login().unwrap();
        assert!(session.has_token());
        assert_eq!(session.token(), Some("XYZ123"));
    }

    #[test]
    fn login_surfaces_server_reason() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/auth")
            .with_body("Error=BadAuthentication")
            .create();

        let mut session = password_session(Endpoints {
            login_url: format!("{}/auth", server.url()),
            api_base: server.url(),
        });
        match session.login() {
            Err(LoginError::Denied(reason)) => assert_eq!(reason, "BadAuthentication"),
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[test]
    fn login_without_auth_or_error_fails() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("POST", "/auth").with_body("").create();

        let mut session = password_session(Endpoints {
            login_url: format!("{}/auth", server.url()),
            api_base: server.url(),
        });
        assert!(matches!(session.login(), Err(LoginError::TokenNotFound)));
    }

    #[test]
    fn token_sessions_cannot_login() {
        let mut session = Session::new(
            DeviceProfile::new("3c67a4bb8d2a3e50"),
            Credentials::Token("tok".to_string()),
            Endpoints::default(),
        );
        assert!(session.has_token());
        assert!(matches!(session.login(), Err(LoginError::NoCredentials)));
    }

    #[test]
    fn register_prefetch_skips_empty_entries() {
        let mut session = password_session(Endpoints::default());
        let envelope = ResponseWrapper {
            payload: None,
            pre_fetch: vec![
                PreFetch {
                    url: "details?doc=com.a".to_string(),
                    response: vec![1, 2, 3],
                },
                PreFetch {
                    url: String::new(),
                    response: vec![1],
                },
                PreFetch {
                    url: "details?doc=com.b".to_string(),
                    response: Vec::new(),
                },
            ],
        };
        session.register_prefetch(&envelope);
        assert_eq!(session.prefetch.len(), 1);
        assert!(session.prefetch.contains_key("details?doc=com.a"));
    }
}
