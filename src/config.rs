use crate::constants::{endpoints, env, network, polling};
use crate::errors::{ToolError, ToolErrorKind};
use std::fmt;
use std::time::Duration;
use url::Url;

#[derive(Clone)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub scope: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("tenant_id", &self.tenant_id)
            .field("scope", &self.scope)
            .finish()
    }
}

impl Credential {
    /// Blank values count as missing; every missing variable is reported at once.
    pub fn resolve(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ToolError> {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let client_id = read(env::CLIENT_ID);
        let client_secret = read(env::CLIENT_SECRET);
        let tenant_id = read(env::TENANT_ID);

        let mut missing = Vec::new();
        if client_id.is_none() {
            missing.push(env::CLIENT_ID);
        }
        if client_secret.is_none() {
            missing.push(env::CLIENT_SECRET);
        }
        if tenant_id.is_none() {
            missing.push(env::TENANT_ID);
        }

        match (client_id, client_secret, tenant_id) {
            (Some(client_id), Some(client_secret), Some(tenant_id)) => Ok(Self {
                client_id,
                client_secret,
                tenant_id,
                scope: read(env::SCOPE).unwrap_or_else(|| endpoints::POWERBI_SCOPE.to_string()),
            }),
            _ => Err(ToolError::config(&missing)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub authority_host: Url,
    pub powerbi_api: Url,
    pub fabric_api: Url,
}

impl Endpoints {
    pub fn token_url(&self, tenant_id: &str) -> Result<Url, ToolError> {
        join_segments(
            &self.authority_host,
            &[tenant_id, "oauth2", "v2.0", "token"],
        )
    }

    pub fn powerbi(&self, segments: &[&str]) -> Result<Url, ToolError> {
        join_segments(&self.powerbi_api, segments)
    }

    pub fn fabric(&self, segments: &[&str]) -> Result<Url, ToolError> {
        join_segments(&self.fabric_api, segments)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authority_host: Url::parse(endpoints::AUTHORITY_HOST).expect("static URL"),
            powerbi_api: Url::parse(endpoints::POWERBI_API).expect("static URL"),
            fabric_api: Url::parse(endpoints::FABRIC_API).expect("static URL"),
        }
    }
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, ToolError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ToolError::internal(format!("Base URL {} cannot carry a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub default_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: polling::MAX_ATTEMPTS,
            default_interval: Duration::from_secs(polling::DEFAULT_RETRY_AFTER_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub credential: Result<Credential, ToolError>,
    pub endpoints: Endpoints,
    pub poll: PollSettings,
    pub http_timeout: Duration,
    presence: Vec<(&'static str, bool)>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ToolError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ToolError> {
        let present = |key: &str| lookup(key).map(|v| !v.trim().is_empty()).unwrap_or(false);
        let presence = vec![
            (env::CLIENT_ID, present(env::CLIENT_ID)),
            (env::CLIENT_SECRET, present(env::CLIENT_SECRET)),
            (env::TENANT_ID, present(env::TENANT_ID)),
        ];

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            authority_host: url_override(lookup, env::AUTHORITY_HOST, defaults.authority_host)?,
            powerbi_api: url_override(lookup, env::POWERBI_API, defaults.powerbi_api)?,
            fabric_api: url_override(lookup, env::FABRIC_API, defaults.fabric_api)?,
        };

        let mut poll = PollSettings::default();
        if let Some(attempts) = number_override(lookup, env::POLL_MAX_ATTEMPTS)? {
            poll.max_attempts = attempts.max(1) as u32;
        }
        let http_timeout = number_override(lookup, env::HTTP_TIMEOUT_MS)?
            .unwrap_or(network::TIMEOUT_API_REQUEST_MS);

        Ok(Self {
            credential: Credential::resolve(lookup),
            endpoints,
            poll,
            http_timeout: Duration::from_millis(http_timeout),
            presence,
        })
    }

    pub fn with_credential(credential: Credential, endpoints: Endpoints) -> Self {
        Self {
            credential: Ok(credential),
            endpoints,
            poll: PollSettings::default(),
            http_timeout: Duration::from_millis(network::TIMEOUT_API_REQUEST_MS),
            presence: vec![
                (env::CLIENT_ID, true),
                (env::CLIENT_SECRET, true),
                (env::TENANT_ID, true),
            ],
        }
    }

    pub fn environment_check(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for (key, present) in &self.presence {
            let label = if *present { "SET" } else { "MISSING" };
            out.insert(key.to_string(), serde_json::Value::String(label.to_string()));
        }
        serde_json::Value::Object(out)
    }
}

fn url_override(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    fallback: Url,
) -> Result<Url, ToolError> {
    let Some(raw) = lookup(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(fallback);
    };
    Url::parse(raw.trim()).map_err(|err| {
        ToolError::new(
            ToolErrorKind::Config,
            "CONFIG",
            format!("{} is not a valid URL: {}", key, err),
        )
    })
}

fn number_override(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<u64>, ToolError> {
    let Some(raw) = lookup(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    raw.trim().parse::<u64>().map(Some).map_err(|_| {
        ToolError::new(
            ToolErrorKind::Config,
            "CONFIG",
            format!("{} must be a non-negative integer", key),
        )
    })
}
