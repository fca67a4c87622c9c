use anyhow::Result;
use envconfig::Envconfig;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use url::Url;

/// Port Sling author instances conventionally listen on.
pub const DEFAULT_SLING_PORT: u16 = 4502;
pub const DEFAULT_SLING_USERNAME: &str = "admin";
pub const DEFAULT_SLING_PASSWORD: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

impl FromStr for Protocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(anyhow::anyhow!(
                "Unsupported protocol '{}': expected 'http' or 'https'",
                other
            )),
        }
    }
}

/// Immutable description of one Sling server instance.
///
/// The value is owned by the caller and passed by reference into
/// [`crate::sling::SlingSupportFactory::create`]; nothing in this crate
/// mutates it after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlingServerConfiguration {
    pub name: String,
    pub protocol: Protocol,
    pub machine_name: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Servers marked inactive are skipped by default-server selection
    /// but stay reachable by explicit name lookup.
    pub active: bool,
    pub timeout: Option<u64>, // seconds
    pub retry_attempts: u32,
}

impl SlingServerConfiguration {
    /// A configuration for a local author instance with Sling's
    /// conventional defaults (localhost:4502, admin/admin).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protocol: Protocol::Http,
            machine_name: "localhost".to_string(),
            port: DEFAULT_SLING_PORT,
            username: DEFAULT_SLING_USERNAME.to_string(),
            password: DEFAULT_SLING_PASSWORD.to_string(),
            active: true,
            timeout: None,
            retry_attempts: 3,
        }
    }

    /// Derives a configuration from a full endpoint URL, e.g.
    /// `http://repo.example:4502`. A URL without an explicit port falls
    /// back to 4502 rather than the scheme default.
    pub fn from_url(name: impl Into<String>, raw_url: &str) -> Result<Self> {
        let url = Url::parse(raw_url)?;
        let protocol = url.scheme().parse::<Protocol>()?;
        let machine_name = url
            .host_str()
            .ok_or_else(|| {
                anyhow::anyhow!("URL '{}' has no host component", raw_url)
            })?
            .to_string();
        let port = url.port().unwrap_or(DEFAULT_SLING_PORT);

        let mut config = Self::new(name);
        config.protocol = protocol;
        config.machine_name = machine_name;
        config.port = port;
        // Userinfo in the URL overrides the admin/admin convention
        if !url.username().is_empty() {
            config.username = url.username().to_string();
        }
        if let Some(password) = url.password() {
            config.password = password.to_string();
        }
        Ok(config)
    }

    /// `{protocol}://{machine_name}:{port}`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.machine_name, self.port)
    }
}

/// The full set of servers a [`crate::sling::SlingSupportManager`] is
/// built from.
#[derive(Debug, Clone, Default)]
pub struct SlingManagerConfig {
    pub servers: HashMap<String, SlingServerConfiguration>,
    pub default_server: Option<String>,
}

#[derive(Debug, Clone, Envconfig)]
pub struct AppConfig {
    // Multi-server configuration
    // Highest precedence: JSON definition
    #[envconfig(from = "SLING_SERVERS_JSON")]
    pub sling_servers_json: Option<String>,
    // Env-list + per-server prefixed vars
    #[envconfig(from = "SLING_SERVERS")]
    pub sling_servers: Option<String>,
    // Explicit default server (must exist among configured servers)
    #[envconfig(from = "SLING_DEFAULT_SERVER")]
    pub sling_default_server: Option<String>,

    // Legacy single-server configuration
    #[envconfig(from = "SLING_DEFAULT_URL")]
    pub sling_default_url: Option<String>,

    #[envconfig(from = "SLING_DEFAULT_TIMEOUT", default = "30")]
    pub sling_default_timeout_seconds: u64,

    #[envconfig(from = "SLING_DEFAULT_RETRY_ATTEMPTS", default = "3")]
    pub sling_default_retry_attempts: u32,
}

impl AppConfig {
    /// Load configuration from environment variables only
    pub fn load_from_env() -> Result<Self> {
        Ok(Self::init_from_env()?)
    }

    pub fn sling(&self) -> SlingManagerConfig {
        // Build servers from highest precedence to lowest:
        // 1) JSON, 2) Env list + prefixes, 3) Legacy single default URL
        let mut servers: HashMap<String, SlingServerConfiguration> =
            HashMap::new();

        let defaults = ServerDefaults {
            timeout: self.sling_default_timeout_seconds,
            retry_attempts: self.sling_default_retry_attempts,
        };

        if let Some(json) = &self.sling_servers_json {
            match parse_servers_from_json(json, &defaults) {
                Ok(map) => servers = map,
                Err(e) => {
                    panic!("Invalid SLING_SERVERS_JSON: {e}");
                }
            }
        } else if let Some(list) = &self.sling_servers {
            match parse_servers_from_env_list(list, &defaults) {
                Ok(map) => servers = map,
                Err(e) => {
                    panic!("Invalid SLING_SERVERS / prefixed envs: {e}");
                }
            }
        } else if let Some(url) = &self.sling_default_url {
            match SlingServerConfiguration::from_url("default", url) {
                Ok(mut config) => {
                    config.timeout = Some(defaults.timeout);
                    config.retry_attempts = defaults.retry_attempts;
                    servers.insert("default".to_string(), config);
                }
                Err(e) => {
                    panic!("Invalid SLING_DEFAULT_URL: {e}");
                }
            }
        }

        // Determine default server
        let default_server = self
            .sling_default_server
            .as_ref()
            .and_then(|name| {
                if servers.contains_key(name) {
                    Some(name.clone())
                } else {
                    warn!("SLING_DEFAULT_SERVER='{}' not found among configured servers; falling back.", name);
                    None
                }
            })
            .or_else(|| {
                // Prefer a server literally named "default" if present
                if servers.contains_key("default") {
                    Some("default".to_string())
                } else {
                    None
                }
            });

        SlingManagerConfig {
            servers,
            default_server,
        }
    }
}

// ---------- Helpers for multi-server parsing ----------

struct ServerDefaults {
    timeout: u64,
    retry_attempts: u32,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
struct ServerJsonConfig {
    host: Option<String>,
    port: Option<u16>,
    protocol: Option<String>,
    username: Option<String>,
    password: Option<String>,
    active: Option<bool>,
    timeout: Option<u64>,
    retry_attempts: Option<u32>,
}

fn parse_servers_from_json(
    json: &str,
    defaults: &ServerDefaults,
) -> Result<HashMap<String, SlingServerConfiguration>> {
    // Accept either an object map { name: { ... } } or an array of
    // objects carrying an explicit "name" field.
    let v: serde_json::Value = serde_json::from_str(json)?;
    let mut out = HashMap::new();
    match v {
        serde_json::Value::Array(items) => {
            for (idx, item) in items.into_iter().enumerate() {
                if let Some(obj) = item.as_object() {
                    let name = obj
                        .get("name")
                        .and_then(|n| n.as_str())
                        .ok_or_else(|| {
                            anyhow::anyhow!(
                                "SLING_SERVERS_JSON[{}] missing 'name' field in array form",
                                idx
                            )
                        })?
                        .to_string();
                    let cfg: ServerJsonConfig = serde_json::from_value(
                        serde_json::Value::Object(obj.clone()),
                    )?;
                    insert_server(&mut out, name, cfg, defaults)?;
                } else {
                    return Err(anyhow::anyhow!(
                        "Invalid JSON array element at index {}",
                        idx
                    ));
                }
            }
        }
        serde_json::Value::Object(map) => {
            for (name, val) in map.into_iter() {
                let cfg: ServerJsonConfig = serde_json::from_value(val)?;
                insert_server(&mut out, name, cfg, defaults)?;
            }
        }
        _ => {
            return Err(anyhow::anyhow!(
                "SLING_SERVERS_JSON must be an array or object"
            ));
        }
    }
    Ok(out)
}

fn insert_server(
    out: &mut HashMap<String, SlingServerConfiguration>,
    name: String,
    cfg: ServerJsonConfig,
    defaults: &ServerDefaults,
) -> Result<()> {
    validate_server_name(&name)?;
    if out.contains_key(&name) {
        return Err(anyhow::anyhow!("Duplicate server name '{}'", name));
    }
    let protocol = match cfg.protocol {
        Some(raw) => raw.parse::<Protocol>()?,
        None => Protocol::Http,
    };
    let mut config = SlingServerConfiguration::new(name.clone());
    config.protocol = protocol;
    if let Some(host) = cfg.host {
        config.machine_name = host;
    }
    if let Some(port) = cfg.port {
        config.port = port;
    }
    if let Some(username) = cfg.username {
        config.username = username;
    }
    if let Some(password) = cfg.password {
        config.password = password;
    }
    config.active = cfg.active.unwrap_or(true);
    config.timeout = cfg.timeout.or(Some(defaults.timeout));
    config.retry_attempts =
        cfg.retry_attempts.unwrap_or(defaults.retry_attempts);
    out.insert(name, config);
    Ok(())
}

fn parse_servers_from_env_list(
    list: &str,
    defaults: &ServerDefaults,
) -> Result<HashMap<String, SlingServerConfiguration>> {
    let mut out = HashMap::new();
    for raw in list.split(',') {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        validate_server_name(name)?;
        if out.contains_key(name) {
            return Err(anyhow::anyhow!(
                "Duplicate server name '{}' in SLING_SERVERS",
                name
            ));
        }
        let suffix = sanitize_env_suffix(name);

        let mut config = SlingServerConfiguration::new(name);
        // A server with no explicit host is assumed to be a local
        // instance, the common case for Sling tooling.
        if let Ok(host) = env::var(format!("SLING_SERVER_{}_HOST", suffix)) {
            config.machine_name = host;
        }
        if let Some(port) =
            read_env_u16(&format!("SLING_SERVER_{}_PORT", suffix))
        {
            config.port = port;
        }
        if let Ok(raw) = env::var(format!("SLING_SERVER_{}_PROTOCOL", suffix))
        {
            config.protocol = raw.parse::<Protocol>().map_err(|e| {
                anyhow::anyhow!("Server '{}': {}", name, e)
            })?;
        }
        if let Ok(username) =
            env::var(format!("SLING_SERVER_{}_USERNAME", suffix))
        {
            config.username = username;
        }
        if let Ok(password) =
            env::var(format!("SLING_SERVER_{}_PASSWORD", suffix))
        {
            config.password = password;
        }
        config.active =
            read_env_bool(&format!("SLING_SERVER_{}_ACTIVE", suffix))
                .unwrap_or(true);
        config.timeout =
            read_env_u64(&format!("SLING_SERVER_{}_TIMEOUT", suffix))
                .or(Some(defaults.timeout));
        config.retry_attempts = read_env_u32(&format!(
            "SLING_SERVER_{}_RETRY_ATTEMPTS",
            suffix
        ))
        .unwrap_or(defaults.retry_attempts);

        out.insert(name.to_string(), config);
    }

    if out.is_empty() {
        return Err(anyhow::anyhow!("SLING_SERVERS resolved to zero servers"));
    }

    Ok(out)
}

fn sanitize_env_suffix(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' => (c as u8 - b'a' + b'A') as char,
            'A'..='Z' | '0'..='9' => c,
            _ => '_',
        })
        .collect()
}

fn validate_server_name(name: &str) -> Result<()> {
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        Err(anyhow::anyhow!(
            "Invalid server name '{}': only [A-Za-z0-9_-] allowed",
            name
        ))
    } else {
        Ok(())
    }
}

fn read_env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.parse::<u64>().ok())
}

fn read_env_u32(key: &str) -> Option<u32> {
    env::var(key).ok().and_then(|v| v.parse::<u32>().ok())
}

fn read_env_u16(key: &str) -> Option<u16> {
    env::var(key).ok().and_then(|v| v.parse::<u16>().ok())
}

fn read_env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .and_then(|v| match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}
