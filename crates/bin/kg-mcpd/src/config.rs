use clap::{Parser, ValueEnum, builder::BoolishValueParser};
use kg_core::store::{DgraphSettings, SurrealSettings};
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_SURREAL_ENDPOINT: &str = "mem://";
const DEFAULT_SURREAL_NAMESPACE: &str = "context_engine";
const DEFAULT_SURREAL_DATABASE: &str = "nodes";
const DEFAULT_DGRAPH_URL: &str = "http://localhost:8080";
const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4020";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 60;

/// Graph database backing the node store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Surreal,
    Dgraph,
}

#[derive(Parser, Debug)]
#[command(name = "kg-mcpd", version, about = "Context engine MCP daemon.")]
#[allow(clippy::struct_excessive_bools)]
struct CliArgs {
    #[arg(long, env = "KG_BACKEND", value_enum, default_value_t = BackendKind::Surreal)]
    backend: BackendKind,

    #[arg(long, env = "KG_SURREAL_ENDPOINT", default_value = DEFAULT_SURREAL_ENDPOINT)]
    surreal_endpoint: String,

    #[arg(long, env = "KG_SURREAL_NAMESPACE", default_value = DEFAULT_SURREAL_NAMESPACE)]
    surreal_namespace: String,

    #[arg(long, env = "KG_SURREAL_DATABASE", default_value = DEFAULT_SURREAL_DATABASE)]
    surreal_database: String,

    #[arg(long, env = "KG_SURREAL_USERNAME")]
    surreal_username: Option<String>,

    #[arg(long, env = "KG_SURREAL_PASSWORD")]
    surreal_password: Option<String>,

    #[arg(long, env = "KG_DGRAPH_URL", default_value = DEFAULT_DGRAPH_URL)]
    dgraph_url: String,

    #[arg(
        long,
        env = "KG_DGRAPH_GRAPHQL_SCHEMA",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    dgraph_graphql_schema: bool,

    #[arg(
        long,
        env = "KG_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(
        long,
        env = "KG_OPERATION_TIMEOUT_SECS",
        default_value_t = DEFAULT_OPERATION_TIMEOUT_SECS
    )]
    operation_timeout_secs: u64,

    #[arg(
        long,
        env = "KG_SETUP_SCHEMA",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    setup_schema: bool,

    #[arg(long, env = "KG_SEED_PATH")]
    seed_path: Option<String>,

    #[arg(
        long = "stdio",
        env = "KG_ENABLE_STDIO",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(
        long,
        env = "KG_MCP_SERVE",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    mcp_serve: bool,

    #[arg(long, env = "KG_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,

    #[arg(
        long,
        env = "KG_TEST",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    test_mode: bool,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct KgConfig {
    pub backend: BackendKind,
    pub surreal: SurrealSettings,
    pub dgraph: DgraphSettings,
    pub dgraph_graphql_schema: bool,
    pub operation_timeout: Option<Duration>,
    pub setup_schema: bool,
    pub seed_path: Option<String>,
    pub enable_stdio: bool,
    pub mcp_serve: bool,
    pub mcp_http_addr: SocketAddr,
    pub test_mode: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl KgConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn require_filled(name: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidSetting { name, value });
    }
    Ok(value)
}

impl TryFrom<CliArgs> for KgConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let username = non_blank(args.surreal_username);
        let password = non_blank(args.surreal_password);
        match (&username, &password) {
            (Some(_), None) => return Err(ConfigError::MissingSetting("KG_SURREAL_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::MissingSetting("KG_SURREAL_USERNAME")),
            _ => {}
        }

        let surreal = SurrealSettings {
            endpoint: require_filled("KG_SURREAL_ENDPOINT", args.surreal_endpoint)?,
            namespace: require_filled("KG_SURREAL_NAMESPACE", args.surreal_namespace)?,
            database: require_filled("KG_SURREAL_DATABASE", args.surreal_database)?,
            username,
            password,
        };

        let dgraph_url = args.dgraph_url.trim().to_string();
        if args.backend == BackendKind::Dgraph
            && !(dgraph_url.starts_with("http://") || dgraph_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidSetting {
                name: "KG_DGRAPH_URL",
                value: dgraph_url,
            });
        }
        let dgraph = DgraphSettings::new(dgraph_url)
            .with_request_timeout(seconds(args.request_timeout_secs));

        if !args.enable_stdio && !args.mcp_serve {
            return Err(ConfigError::InvalidSetting {
                name: "KG_MCP_SERVE",
                value: "false (with stdio disabled, nothing would be served)".to_string(),
            });
        }

        Ok(Self {
            backend: args.backend,
            surreal,
            dgraph,
            dgraph_graphql_schema: args.dgraph_graphql_schema,
            operation_timeout: seconds(args.operation_timeout_secs),
            setup_schema: args.setup_schema,
            seed_path: non_blank(args.seed_path),
            enable_stdio: args.enable_stdio,
            mcp_serve: args.mcp_serve,
            mcp_http_addr: args.mcp_http_addr,
            test_mode: args.test_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            backend: BackendKind::Surreal,
            surreal_endpoint: DEFAULT_SURREAL_ENDPOINT.to_string(),
            surreal_namespace: DEFAULT_SURREAL_NAMESPACE.to_string(),
            surreal_database: DEFAULT_SURREAL_DATABASE.to_string(),
            surreal_username: None,
            surreal_password: None,
            dgraph_url: DEFAULT_DGRAPH_URL.to_string(),
            dgraph_graphql_schema: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            setup_schema: true,
            seed_path: None,
            enable_stdio: false,
            mcp_serve: true,
            mcp_http_addr: DEFAULT_MCP_HTTP_ADDR.parse().expect("valid MCP addr"),
            test_mode: false,
        }
    }

    #[test]
    fn defaults_to_in_memory_surreal() {
        let config = KgConfig::try_from(base_args()).expect("config should parse");

        assert_eq!(config.backend, BackendKind::Surreal);
        assert_eq!(config.surreal, SurrealSettings::in_memory());
        assert_eq!(config.operation_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.dgraph.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn zero_timeouts_disable_deadlines() {
        let mut args = base_args();
        args.request_timeout_secs = 0;
        args.operation_timeout_secs = 0;

        let config = KgConfig::try_from(args).expect("config should parse");

        assert!(config.operation_timeout.is_none());
        assert!(config.dgraph.request_timeout.is_none());
    }

    #[test]
    fn credentials_must_come_in_pairs() {
        let mut args = base_args();
        args.surreal_username = Some("root".to_string());

        let err = KgConfig::try_from(args).expect_err("half a credential should fail");
        assert!(matches!(err, ConfigError::MissingSetting("KG_SURREAL_PASSWORD")));
    }

    #[test]
    fn blank_credentials_count_as_absent() {
        let mut args = base_args();
        args.surreal_username = Some("  ".to_string());
        args.surreal_password = Some(String::new());

        let config = KgConfig::try_from(args).expect("config should parse");
        assert!(config.surreal.username.is_none());
        assert!(config.surreal.password.is_none());
    }

    #[test]
    fn dgraph_url_needs_http_scheme() {
        let mut args = base_args();
        args.backend = BackendKind::Dgraph;
        args.dgraph_url = "localhost:8080".to_string();

        let err = KgConfig::try_from(args).expect_err("bare host should fail");
        assert!(matches!(err, ConfigError::InvalidSetting { name: "KG_DGRAPH_URL", .. }));
    }

    #[test]
    fn blank_namespace_is_rejected() {
        let mut args = base_args();
        args.surreal_namespace = " ".to_string();

        let err = KgConfig::try_from(args).expect_err("blank namespace should fail");
        assert_eq!(err.to_string(), "invalid KG_SURREAL_NAMESPACE value:  ");
    }

    #[test]
    fn some_transport_must_be_enabled() {
        let mut args = base_args();
        args.mcp_serve = false;

        assert!(KgConfig::try_from(args).is_err());
    }

    #[test]
    fn cli_flags_parse() {
        let args = CliArgs::try_parse_from([
            "kg-mcpd",
            "--backend",
            "dgraph",
            "--dgraph-url",
            "http://dgraph:8080",
            "--stdio",
            "--seed-path",
            "nodes.json",
        ])
        .expect("flags should parse");
        let config = KgConfig::try_from(args).expect("config should parse");

        assert_eq!(config.backend, BackendKind::Dgraph);
        assert_eq!(config.dgraph.url, "http://dgraph:8080");
        assert!(config.enable_stdio);
        assert_eq!(config.seed_path.as_deref(), Some("nodes.json"));
    }
}
