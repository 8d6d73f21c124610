//! Configuration loading.
//!
//! The set of monitored containers is a static data table; only the
//! credentials and the mail settings vary per deployment and come from the
//! environment, optionally seeded from an env file. Every variable in the
//! table is required: a missing or empty one aborts the run before any
//! network activity.

use std::collections::HashMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::trace;

const SENDER_MAIL: &str = "SENDER_MAIL";
const SENDER_PASS: &str = "SENDER_PASS";
const SMTP_HOST: &str = "SMTP_HOST";
const SMTP_PORT: &str = "SMTP_PORT";
const RECEIVERS: &str = "RECEIVERS";

/// Result type alias for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading the configuration
#[derive(Debug)]
pub enum ConfigError {
    /// The env file could not be loaded
    EnvFile(dotenv::Error),

    /// A required variable is absent or empty
    MissingVar(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvFile(err) => write!(f, "failed to load env file: {}", err),
            ConfigError::MissingVar(var) => write!(f, "env variable {} can't be empty", var),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::EnvFile(err) => Some(err),
            ConfigError::MissingVar(_) => None,
        }
    }
}

impl From<dotenv::Error> for ConfigError {
    fn from(err: dotenv::Error) -> Self {
        ConfigError::EnvFile(err)
    }
}

/// HTTP method used to probe a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Login form for targets that are probed with a credentialed POST.
///
/// Serializes to a JSON object with exactly the two configured field names
/// as keys, since every container expects its own form layout.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub user_field: String,
    pub pass_field: String,
    pub username: String,
    pub password: String,
}

impl Serialize for LoginForm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&self.user_field, &self.username)?;
        map.serialize_entry(&self.pass_field, &self.password)?;
        map.end()
    }
}

/// One monitored container endpoint.
///
/// Targets are built once from the static table at startup and never
/// mutated. POST targets always carry a login form; GET targets never do.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub url: String,
    pub method: HttpMethod,
    pub login: Option<LoginForm>,
}

/// Mapping from container name to target. Iteration order is unspecified.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: HashMap<String, Target>,
}

impl TargetRegistry {
    pub fn insert(&mut self, target: Target) {
        self.targets.insert(target.name.clone(), target);
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// SMTP relay the alerts are submitted to.
///
/// The port stays a string: it is only joined into the dial address, and a
/// bad value surfaces as a mail error at send time.
#[derive(Debug, Clone)]
pub struct SmtpServer {
    pub host: String,
    pub port: String,
}

impl SmtpServer {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Account the alert mails are sent from.
#[derive(Debug, Clone)]
pub struct Sender {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub targets: TargetRegistry,
    pub smtp: SmtpServer,
    pub sender: Sender,
    pub receivers: Vec<String>,
}

struct LoginSpec {
    user_field: &'static str,
    pass_field: &'static str,
    user_var: &'static str,
    pass_var: &'static str,
}

struct TargetSpec {
    name: &'static str,
    url: &'static str,
    login: Option<LoginSpec>,
}

impl TargetSpec {
    fn resolve<F>(&self, lookup: &F) -> ConfigResult<Target>
    where
        F: Fn(&str) -> Option<String>,
    {
        let login = match &self.login {
            Some(spec) => Some(LoginForm {
                user_field: spec.user_field.to_string(),
                pass_field: spec.pass_field.to_string(),
                username: require(lookup, spec.user_var)?,
                password: require(lookup, spec.pass_var)?,
            }),
            None => None,
        };

        Ok(Target {
            name: self.name.to_string(),
            url: self.url.to_string(),
            method: if login.is_some() {
                HttpMethod::Post
            } else {
                HttpMethod::Get
            },
            login,
        })
    }
}

const fn login(
    user_field: &'static str,
    pass_field: &'static str,
    user_var: &'static str,
    pass_var: &'static str,
) -> Option<LoginSpec> {
    Some(LoginSpec {
        user_field,
        pass_field,
        user_var,
        pass_var,
    })
}

/// The monitored containers. Services behind a login page are probed by
/// posting their login form; the rest only answer a plain GET.
const TARGETS: &[TargetSpec] = &[
    TargetSpec {
        name: "gogs",
        url: "https://gogs.dsp-archiwebo20-mt-ma-ca-fd.fr/user/login",
        login: login("user_name", "password", "GOGS_ID", "GOGS_PASS"),
    },
    TargetSpec {
        name: "jenkins",
        url: "https://jenkins.dsp-archiwebo20-mt-ma-ca-fd.fr/login?from=%2F",
        login: login("j_username", "j_password", "JENKINS_ID", "JENKINS_PASS"),
    },
    TargetSpec {
        name: "grafana",
        url: "https://grafana.dsp-archiwebo20-mt-ma-ca-fd.fr",
        login: login("user", "password", "GRAFANA_ID", "GRAFANA_PASS"),
    },
    TargetSpec {
        name: "portainer",
        url: "https://portainer.dsp-archiwebo20-mt-ma-ca-fd.fr/",
        login: login("username", "password", "PORTAINER_ID", "PORTAINER_PASS"),
    },
    TargetSpec {
        name: "prod-admin",
        url: "https://prod-admin.dsp-archiwebo20-mt-ma-ca-fd.fr/",
        login: login("email", "password", "PROD_ADMIN_ID", "PROD_ADMIN_PASS"),
    },
    TargetSpec {
        name: "preprod-admin",
        url: "https://preprod-admin.dsp-archiwebo20-mt-ma-ca-fd.fr/",
        login: login("email", "password", "PREPROD_ADMIN_ID", "PREPROD_ADMIN_PASS"),
    },
    TargetSpec {
        name: "preprod-frontend",
        url: "https://frontend.dsp-archiwebo20-mt-ma-ca-fd.fr/",
        login: login("email", "password", "PREPROD_FRONT_ID", "PREPROD_FRONT_PASS"),
    },
    TargetSpec {
        name: "prod-frontend",
        url: "https://dsp-archiwebo20-mt-ma-ca-fd.fr/",
        login: login("email", "password", "PROD_FRONT_ID", "PROD_FRONT_PASS"),
    },
    TargetSpec {
        name: "phpmyadmin",
        url: "https://phpadmin.dsp-archiwebo20-mt-ma-ca-fd.fr/index.php?route=/",
        login: login("pma_username", "pma_password", "PHPMYADMIN_ID", "PHPMYADMIN_PASS"),
    },
    TargetSpec {
        name: "traefik",
        url: "https://traefik.dsp-archiwebo20-mt-ma-ca-fd.fr/",
        login: None,
    },
    TargetSpec {
        name: "cadvisor",
        url: "https://cadvisor.dsp-archiwebo20-mt-ma-ca-fd.fr",
        login: None,
    },
    TargetSpec {
        name: "prometheus",
        url: "https://prometheus.dsp-archiwebo20-mt-ma-ca-fd.fr",
        login: None,
    },
];

impl Config {
    /// Load the env file at `path` and build the configuration from the
    /// process environment. A missing env file is fatal, even when the
    /// variables are already exported.
    pub fn load(path: &str) -> ConfigResult<Self> {
        dotenv::from_filename(path)?;
        Self::from_env()
    }

    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut targets = TargetRegistry::default();
        for spec in TARGETS {
            targets.insert(spec.resolve(&lookup)?);
        }

        let smtp = SmtpServer {
            host: require(&lookup, SMTP_HOST)?,
            port: require(&lookup, SMTP_PORT)?,
        };
        let sender = Sender {
            email: require(&lookup, SENDER_MAIL)?,
            password: require(&lookup, SENDER_PASS)?,
        };
        let receivers = require(&lookup, RECEIVERS)?
            .split(',')
            .map(|address| address.trim().to_string())
            .collect();

        let config = Self {
            targets,
            smtp,
            sender,
            receivers,
        };
        trace!("loaded configuration for {} targets", config.targets.len());
        Ok(config)
    }
}

fn require<F>(lookup: &F, var: &str) -> ConfigResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var.to_string())),
    }
}
