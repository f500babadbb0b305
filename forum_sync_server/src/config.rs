use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use forum_sync_engine::{db_types::ForumSettings, DEFAULT_EVENT_TIMEOUT, DEFAULT_POST_TEMPLATE};
use log::*;

use crate::errors::ServerError;

const DEFAULT_FORUM_DATABASE_URL: &str = "sqlite://data/forum.db";
const DEFAULT_LINK_STATE_DATABASE_URL: &str = "sqlite://data/forum_links.db";
const DEFAULT_QUEUE_SIZE: usize = 64;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub forum_database_url: String,
    pub link_state_database_url: String,
    /// The forum new threads go into, and the service account that authors the posts.
    pub forum: ForumSettings,
    /// A file holding the handlebars template for post bodies. The built-in template is used when this is `None`.
    pub post_template_path: Option<PathBuf>,
    pub worker_count: usize,
    pub queue_size: usize,
    /// The longest time a single event may take before it is abandoned.
    pub event_timeout: Duration,
    /// Connection pool size, for each of the two databases.
    pub max_connections: u32,
    /// If true, the forum tables are created on start if they do not exist. Only for development setups; in
    /// production the forum owns its schema.
    pub create_forum_schema: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            forum_database_url: DEFAULT_FORUM_DATABASE_URL.to_string(),
            link_state_database_url: DEFAULT_LINK_STATE_DATABASE_URL.to_string(),
            forum: ForumSettings::default(),
            post_template_path: None,
            worker_count: resolve_worker_count(0, available_cpus()),
            queue_size: DEFAULT_QUEUE_SIZE,
            event_timeout: DEFAULT_EVENT_TIMEOUT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            create_forum_schema: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = ForumSettings::default();
        let forum_database_url = env::var("FSM_FORUM_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ FSM_FORUM_DATABASE_URL is not set. Using {DEFAULT_FORUM_DATABASE_URL}.");
            DEFAULT_FORUM_DATABASE_URL.into()
        });
        let link_state_database_url = env::var("FSM_LINK_STATE_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ FSM_LINK_STATE_DATABASE_URL is not set. Using {DEFAULT_LINK_STATE_DATABASE_URL}.");
            DEFAULT_LINK_STATE_DATABASE_URL.into()
        });
        let forum_id = parse_or_default("FSM_FORUM_ID", env::var("FSM_FORUM_ID").ok(), defaults.forum_id);
        let author_id =
            parse_or_default("FSM_SERVICE_USER_ID", env::var("FSM_SERVICE_USER_ID").ok(), defaults.author_id);
        let post_template_path =
            env::var("FSM_POST_TEMPLATE_PATH").ok().filter(|s| !s.trim().is_empty()).map(PathBuf::from);
        if post_template_path.is_none() {
            info!("🪛️ FSM_POST_TEMPLATE_PATH is not set. Using the built-in post template.");
        }
        let configured_workers = parse_or_default("FSM_WORKER_COUNT", env::var("FSM_WORKER_COUNT").ok(), 0i64);
        let worker_count = resolve_worker_count(configured_workers, available_cpus());
        let queue_size = parse_or_default("FSM_QUEUE_SIZE", env::var("FSM_QUEUE_SIZE").ok(), DEFAULT_QUEUE_SIZE);
        let event_timeout = parse_event_timeout(env::var("FSM_EVENT_TIMEOUT").ok());
        let max_connections =
            parse_or_default("FSM_MAX_CONNECTIONS", env::var("FSM_MAX_CONNECTIONS").ok(), DEFAULT_MAX_CONNECTIONS);
        let create_forum_schema =
            env::var("FSM_CREATE_FORUM_SCHEMA").map(|s| &s == "1" || &s == "true").unwrap_or(false);
        if create_forum_schema {
            warn!("🪛️ FSM_CREATE_FORUM_SCHEMA is set. The forum tables will be created if they are missing.");
        }
        Self {
            forum_database_url,
            link_state_database_url,
            forum: ForumSettings { forum_id, author_id },
            post_template_path,
            worker_count,
            queue_size: queue_size.max(1),
            event_timeout,
            max_connections: max_connections.max(1),
            create_forum_schema,
        }
    }

    /// Reads the configured post template, or returns the built-in one if none is configured.
    pub fn load_post_template(&self) -> Result<String, ServerError> {
        match &self.post_template_path {
            Some(path) => {
                let template = std::fs::read_to_string(path).map_err(|e| {
                    ServerError::ConfigurationError(format!("Could not read post template {}. {e}", path.display()))
                })?;
                info!("🪛️ Loaded post template from {}", path.display());
                Ok(template)
            },
            None => Ok(DEFAULT_POST_TEMPLATE.to_string()),
        }
    }
}

/// Parses an environment value, falling back to `default` (with a log message) if it is missing or invalid.
fn parse_or_default<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value {
        None => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
    }
}

/// Reads `FSM_EVENT_TIMEOUT` in seconds. A zero timeout would abandon every event before it starts, so it is rejected
/// like any other invalid value.
fn parse_event_timeout(value: Option<String>) -> Duration {
    let default = DEFAULT_EVENT_TIMEOUT.as_secs();
    match parse_or_default("FSM_EVENT_TIMEOUT", value, default) {
        0 => {
            warn!("🪛️ 0 is not a valid value for FSM_EVENT_TIMEOUT. Using the default, {default}, instead.");
            DEFAULT_EVENT_TIMEOUT
        },
        secs => Duration::from_secs(secs),
    }
}

/// A positive setting is used as is. Zero or a negative setting is added to the number of CPUs. There is always at
/// least one worker.
fn resolve_worker_count(configured: i64, cpus: usize) -> usize {
    let count = if configured > 0 { configured } else { cpus as i64 + configured };
    if count < 1 {
        warn!("🪛️ FSM_WORKER_COUNT={configured} leaves no workers on {cpus} CPUs. Using a single worker.");
    }
    count.max(1) as usize
}

fn available_cpus() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
