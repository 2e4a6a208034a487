use courier_bus::NatsConfig;
use courier_db::PoolConfig;

/// Service configuration read from the environment.
///
/// The two collaborators are configured as groups: when a group is incomplete
/// the collaborator is disabled and the process still serves, degraded. An
/// empty value counts as unset.
#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: Option<StoreConfig>,
    pub bus: Option<BusConfig>,
}

#[derive(Debug)]
pub struct StoreConfig {
    pub url: String,
    pub pool: PoolConfig,
}

#[derive(Debug)]
pub struct BusConfig {
    pub nats: NatsConfig,
    pub channel: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("COURIER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("COURIER_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()?;

        let store = store_group(env_non_empty("COURIER_DATABASE_URL"));
        let bus = bus_group(
            env_non_empty("COURIER_NATS_URL"),
            env_non_empty("COURIER_CHANNEL"),
        );

        Ok(Self {
            host,
            port,
            store,
            bus,
        })
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn store_group(url: Option<String>) -> Option<StoreConfig> {
    url.map(|url| StoreConfig {
        url,
        pool: PoolConfig::from_env(),
    })
}

fn bus_group(url: Option<String>, channel: Option<String>) -> Option<BusConfig> {
    match (url, channel) {
        (Some(url), Some(channel)) => Some(BusConfig {
            nats: NatsConfig {
                url,
                ..Default::default()
            },
            channel,
        }),
        _ => None,
    }
}
