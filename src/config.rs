use std::env;

use log::LevelFilter;

use crate::apis::bedrock::DEFAULT_MODEL_ID;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Environment-backed process configuration, read once at startup.
///
/// The LINE and S3 settings stay optional here; their absence is reported
/// per request as a configuration error (HTTP 500) rather than refusing to
/// start, so a partially configured deployment still serves its health
/// check and the entry points that don't need the missing value.
pub struct Config {
    pub bind_address: String,
    pub log_level: LevelFilter,
    pub model_id: String,
    pub bucket_name: Option<String>,
    pub channel_secret: Option<String>,
    pub channel_access_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.into()),
            log_level: lookup("LOG_LEVEL")
                .and_then(|level| level.parse().ok())
                .unwrap_or(LevelFilter::Info),
            model_id: lookup("BEDROCK_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.into()),
            bucket_name: lookup("S3_BUCKET_NAME"),
            channel_secret: lookup("LINE_CHANNEL_SECRET"),
            channel_access_token: lookup("LINE_CHANNEL_ACCESS_TOKEN"),
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.bucket_name, None);
        assert_eq!(config.channel_secret, None);
        assert_eq!(config.channel_access_token, None);
    }

    #[test]
    fn test_all_values_set() {
        let vars = HashMap::from([
            ("BIND_ADDRESS", "127.0.0.1:3000"),
            ("LOG_LEVEL", "debug"),
            ("BEDROCK_MODEL_ID", "amazon.titan-image-generator-v1"),
            ("S3_BUCKET_NAME", "generated-images"),
            ("LINE_CHANNEL_SECRET", "secret"),
            ("LINE_CHANNEL_ACCESS_TOKEN", "token"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.model_id, "amazon.titan-image-generator-v1");
        assert_eq!(config.bucket_name.as_deref(), Some("generated-images"));
        assert_eq!(config.channel_secret.as_deref(), Some("secret"));
        assert_eq!(config.channel_access_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_unparseable_log_level_falls_back_to_info() {
        let config =
            Config::from_lookup(|key| (key == "LOG_LEVEL").then(|| "loud".to_string()));
        assert_eq!(config.log_level, LevelFilter::Info);
    }
}
