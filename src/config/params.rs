use serde::Deserialize;

use crate::{error::ProtocolError, settings::PubSubSettings};

#[derive(Debug, Deserialize, Default)]
pub struct Params {
    #[serde(default)]
    lonelypsp: PubSubParams,
}

impl Params {
    pub fn from_env() -> Result<Self, ProtocolError> {
        Ok(Self {
            lonelypsp: PubSubParams::from_env("LONELYPSP")?,
        })
    }

    /// Combine two sets of parameters; values present in `other` win.
    pub fn mix_config(self, other: Params) -> Params {
        Params {
            lonelypsp: self.lonelypsp.mix(other.lonelypsp),
        }
    }
}

impl From<Params> for PubSubSettings {
    fn from(params: Params) -> Self {
        let defaults = PubSubSettings::default();
        let PubSubParams {
            minimal_headers,
            stream_part_size,
            max_notification_size,
        } = params.lonelypsp;
        Self {
            minimal_headers: minimal_headers.unwrap_or(defaults.minimal_headers),
            stream_part_size: stream_part_size.unwrap_or(defaults.stream_part_size),
            max_notification_size: max_notification_size.unwrap_or(defaults.max_notification_size),
        }
    }
}

#[derive(Debug, Deserialize, Default, PartialEq)]
struct PubSubParams {
    #[serde(default)]
    minimal_headers: Option<bool>,
    #[serde(default)]
    stream_part_size: Option<usize>,
    #[serde(default)]
    max_notification_size: Option<u64>,
}

impl PubSubParams {
    fn from_env(prefix: &str) -> Result<Self, ProtocolError> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(prefix).try_parsing(true))
            .build()
            .map_err(|e| ProtocolError::Config(format!("Error building config: {}", e)))?;

        config
            .try_deserialize()
            .map_err(|e| ProtocolError::Config(format!("Error try deserialize config: {}", e)))
    }

    fn mix(self, other: PubSubParams) -> PubSubParams {
        PubSubParams {
            minimal_headers: other.minimal_headers.or(self.minimal_headers),
            stream_part_size: other.stream_part_size.or(self.stream_part_size),
            max_notification_size: other.max_notification_size.or(self.max_notification_size),
        }
    }
}
