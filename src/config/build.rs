use crate::{error::ProtocolError, settings::PubSubSettings};
use config::Config;

use super::params::Params;

/// Build the codec settings.
///
/// # Arguments
///
/// * `env` - Read `LONELYPSP_*` environment variables
/// * `file` - Path of a json, yaml or toml file; empty for none
///
/// # Errors
///
/// * `ProtocolError::Config` - a source cannot be read or deserialized
///
pub fn build_config(env: bool, file: &str) -> Result<PubSubSettings, ProtocolError> {
    // Env configuration
    let mut params_env = Params::default();
    if env {
        params_env = Params::from_env()?;
    }

    // file configuration (json, yaml or toml)
    let mut params_file = Params::default();
    if !file.is_empty() {
        let config = Config::builder()
            .add_source(config::File::with_name(file))
            .build()
            .map_err(|e| ProtocolError::Config(format!("Error building config: {}", e)))?;

        params_file = config
            .try_deserialize()
            .map_err(|e| ProtocolError::Config(format!("Error try deserialize config: {}", e)))?;
    }

    // Mix configurations.
    let settings = PubSubSettings::from(params_env.mix_config(params_file));
    log::debug!("codec settings: {:?}", settings);
    Ok(settings)
}
