use std::path::Path;

use serde::Deserialize;

/// TOML configuration file; CLI flags take precedence over every field.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub emit: EmitSection,
    #[serde(default)]
    pub style: StyleSection,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct EmitSection {
    pub default_schema: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleSection {
    pub indent: Option<usize>,
}

/// Load a configuration file, returning defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<Config, crate::CliError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text)
        .map_err(|err| crate::CliError::InvalidConfig(format!("{}: {err}", path.display())))
}
