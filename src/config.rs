mod commandline;
mod defaults;
mod file;
mod primitives;

use std::path::Path;

use clap::Parser;
use config::Config;

use commandline::{Args, Output};
use defaults::Defaults;

pub(crate) use commandline::Operation;
pub(crate) use file::{ConfigFile as Configuration, Media, Repo, Sled, Tracing};
pub(crate) use primitives::{Filesystem, LogFormat, ObjectStorage, Store};

/// Build configuration without reading the command line
///
/// Layers are, from lowest to highest priority: defaults, `config_file`, `REELHOUSE__` env vars,
/// then `overrides`.
pub(crate) fn configure_without_clap<P: AsRef<Path>, T: serde::Serialize, Q: AsRef<Path>>(
    config_file: Option<P>,
    overrides: T,
    save_to: Option<Q>,
) -> color_eyre::Result<Configuration> {
    let config = Config::builder().add_source(config::Config::try_from(&Defaults::default())?);

    let config = if let Some(config_file) = config_file {
        config.add_source(config::File::from(config_file.as_ref()))
    } else {
        config
    };

    let built = config
        .add_source(config::Environment::with_prefix("REELHOUSE").separator("__"))
        .add_source(config::Config::try_from(&overrides)?)
        .build()?;

    let config: Configuration = built.try_deserialize()?;

    if let Some(save_to) = save_to {
        let output = toml::to_string_pretty(&config)?;
        std::fs::write(save_to, output)?;
    }

    Ok(config)
}

/// A fully layered configuration and the command to run with it
#[derive(Clone, Debug)]
pub struct ReelhouseConfiguration {
    pub(crate) config: Configuration,
    pub(crate) operation: Operation,
}

pub(crate) fn configure() -> color_eyre::Result<ReelhouseConfiguration> {
    let Output {
        config_format,
        operation,
        save_to,
        config_file,
    } = Args::parse().into_output();

    let config = configure_without_clap(config_file, config_format, save_to)?;

    Ok(ReelhouseConfiguration { config, operation })
}
