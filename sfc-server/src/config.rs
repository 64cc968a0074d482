//! Layered configuration: a TOML file plus CLI overrides, matching the
//! source's `CfgFileOptions`/`CmdLineOptions` precedence (CLI wins, then
//! file, then a compiled-in default).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_THREADS: usize = 3;

#[derive(Debug, Parser)]
#[command(name = "sfc-server", about = "Space-filling-curve kNN query service")]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Overrides [system].port.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Overrides [system].threads.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Increases log verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    system: RawSystem,
    #[serde(flatten)]
    indexes: HashMap<String, IndexConfig>,
}

#[derive(Debug, Deserialize)]
struct RawSystem {
    port: Option<u16>,
    threads: Option<usize>,
    indexes: Vec<String>,
    fields: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    pub active: bool,
    pub dbtype: String,
    pub index: String,
    pub gid: String,
    pub x: String,
    pub y: String,
    pub z: Option<String>,
    pub delim: Option<String>,
    pub filename: Option<String>,
}

impl IndexConfig {
    pub fn is_3d(&self) -> bool {
        self.z.is_some()
    }
}

#[derive(Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub threads: usize,
    pub fields: Vec<String>,
    pub indexes: HashMap<String, IndexConfig>,
}

impl ServerConfig {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let raw = Self::read_file(&cli.config)?;

        for name in &raw.system.indexes {
            if !raw.indexes.contains_key(name) {
                return Err(ConfigError::UndeclaredSection(name.clone()));
            }
        }
        for (name, idx) in &raw.indexes {
            if idx.dbtype != "csv" {
                return Err(ConfigError::UnsupportedDriver {
                    index: name.clone(),
                    driver: idx.dbtype.clone(),
                });
            }
        }

        Ok(Self {
            port: cli.port.or(raw.system.port).unwrap_or(DEFAULT_PORT),
            threads: cli.threads.or(raw.system.threads).unwrap_or(DEFAULT_THREADS),
            fields: raw.system.fields,
            indexes: raw
                .indexes
                .into_iter()
                .filter(|(name, _)| raw.system.indexes.contains(name))
                .filter(|(_, idx)| idx.active)
                .collect(),
        })
    }

    fn read_file(path: &Path) -> Result<RawFile, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
