use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{bail, Context, Result};
use tracing::info;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_file: PathBuf,
    pub media_dir: PathBuf,
    pub page_size: usize,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config = Self {
            host: try_load("FOODGRAM_HOST", "0.0.0.0")?,
            port: try_load("FOODGRAM_PORT", "3000")?,
            data_file: try_load("FOODGRAM_DATA_FILE", "foodgram.json")?,
            media_dir: try_load("FOODGRAM_MEDIA_DIR", "media")?,
            page_size: try_load("FOODGRAM_PAGE_SIZE", "6")?,
            bcrypt_cost: try_load("FOODGRAM_BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())?,
        };

        if config.page_size == 0 {
            bail!("FOODGRAM_PAGE_SIZE must be positive");
        }
        if !(4..=31).contains(&config.bcrypt_cost) {
            bail!("FOODGRAM_BCRYPT_COST must be between 4 and 31");
        }

        Ok(config)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            data_file: PathBuf::from("foodgram.json"),
            media_dir: PathBuf::from("media"),
            page_size: 6,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw}"))
}
