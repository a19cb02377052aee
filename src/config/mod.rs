mod error;

pub use self::error::ConfigError;

use serde::{Deserialize, Serialize};
use std::{fs::File, io::prelude::*, path::Path};

const DEFAULT_MESSAGE_CACHE_SIZE: usize = 4 * 1024 * 1024;
const DEFAULT_RRSET_CACHE_SIZE: usize = 8 * 1024 * 1024;
const DEFAULT_BUCKET_COUNT: usize = 16;
const DEFAULT_MAX_TTL: u32 = 86400;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    //byte budget of the message table
    pub message_cache_size: usize,
    //byte budget of the rrset table
    pub rrset_cache_size: usize,
    pub buckets: usize,
    pub min_ttl: u32,
    pub max_ttl: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            message_cache_size: DEFAULT_MESSAGE_CACHE_SIZE,
            rrset_cache_size: DEFAULT_RRSET_CACHE_SIZE,
            buckets: DEFAULT_BUCKET_COUNT,
            min_ttl: 0,
            max_ttl: DEFAULT_MAX_TTL,
        }
    }
}

impl CacheConfig {
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut config_string = String::new();
        file.read_to_string(&mut config_string)?;
        Self::from_yaml(&config_string)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: CacheConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buckets == 0 {
            return Err(ConfigError::InvalidValue(
                "buckets should be at least 1".to_string(),
            ));
        }
        if self.min_ttl > self.max_ttl {
            return Err(ConfigError::InvalidValue(format!(
                "min_ttl {} is larger than max_ttl {}",
                self.min_ttl, self.max_ttl
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn clamp_ttl(&self, ttl: u32) -> u32 {
        if ttl < self.min_ttl {
            self.min_ttl
        } else if ttl > self.max_ttl {
            self.max_ttl
        } else {
            ttl
        }
    }
}
