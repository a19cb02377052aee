#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;

pub mod cache;
pub mod config;
pub mod delegation;
mod error;
pub mod lru;
pub mod message;
pub mod metrics;

pub use crate::cache::{now, DnsCache, SecurityStatus, TrustLevel};
pub use crate::config::{CacheConfig, ConfigError};
pub use crate::delegation::{DelegationPoint, NameserverEntry};
pub use crate::error::CacheError;
pub use crate::message::{DnsMessage, QueryInfo, RRset, ReplyFlags, ReplyInfo, SectionType};
