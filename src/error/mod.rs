use failure::Fail;
use std::collections::TryReserveError;

#[derive(Debug, Fail)]
pub enum CacheError {
    #[fail(display = "out of memory in {} cache: {}", _0, _1)]
    AllocFailed(&'static str, #[fail(cause)] TryReserveError),

    #[fail(display = "{} cache has no room left for {}", _0, _1)]
    TableFull(&'static str, String),

    #[fail(display = "invalid rrset: {}", _0)]
    InvalidRRset(String),
}

impl CacheError {
    pub fn is_alloc_failure(&self) -> bool {
        match self {
            CacheError::AllocFailed(..) | CacheError::TableFull(..) => true,
            CacheError::InvalidRRset(_) => false,
        }
    }
}
