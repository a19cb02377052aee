mod cache;
mod entry_key;
mod message_cache;
mod message_cache_entry;
mod message_util;
mod rrset_cache;
mod rrset_cache_entry;
mod trust;


pub use self::cache::{now, DnsCache};
pub use self::entry_key::EntryKey;
pub use self::message_cache::{MessageCache, MessageLookup};
pub use self::message_cache_entry::{MessageEntry, RRsetRef};
pub use self::rrset_cache::{RRsetCache, RRsetHandle};
pub use self::rrset_cache_entry::RRsetEntry;
pub use self::trust::{SecurityStatus, TrustLevel};
