use super::{
    entry_key::EntryKey,
    message_cache_entry::MessageEntry,
    message_util::{prefetch_time, store_rrsets},
    rrset_cache::RRsetCache,
};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::lru::{LruStore, Merge};
use crate::message::{DnsMessage, QueryInfo, ReplyInfo};
use crate::metrics::record_lookup;
use hickory_proto::rr::{DNSClass, Name, RecordType};
use tracing::{debug, warn};

const TABLE_NAME: &str = "message";
//negative answers without any rrset carry no ttl of their own
const NO_RRSET_TTL: u32 = 5;

#[derive(Clone, Debug, PartialEq)]
pub enum MessageLookup {
    Hit(DnsMessage),
    //a live record exists but one of its rrsets is gone
    Incomplete,
    Missing,
}

impl MessageLookup {
    pub fn into_message(self) -> Option<DnsMessage> {
        match self {
            MessageLookup::Hit(message) => Some(message),
            _ => None,
        }
    }
}

pub struct MessageCache {
    messages: LruStore<EntryKey, MessageEntry>,
    config: CacheConfig,
}

impl MessageCache {
    pub fn new(config: &CacheConfig) -> Self {
        MessageCache {
            messages: LruStore::new(TABLE_NAME, config.message_cache_size, config.buckets),
            config: config.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.messages.used_bytes()
    }

    pub fn store_message(
        &self,
        rrset_cache: &RRsetCache,
        query: &QueryInfo,
        reply: &ReplyInfo,
        is_referral: bool,
        now: u64,
    ) -> bool {
        let key = EntryKey::message(&query.qname, query.qtype, query.qclass);
        self.store_with_key(rrset_cache, key, query, reply, is_referral, now)
    }

    //the hash must be the one `DnsCache::query_hash` gives for the query,
    //otherwise lookups never find the record
    pub fn store_message_hashed(
        &self,
        rrset_cache: &RRsetCache,
        query: &QueryInfo,
        hash: u64,
        reply: &ReplyInfo,
        now: u64,
    ) -> bool {
        let key = EntryKey::message_with_hash(&query.qname, query.qtype, query.qclass, hash);
        debug_assert_eq!(
            hash,
            EntryKey::message(&query.qname, query.qtype, query.qclass).hash_value(),
            "message hash doesn't match the query"
        );
        self.store_with_key(rrset_cache, key, query, reply, false, now)
    }

    fn store_with_key(
        &self,
        rrset_cache: &RRsetCache,
        key: EntryKey,
        query: &QueryInfo,
        reply: &ReplyInfo,
        is_referral: bool,
        now: u64,
    ) -> bool {
        match self.try_store(rrset_cache, key, query, reply, is_referral, now) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    table = TABLE_NAME,
                    name = %query.qname,
                    typ = %query.qtype,
                    error = %e,
                    "store message failed"
                );
                false
            }
        }
    }

    fn try_store(
        &self,
        rrset_cache: &RRsetCache,
        key: EntryKey,
        query: &QueryInfo,
        reply: &ReplyInfo,
        is_referral: bool,
        now: u64,
    ) -> Result<(), CacheError> {
        let (rrset_refs, min_expire_time) = store_rrsets(rrset_cache, reply, &self.config, now)?;
        if is_referral {
            debug!(name = %query.qname, rrsets = rrset_refs.len(), "cache referral rrsets");
            return Ok(());
        }

        let ttl = if reply.rrset_count() == 0 && reply.ttl == u32::max_value() {
            NO_RRSET_TTL
        } else {
            reply.min_ttl()
        };
        if ttl == 0 {
            //the newer answer can't be cached, but it outdates the old one
            if self.messages.remove(&key) {
                debug!(name = %query.qname, typ = %query.qtype, "drop outdated message");
            }
            return Ok(());
        }

        let expire_time = min_expire_time.min(now + self.config.clamp_ttl(ttl) as u64);
        let entry = MessageEntry::new(
            query,
            reply,
            rrset_refs,
            expire_time,
            prefetch_time(now, expire_time),
        );
        let cost = entry.size() + key.len();
        self.messages
            .try_insert_or_update(key, entry, cost, |_, _| Merge::Replace)
    }

    pub fn lookup_message(
        &self,
        rrset_cache: &RRsetCache,
        qname: &Name,
        qtype: RecordType,
        qclass: DNSClass,
        now: u64,
    ) -> Option<DnsMessage> {
        self.find_message(rrset_cache, qname, qtype, qclass, now)
            .into_message()
    }

    //an expired record counts as missing, a live one whose rrsets can't
    //all be fetched is incomplete and must not be patched up by the caller
    pub fn find_message(
        &self,
        rrset_cache: &RRsetCache,
        qname: &Name,
        qtype: RecordType,
        qclass: DNSClass,
        now: u64,
    ) -> MessageLookup {
        let key = EntryKey::message(qname, qtype, qclass);
        let result = match self.messages.lookup(&key) {
            Some(entry) if !entry.is_expired(now) => {
                match entry.fill_message(rrset_cache, now) {
                    Ok(Some(message)) => MessageLookup::Hit(message),
                    Ok(None) => MessageLookup::Incomplete,
                    Err(e) => {
                        warn!(table = TABLE_NAME, name = %qname, error = %e, "fill message failed");
                        MessageLookup::Incomplete
                    }
                }
            }
            _ => MessageLookup::Missing,
        };
        match result {
            MessageLookup::Hit(_) => record_lookup(TABLE_NAME, true),
            MessageLookup::Incomplete => {
                debug!(name = %qname, typ = %qtype, "message rrsets are gone");
                record_lookup(TABLE_NAME, false);
            }
            MessageLookup::Missing => record_lookup(TABLE_NAME, false),
        }
        result
    }
}
