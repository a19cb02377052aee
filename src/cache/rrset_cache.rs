use super::{
    entry_key::EntryKey,
    rrset_cache_entry::RRsetEntry,
    trust::{SecurityStatus, TrustLevel},
};
use crate::error::CacheError;
use crate::lru::{LruStore, Merge, PinnedHandle};
use crate::message::RRset;
use crate::metrics::record_lookup;
use hickory_proto::rr::{DNSClass, Name, RecordType};
use tracing::debug;

const TABLE_NAME: &str = "rrset";

pub type RRsetHandle = PinnedHandle<RRsetEntry>;

pub struct RRsetCache {
    rrsets: LruStore<EntryKey, RRsetEntry>,
}

impl RRsetCache {
    pub fn new(max_bytes: usize, buckets: usize) -> Self {
        RRsetCache {
            rrsets: LruStore::new(TABLE_NAME, max_bytes, buckets),
        }
    }

    pub fn len(&self) -> usize {
        self.rrsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rrsets.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.rrsets.used_bytes()
    }

    pub fn store(
        &self,
        key: EntryKey,
        rrset: &RRset,
        expire_time: u64,
        trust_level: TrustLevel,
        security: SecurityStatus,
        now: u64,
    ) -> bool {
        self.update(key, rrset, expire_time, trust_level, security, now)
            .is_ok()
    }

    pub fn add_rrset(
        &self,
        rrset: &RRset,
        trust_level: TrustLevel,
        security: SecurityStatus,
        now: u64,
    ) -> bool {
        let key = EntryKey::rrset(&rrset.name, rrset.typ, rrset.class);
        self.store(
            key,
            rrset,
            now + rrset.ttl as u64,
            trust_level,
            security,
            now,
        )
    }

    //returns the expire time of whichever rrset survives in cache
    pub fn update(
        &self,
        key: EntryKey,
        rrset: &RRset,
        expire_time: u64,
        trust_level: TrustLevel,
        security: SecurityStatus,
        now: u64,
    ) -> Result<u64, CacheError> {
        let entry = RRsetEntry::new(rrset, expire_time, trust_level, security)?;
        let cost = entry.size() + key.len();
        let mut surviving_expire_time = expire_time;
        self.rrsets
            .try_insert_or_update(key, entry, cost, |cached, incoming| {
                let merge = RRsetEntry::merge(cached, incoming, now);
                if merge == Merge::Keep {
                    debug!(
                        name = %cached.name(),
                        typ = %cached.typ(),
                        cached = ?cached.trust_level(),
                        incoming = ?incoming.trust_level(),
                        "keep cached rrset"
                    );
                    surviving_expire_time = cached.expire_time();
                }
                merge
            })?;
        Ok(surviving_expire_time)
    }

    pub fn lookup(&self, key: &EntryKey, now: u64) -> Option<RRsetHandle> {
        let handle = self
            .rrsets
            .lookup(key)
            .filter(|entry| !entry.is_expired(now));
        record_lookup(TABLE_NAME, handle.is_some());
        handle
    }

    pub fn get_rrset(
        &self,
        name: &Name,
        typ: RecordType,
        class: DNSClass,
        now: u64,
    ) -> Option<RRset> {
        self.lookup(&EntryKey::rrset(name, typ, class), now)
            .map(|entry| entry.to_rrset(now))
    }

    pub fn has_rrset(&self, key: &EntryKey, now: u64) -> bool {
        self.lookup(key, now).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const NOW: u64 = 1_000_000;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    #[test]
    fn test_rrset_cache() {
        let cache = RRsetCache::new(4096, 4);

        let rrset = RRset::from_str("www.zdns.cn. 300 IN A 1.1.1.1").unwrap();
        assert!(cache
            .get_rrset(&rrset.name, rrset.typ, rrset.class, NOW)
            .is_none());
        cache.add_rrset(
            &rrset,
            TrustLevel::AnswerWithoutAA,
            SecurityStatus::Unchecked,
            NOW,
        );
        let insert_rrset = cache
            .get_rrset(&rrset.name, rrset.typ, rrset.class, NOW)
            .unwrap();
        assert_eq!(insert_rrset.rdatas, rrset.rdatas);

        let low_trust_level_rrset = RRset::from_str("www.zdns.cn. 300 IN A 2.2.2.2").unwrap();
        cache.add_rrset(
            &low_trust_level_rrset,
            TrustLevel::AdditionalWithoutAA,
            SecurityStatus::Unchecked,
            NOW,
        );
        let insert_rrset = cache
            .get_rrset(&rrset.name, rrset.typ, rrset.class, NOW)
            .unwrap();
        assert_eq!(insert_rrset.rdatas, rrset.rdatas);

        cache.add_rrset(
            &low_trust_level_rrset,
            TrustLevel::AnswerWithAA,
            SecurityStatus::Unchecked,
            NOW,
        );
        let insert_rrset = cache
            .get_rrset(&rrset.name, rrset.typ, rrset.class, NOW)
            .unwrap();
        assert_eq!(insert_rrset.rdatas, low_trust_level_rrset.rdatas);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_is_relative_on_lookup() {
        let cache = RRsetCache::new(4096, 4);
        let rrset = RRset::from_str("www.zdns.cn. 300 IN A 1.1.1.1").unwrap();
        let key = EntryKey::rrset(&rrset.name, rrset.typ, rrset.class);
        assert!(cache.store(
            key.clone(),
            &rrset,
            NOW + 300,
            TrustLevel::AnswerWithAA,
            SecurityStatus::Unchecked,
            NOW,
        ));

        let entry = cache.lookup(&key, NOW + 100).unwrap();
        assert_eq!(entry.to_rrset(NOW + 100).ttl, 200);
        drop(entry);
        assert!(cache.lookup(&key, NOW + 300).is_none());
        assert!(cache.lookup(&key, NOW + 301).is_none());
        //expired entries stay until lru pressure pushes them out
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_update_reports_surviving_expire_time() {
        let cache = RRsetCache::new(4096, 4);
        let rrset = RRset::from_str("example.com. 100 IN NS ns1.example.com.").unwrap();
        let key = EntryKey::rrset(&rrset.name, rrset.typ, rrset.class);
        let expire = cache
            .update(
                key.clone(),
                &rrset,
                NOW + 100,
                TrustLevel::AuthorityWithAA,
                SecurityStatus::Unchecked,
                NOW,
            )
            .unwrap();
        assert_eq!(expire, NOW + 100);

        let expire = cache
            .update(
                key.clone(),
                &rrset,
                NOW + 3600,
                TrustLevel::AdditionalWithoutAA,
                SecurityStatus::Unchecked,
                NOW,
            )
            .unwrap();
        assert_eq!(expire, NOW + 100);
        assert_eq!(cache.lookup(&key, NOW).unwrap().expire_time(), NOW + 100);
    }

    #[test]
    fn test_rrset_cache_eviction() {
        let rrset = RRset::from_str("www0000.zdns.cn. 300 IN A 1.1.1.1").unwrap();
        let one_entry = RRsetEntry::new(
            &rrset,
            NOW,
            TrustLevel::AnswerWithAA,
            SecurityStatus::Unchecked,
        )
        .unwrap()
        .size()
            + EntryKey::rrset(&rrset.name, rrset.typ, rrset.class).len();
        let cache = RRsetCache::new(one_entry * 10, 4);
        for i in 0..1000 {
            let rrset = RRset::from_str(&format!("www{:04}.zdns.cn. 300 IN A 1.1.1.1", i)).unwrap();
            cache.add_rrset(
                &rrset,
                TrustLevel::AnswerWithAA,
                SecurityStatus::Unchecked,
                NOW,
            );
        }
        assert_eq!(cache.len(), 10);

        for i in 0..990 {
            assert!(cache
                .get_rrset(&name(&format!("www{:04}.zdns.cn.", i)), RecordType::A, DNSClass::IN, NOW)
                .is_none());
        }
        for i in 990..1000 {
            assert!(cache
                .get_rrset(&name(&format!("www{:04}.zdns.cn.", i)), RecordType::A, DNSClass::IN, NOW)
                .is_some());
        }
    }
}
