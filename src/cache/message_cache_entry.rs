use super::{
    entry_key::EntryKey, rrset_cache::RRsetCache, rrset_cache::RRsetHandle,
    trust::SecurityStatus,
};
use crate::error::CacheError;
use crate::message::{DnsMessage, QueryInfo, ReplyFlags, ReplyInfo, SectionType};
use hickory_proto::op::ResponseCode;
use std::mem;

#[derive(Clone, Debug)]
pub struct RRsetRef {
    pub key: EntryKey,
    pub section: SectionType,
}

//a message only remembers which rrsets it is made of, the rrset data
//itself lives in the rrset cache
#[derive(Clone, Debug)]
pub struct MessageEntry {
    query: QueryInfo,
    flags: ReplyFlags,
    rcode: ResponseCode,
    security: SecurityStatus,
    rrset_refs: Vec<RRsetRef>,
    expire_time: u64,
    prefetch_time: u64,
}

impl MessageEntry {
    pub fn new(
        query: &QueryInfo,
        reply: &ReplyInfo,
        rrset_refs: Vec<RRsetRef>,
        expire_time: u64,
        prefetch_time: u64,
    ) -> Self {
        MessageEntry {
            query: query.clone(),
            flags: reply.flags,
            rcode: reply.rcode,
            security: reply.security,
            rrset_refs,
            expire_time,
            prefetch_time,
        }
    }

    #[inline]
    pub fn query(&self) -> &QueryInfo {
        &self.query
    }

    #[inline]
    pub fn expire_time(&self) -> u64 {
        self.expire_time
    }

    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expire_time <= now
    }

    #[inline]
    pub fn rrset_refs(&self) -> &[RRsetRef] {
        &self.rrset_refs
    }

    pub fn size(&self) -> usize {
        mem::size_of::<MessageEntry>()
            + self.query.qname.len()
            + self
                .rrset_refs
                .iter()
                .map(|r| mem::size_of::<RRsetRef>() + r.key.len())
                .sum::<usize>()
    }

    //rebuild the reply from the rrset cache, any missing or expired rrset
    //makes the whole message unusable
    pub fn fill_message(
        &self,
        rrset_cache: &RRsetCache,
        now: u64,
    ) -> Result<Option<DnsMessage>, CacheError> {
        if self.is_expired(now) {
            return Ok(None);
        }

        let mut handles: Vec<RRsetHandle> = Vec::new();
        handles
            .try_reserve_exact(self.rrset_refs.len())
            .map_err(|e| CacheError::AllocFailed("message", e))?;
        for rrset_ref in &self.rrset_refs {
            match rrset_cache.lookup(&rrset_ref.key, now) {
                Some(handle) => handles.push(handle),
                None => return Ok(None),
            }
        }

        let mut reply = ReplyInfo::new(self.rcode);
        reply.set_flags(self.flags);
        let mut ttl = (self.expire_time - now) as u32;
        let mut security = self.security;
        for (rrset_ref, handle) in self.rrset_refs.iter().zip(handles.iter()) {
            ttl = ttl.min(handle.remaining_ttl(now));
            security = security.min(handle.security());
            reply.add_rrset(rrset_ref.section, handle.to_rrset(now));
        }
        reply.set_ttl(ttl).set_security(security);
        reply.prefetch_ttl = self.prefetch_time.saturating_sub(now) as u32;
        Ok(Some(DnsMessage::new(self.query.clone(), reply)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::message_util::{prefetch_time, store_rrsets};
    use crate::cache::TrustLevel;
    use crate::config::CacheConfig;
    use crate::message::RRset;
    use hickory_proto::rr::{DNSClass, Name, RecordType};
    use std::str::FromStr;

    const NOW: u64 = 1_000_000;

    fn build_positive_response() -> (QueryInfo, ReplyInfo) {
        let query = QueryInfo::new(
            Name::from_str("test.example.com.").unwrap(),
            RecordType::A,
            DNSClass::IN,
        );
        let mut reply = ReplyInfo::new(ResponseCode::NoError);
        reply
            .add_answer(RRset::from_str("test.example.com. 3600 IN A 192.0.2.2").unwrap())
            .add_authority(RRset::from_str("example.com. 10 IN NS ns1.example.com.").unwrap())
            .add_additional(RRset::from_str("ns1.example.com. 3600 IN A 2.2.2.2").unwrap());
        reply.flags.recursion_desired = true;
        reply.security = SecurityStatus::Secure;
        (query, reply)
    }

    fn build_entry(rrset_cache: &RRsetCache) -> (MessageEntry, ReplyInfo) {
        let (query, reply) = build_positive_response();
        let (refs, min_expire_time) =
            store_rrsets(rrset_cache, &reply, &CacheConfig::default(), NOW).unwrap();
        let expire_time = min_expire_time.min(NOW + reply.min_ttl() as u64);
        let entry = MessageEntry::new(
            &query,
            &reply,
            refs,
            expire_time,
            prefetch_time(NOW, expire_time),
        );
        (entry, reply)
    }

    #[test]
    fn test_positive_message() {
        let rrset_cache = RRsetCache::new(1 << 16, 4);
        let (entry, reply) = build_entry(&rrset_cache);
        assert_eq!(rrset_cache.len(), 3);
        assert_eq!(entry.query().qname, Name::from_str("test.example.com.").unwrap());
        assert_eq!(entry.rrset_refs().len(), 3);
        assert_eq!(entry.expire_time(), NOW + 10);

        let message = entry.fill_message(&rrset_cache, NOW + 4).unwrap().unwrap();
        assert_eq!(message.reply.ttl, 6);
        assert_eq!(message.reply.rcode, ResponseCode::NoError);
        assert!(message.reply.flags.recursion_desired);
        assert_eq!(message.reply.security, SecurityStatus::Secure);
        assert!(!message.needs_prefetch());
        for (section, rrset) in reply.rrsets() {
            let cached = &message.section(section)[0];
            assert_eq!(cached.name, rrset.name);
            assert_eq!(cached.rdatas, rrset.rdatas);
            assert!(cached.ttl < rrset.ttl);
        }

        let message = entry.fill_message(&rrset_cache, NOW + 9).unwrap().unwrap();
        assert_eq!(message.reply.ttl, 1);
        assert!(message.needs_prefetch());
        assert!(entry.fill_message(&rrset_cache, NOW + 10).unwrap().is_none());
    }

    #[test]
    fn test_security_is_weakest_rrset() {
        let rrset_cache = RRsetCache::new(1 << 16, 4);
        let (entry, _) = build_entry(&rrset_cache);
        let glue = RRset::from_str("ns1.example.com. 3600 IN A 2.2.2.2").unwrap();
        rrset_cache.add_rrset(
            &glue,
            TrustLevel::AnswerWithAA,
            SecurityStatus::Insecure,
            NOW,
        );
        let message = entry.fill_message(&rrset_cache, NOW).unwrap().unwrap();
        assert_eq!(message.reply.security, SecurityStatus::Insecure);
    }

    #[test]
    fn test_missing_rrset() {
        let rrset_cache = RRsetCache::new(1 << 16, 4);
        let (entry, _) = build_entry(&rrset_cache);
        let other_cache = RRsetCache::new(1 << 16, 4);
        assert!(entry.fill_message(&other_cache, NOW).unwrap().is_none());
    }
}
