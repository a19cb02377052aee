use super::{
    entry_key::EntryKey,
    message_cache::{MessageCache, MessageLookup},
    message_util::prefetch_time,
    rrset_cache::{RRsetCache, RRsetHandle},
    trust::{SecurityStatus, TrustLevel},
};
use crate::config::CacheConfig;
use crate::delegation::{self, DelegationPoint};
use crate::error::CacheError;
use crate::message::{DnsMessage, QueryInfo, RRset, ReplyInfo};
use hickory_proto::{
    op::ResponseCode,
    rr::{DNSClass, Name, RecordType},
};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

//seconds since unix epoch, the clock every `now` argument is measured in
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

//message cache and rrset cache shared by every resolver worker, messages
//only hold keys into the rrset cache so the two tables are locked apart
pub struct DnsCache {
    messages: MessageCache,
    rrsets: RRsetCache,
    config: CacheConfig,
}

impl DnsCache {
    pub fn new(config: CacheConfig) -> Self {
        info!(
            message_cache_size = config.message_cache_size,
            rrset_cache_size = config.rrset_cache_size,
            buckets = config.buckets,
            "create dns cache"
        );
        DnsCache {
            messages: MessageCache::new(&config),
            rrsets: RRsetCache::new(config.rrset_cache_size, config.buckets),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    #[inline]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    #[inline]
    pub fn rrset_count(&self) -> usize {
        self.rrsets.len()
    }

    pub fn used_bytes(&self) -> (usize, usize) {
        (self.messages.used_bytes(), self.rrsets.used_bytes())
    }

    //the only hash `store_message` accepts for the query
    pub fn query_hash(qname: &Name, qtype: RecordType, qclass: DNSClass) -> u64 {
        EntryKey::message(qname, qtype, qclass).hash_value()
    }

    pub fn store(
        &self,
        query: &QueryInfo,
        reply: &ReplyInfo,
        is_referral: bool,
        now: u64,
    ) -> bool {
        self.messages
            .store_message(&self.rrsets, query, reply, is_referral, now)
    }

    pub fn store_message(&self, query: &QueryInfo, hash: u64, reply: &ReplyInfo, now: u64) -> bool {
        self.messages
            .store_message_hashed(&self.rrsets, query, hash, reply, now)
    }

    pub fn store_rrset(
        &self,
        rrset: &RRset,
        trust_level: TrustLevel,
        security: SecurityStatus,
        now: u64,
    ) -> bool {
        let expire_time = now + self.config.clamp_ttl(rrset.ttl) as u64;
        let key = EntryKey::rrset(&rrset.name, rrset.typ, rrset.class);
        self.rrsets
            .store(key, rrset, expire_time, trust_level, security, now)
    }

    pub fn get_rrset(
        &self,
        name: &Name,
        typ: RecordType,
        class: DNSClass,
        now: u64,
    ) -> Option<RRset> {
        self.rrsets.get_rrset(name, typ, class, now)
    }

    pub fn lookup(
        &self,
        qname: &Name,
        qtype: RecordType,
        qclass: DNSClass,
        now: u64,
    ) -> Option<DnsMessage> {
        match self
            .messages
            .find_message(&self.rrsets, qname, qtype, qclass, now)
        {
            MessageLookup::Hit(message) => return Some(message),
            MessageLookup::Incomplete => return None,
            MessageLookup::Missing => {}
        }
        //no message for the query, a single answer rrset may still serve it
        self.lookup_rrset(qname, qtype, qclass, now)
            .or_else(|| {
                if qtype == RecordType::CNAME {
                    None
                } else {
                    self.lookup_rrset(qname, RecordType::CNAME, qclass, now)
                        .map(|mut message| {
                            message.query.qtype = qtype;
                            message
                        })
                }
            })
    }

    //a single rrset answer built from the rrset cache, only data good
    //enough to be an answer is served this way
    fn lookup_rrset(
        &self,
        qname: &Name,
        typ: RecordType,
        qclass: DNSClass,
        now: u64,
    ) -> Option<DnsMessage> {
        let answer = self
            .rrsets
            .lookup(&EntryKey::rrset(qname, typ, qclass), now)
            .filter(|entry| {
                entry.trust_level().is_answer() && entry.security() != SecurityStatus::Bogus
            })?;

        let mut reply = ReplyInfo::new(ResponseCode::NoError);
        reply.flags.recursion_available = true;
        let mut ttl = answer.remaining_ttl(now);
        let mut security = answer.security();
        reply.add_answer(answer.to_rrset(now));
        if typ == RecordType::NS {
            for glue in self.in_zone_glue(&answer, qclass, now) {
                ttl = ttl.min(glue.remaining_ttl(now));
                security = security.min(glue.security());
                reply.add_additional(glue.to_rrset(now));
            }
        }
        reply.set_ttl(ttl).set_security(security);
        reply.prefetch_ttl = (prefetch_time(now, answer.expire_time()) - now) as u32;
        let query = QueryInfo::new(qname.clone(), typ, qclass);
        Some(DnsMessage::new(query, reply))
    }

    fn in_zone_glue(&self, ns: &RRsetHandle, qclass: DNSClass, now: u64) -> Vec<RRsetHandle> {
        let mut glues = Vec::new();
        for target in ns.rrset().ns_targets() {
            if !ns.name().zone_of(target) {
                continue;
            }
            for typ in &[RecordType::A, RecordType::AAAA] {
                if let Some(glue) = self
                    .rrsets
                    .lookup(&EntryKey::rrset(target, *typ, qclass), now)
                {
                    glues.push(glue);
                }
            }
        }
        glues
    }

    pub fn find_delegation(
        &self,
        qname: &Name,
        qtype: RecordType,
        qclass: DNSClass,
        now: u64,
    ) -> Option<DelegationPoint> {
        delegation::find_delegation(&self.rrsets, qname, qtype, qclass, now)
            .unwrap_or_else(|e| log_failure("find delegation", qname, e))
    }

    pub fn find_delegation_with_referral(
        &self,
        qname: &Name,
        qtype: RecordType,
        qclass: DNSClass,
        now: u64,
    ) -> Option<(DelegationPoint, DnsMessage)> {
        delegation::find_delegation_with_referral(&self.rrsets, qname, qtype, qclass, now)
            .unwrap_or_else(|e| log_failure("find delegation", qname, e))
    }

    //partial results are normal, false only when memory runs out
    pub fn fill_missing(&self, dp: &mut DelegationPoint, qclass: DNSClass, now: u64) -> bool {
        match delegation::fill_missing(&self.rrsets, dp, qclass, now) {
            Ok(()) => true,
            Err(e) => {
                warn!(zone = %dp.zone(), error = %e, "fill delegation failed");
                false
            }
        }
    }
}

fn log_failure<T>(action: &str, qname: &Name, e: CacheError) -> Option<T> {
    warn!(name = %qname, error = %e, "{} failed", action);
    None
}
