use super::trust::{SecurityStatus, TrustLevel};
use crate::error::CacheError;
use crate::lru::Merge;
use crate::message::RRset;
use hickory_proto::rr::{DNSClass, Name, RecordType};
use std::{cmp::Ordering, mem};

#[derive(Clone, Debug)]
pub struct RRsetEntry {
    rrset: RRset,
    trust_level: TrustLevel,
    security: SecurityStatus,
    expire_time: u64,
}

impl RRsetEntry {
    //copy rrset out of the caller's memory, it may be reused once we return
    pub fn new(
        rrset: &RRset,
        expire_time: u64,
        trust_level: TrustLevel,
        security: SecurityStatus,
    ) -> Result<Self, CacheError> {
        let mut rdatas = Vec::new();
        rdatas
            .try_reserve_exact(rrset.rdatas.len())
            .map_err(|e| CacheError::AllocFailed("rrset", e))?;
        rdatas.extend(rrset.rdatas.iter().cloned());
        Ok(RRsetEntry {
            rrset: RRset {
                name: rrset.name.clone(),
                typ: rrset.typ,
                class: rrset.class,
                ttl: rrset.ttl,
                rdatas,
            },
            trust_level,
            security,
            expire_time,
        })
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.rrset.name
    }

    #[inline]
    pub fn typ(&self) -> RecordType {
        self.rrset.typ
    }

    #[inline]
    pub fn class(&self) -> DNSClass {
        self.rrset.class
    }

    #[inline]
    pub fn trust_level(&self) -> TrustLevel {
        self.trust_level
    }

    #[inline]
    pub fn security(&self) -> SecurityStatus {
        self.security
    }

    #[inline]
    pub fn expire_time(&self) -> u64 {
        self.expire_time
    }

    //rdatas and original ttl as received
    #[inline]
    pub fn rrset(&self) -> &RRset {
        &self.rrset
    }

    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expire_time <= now
    }

    pub fn remaining_ttl(&self, now: u64) -> u32 {
        self.expire_time.saturating_sub(now).min(u32::max_value() as u64) as u32
    }

    pub fn get_rrset(&self, now: u64) -> Option<RRset> {
        if self.is_expired(now) {
            None
        } else {
            Some(self.to_rrset(now))
        }
    }

    pub fn to_rrset(&self, now: u64) -> RRset {
        let mut rrset = self.rrset.clone();
        rrset.ttl = self.remaining_ttl(now);
        rrset
    }

    pub fn size(&self) -> usize {
        mem::size_of::<RRsetEntry>() + self.rrset.size()
    }

    //an expired entry always gives way, otherwise higher trust wins, then
    //better security, and on a full tie the newly received data
    pub fn merge(cached: &RRsetEntry, incoming: &RRsetEntry, now: u64) -> Merge {
        if cached.is_expired(now) {
            return Merge::Replace;
        }
        match incoming.trust_level.cmp(&cached.trust_level) {
            Ordering::Greater => Merge::Replace,
            Ordering::Less => Merge::Keep,
            Ordering::Equal => {
                if incoming.security >= cached.security {
                    Merge::Replace
                } else {
                    Merge::Keep
                }
            }
        }
    }
}
