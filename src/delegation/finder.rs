use super::delegation_point::DelegationPoint;
use crate::cache::{EntryKey, RRsetCache, RRsetHandle};
use crate::error::CacheError;
use crate::message::{DnsMessage, QueryInfo, ReplyInfo};
use hickory_proto::{
    op::ResponseCode,
    rr::{DNSClass, Name, RecordType},
};
use tracing::debug;

const ADDRESS_TYPES: &[RecordType] = &[RecordType::A, RecordType::AAAA];

//deepest cached ns rrset at or above qname, ds is served by the parent zone
//so its walk begins one label up
fn find_ns_rrset(
    rrset_cache: &RRsetCache,
    qname: &Name,
    qtype: RecordType,
    qclass: DNSClass,
    now: u64,
) -> Option<RRsetHandle> {
    let skip = if qtype == RecordType::DS && !qname.is_root() {
        1
    } else {
        0
    };
    EntryKey::rrset_of_ancestors(qname, RecordType::NS, qclass)
        .iter()
        .skip(skip)
        .find_map(|key| rrset_cache.lookup(key, now))
}

fn glue_of<'a>(
    rrset_cache: &'a RRsetCache,
    name: &Name,
    qclass: DNSClass,
    now: u64,
) -> impl Iterator<Item = RRsetHandle> + 'a {
    let name = name.clone();
    ADDRESS_TYPES
        .iter()
        .filter_map(move |typ| rrset_cache.lookup(&EntryKey::rrset(&name, *typ, qclass), now))
}

fn build_delegation(
    rrset_cache: &RRsetCache,
    ns: &RRsetHandle,
    qclass: DNSClass,
    now: u64,
) -> Result<DelegationPoint, CacheError> {
    let mut dp = DelegationPoint::new(ns.name().clone(), qclass);
    for target in ns.rrset().ns_targets() {
        dp.add_nameserver(target.clone())?;
    }
    fill_missing(rrset_cache, &mut dp, qclass, now)?;
    Ok(dp)
}

pub(crate) fn find_delegation(
    rrset_cache: &RRsetCache,
    qname: &Name,
    qtype: RecordType,
    qclass: DNSClass,
    now: u64,
) -> Result<Option<DelegationPoint>, CacheError> {
    match find_ns_rrset(rrset_cache, qname, qtype, qclass, now) {
        Some(ns) => build_delegation(rrset_cache, &ns, qclass, now).map(Some),
        None => {
            debug!(name = %qname, "no delegation in cache");
            Ok(None)
        }
    }
}

//the delegation plus the referral a server at the zone cut would have sent
pub(crate) fn find_delegation_with_referral(
    rrset_cache: &RRsetCache,
    qname: &Name,
    qtype: RecordType,
    qclass: DNSClass,
    now: u64,
) -> Result<Option<(DelegationPoint, DnsMessage)>, CacheError> {
    let ns = match find_ns_rrset(rrset_cache, qname, qtype, qclass, now) {
        Some(ns) => ns,
        None => return Ok(None),
    };
    let dp = build_delegation(rrset_cache, &ns, qclass, now)?;

    let mut reply = ReplyInfo::new(ResponseCode::NoError);
    let mut ttl = ns.remaining_ttl(now);
    let mut security = ns.security();
    reply.add_authority(ns.to_rrset(now));
    for target in ns.rrset().ns_targets() {
        for glue in glue_of(rrset_cache, target, qclass, now) {
            ttl = ttl.min(glue.remaining_ttl(now));
            security = security.min(glue.security());
            reply.add_additional(glue.to_rrset(now));
        }
    }
    reply.set_ttl(ttl).set_security(security);
    let query = QueryInfo::new(qname.clone(), qtype, qclass);
    Ok(Some((dp, DnsMessage::new(query, reply))))
}

//attach cached addresses to nameservers which have none yet
pub(crate) fn fill_missing(
    rrset_cache: &RRsetCache,
    dp: &mut DelegationPoint,
    qclass: DNSClass,
    now: u64,
) -> Result<(), CacheError> {
    for name in dp.missing_names() {
        for glue in glue_of(rrset_cache, &name, qclass, now) {
            for address in glue.rrset().addresses() {
                dp.add_address(&name, address)?;
            }
        }
    }
    Ok(())
}
