use super::{
    entry_key::EntryKey, message_cache_entry::RRsetRef, rrset_cache::RRsetCache,
    trust::TrustLevel,
};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::message::ReplyInfo;

//store every rrset of the reply, returns the references in reply order and
//the earliest expire time among the rrsets left in cache
pub(crate) fn store_rrsets(
    rrset_cache: &RRsetCache,
    reply: &ReplyInfo,
    config: &CacheConfig,
    now: u64,
) -> Result<(Vec<RRsetRef>, u64), CacheError> {
    let mut refs = Vec::new();
    refs.try_reserve_exact(reply.rrset_count())
        .map_err(|e| CacheError::AllocFailed("message", e))?;
    let mut min_expire_time = u64::max_value();
    for (section, rrset) in reply.rrsets() {
        let key = EntryKey::rrset(&rrset.name, rrset.typ, rrset.class);
        let trust_level = TrustLevel::from_section(section, reply.flags.authoritative);
        let expire_time = now + config.clamp_ttl(rrset.ttl) as u64;
        let surviving = rrset_cache.update(
            key.clone(),
            rrset,
            expire_time,
            trust_level,
            reply.security,
            now,
        )?;
        min_expire_time = min_expire_time.min(surviving);
        refs.push(RRsetRef { key, section });
    }
    Ok((refs, min_expire_time))
}

//answers within the last tenth of their lifetime are worth refreshing
#[inline]
pub(crate) fn prefetch_time(now: u64, expire_time: u64) -> u64 {
    let ttl = expire_time.saturating_sub(now);
    now + ttl - ttl / 10
}
