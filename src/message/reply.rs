use super::rrset::RRset;
use crate::cache::SecurityStatus;
use hickory_proto::{
    op::ResponseCode,
    rr::{DNSClass, Name, RecordType},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SectionType {
    Answer = 0,
    Authority = 1,
    Additional = 2,
}

pub static ALL_SECTIONS: [SectionType; 3] = [
    SectionType::Answer,
    SectionType::Authority,
    SectionType::Additional,
];

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryInfo {
    pub qname: Name,
    pub qtype: RecordType,
    pub qclass: DNSClass,
}

impl QueryInfo {
    pub fn new(qname: Name, qtype: RecordType, qclass: DNSClass) -> Self {
        QueryInfo {
            qname,
            qtype,
            qclass,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplyFlags {
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub authentic_data: bool,
    pub checking_disabled: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReplyInfo {
    pub flags: ReplyFlags,
    pub rcode: ResponseCode,
    //upper bound of the reply ttl besides the rrsets, like soa minimum
    pub ttl: u32,
    pub prefetch_ttl: u32,
    pub security: SecurityStatus,
    sections: [Vec<RRset>; 3],
}

impl ReplyInfo {
    pub fn new(rcode: ResponseCode) -> Self {
        ReplyInfo {
            flags: ReplyFlags::default(),
            rcode,
            ttl: u32::max_value(),
            prefetch_ttl: u32::max_value(),
            security: SecurityStatus::Unchecked,
            sections: [Vec::new(), Vec::new(), Vec::new()],
        }
    }

    pub fn set_flags(&mut self, flags: ReplyFlags) -> &mut Self {
        self.flags = flags;
        self
    }

    pub fn set_ttl(&mut self, ttl: u32) -> &mut Self {
        self.ttl = ttl;
        self
    }

    pub fn set_security(&mut self, security: SecurityStatus) -> &mut Self {
        self.security = security;
        self
    }

    pub fn add_rrset(&mut self, section: SectionType, rrset: RRset) -> &mut Self {
        self.sections[section as usize].push(rrset);
        self
    }

    pub fn add_answer(&mut self, rrset: RRset) -> &mut Self {
        self.add_rrset(SectionType::Answer, rrset)
    }

    pub fn add_authority(&mut self, rrset: RRset) -> &mut Self {
        self.add_rrset(SectionType::Authority, rrset)
    }

    pub fn add_additional(&mut self, rrset: RRset) -> &mut Self {
        self.add_rrset(SectionType::Additional, rrset)
    }

    #[inline]
    pub fn section(&self, section: SectionType) -> &[RRset] {
        &self.sections[section as usize]
    }

    pub fn rrset_count(&self) -> usize {
        self.sections.iter().map(|rrsets| rrsets.len()).sum()
    }

    pub fn rrsets(&self) -> impl Iterator<Item = (SectionType, &RRset)> {
        ALL_SECTIONS.iter().flat_map(move |section| {
            self.sections[*section as usize]
                .iter()
                .map(move |rrset| (*section, rrset))
        })
    }

    pub fn min_ttl(&self) -> u32 {
        self.rrsets()
            .map(|(_, rrset)| rrset.ttl)
            .fold(self.ttl, u32::min)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DnsMessage {
    pub query: QueryInfo,
    pub reply: ReplyInfo,
}

impl DnsMessage {
    pub fn new(query: QueryInfo, reply: ReplyInfo) -> Self {
        DnsMessage { query, reply }
    }

    #[inline]
    pub fn section(&self, section: SectionType) -> &[RRset] {
        self.reply.section(section)
    }

    #[inline]
    pub fn needs_prefetch(&self) -> bool {
        self.reply.prefetch_ttl == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_reply_sections() {
        let mut reply = ReplyInfo::new(ResponseCode::NoError);
        reply
            .set_ttl(600)
            .add_answer(RRset::from_str("test.example.com. 3600 IN A 192.0.2.2").unwrap())
            .add_authority(RRset::from_str("example.com. 100 IN NS ns1.example.com.").unwrap())
            .add_additional(RRset::from_str("ns1.example.com. 3600 IN A 2.2.2.2").unwrap());

        assert_eq!(reply.rrset_count(), 3);
        assert_eq!(reply.section(SectionType::Answer).len(), 1);
        assert_eq!(reply.min_ttl(), 100);
        let sections = reply
            .rrsets()
            .map(|(section, rrset)| (section, rrset.typ))
            .collect::<Vec<_>>();
        assert_eq!(
            sections,
            vec![
                (SectionType::Answer, RecordType::A),
                (SectionType::Authority, RecordType::NS),
                (SectionType::Additional, RecordType::A),
            ]
        );

        reply.set_ttl(10);
        assert_eq!(reply.min_ttl(), 10);
    }
}
