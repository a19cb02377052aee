mod reply;
mod rrset;

pub use self::reply::{DnsMessage, QueryInfo, ReplyFlags, ReplyInfo, SectionType, ALL_SECTIONS};
pub use self::rrset::RRset;
