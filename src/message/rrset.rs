use crate::error::CacheError;
use hickory_proto::rr::{
    rdata::{A, AAAA, CNAME, NS, SOA},
    DNSClass, Name, RData, RecordType,
};
use std::{
    fmt,
    mem,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

#[derive(Clone, Debug, PartialEq)]
pub struct RRset {
    pub name: Name,
    pub typ: RecordType,
    pub class: DNSClass,
    pub ttl: u32,
    pub rdatas: Vec<RData>,
}

impl RRset {
    pub fn new(name: Name, typ: RecordType, class: DNSClass, ttl: u32) -> Self {
        RRset {
            name,
            typ,
            class,
            ttl,
            rdatas: Vec::new(),
        }
    }

    pub fn add_rdata(&mut self, rdata: RData) -> &mut Self {
        self.rdatas.push(rdata);
        self
    }

    #[inline]
    pub fn rr_count(&self) -> usize {
        self.rdatas.len()
    }

    pub fn ns_targets(&self) -> impl Iterator<Item = &Name> {
        self.rdatas.iter().filter_map(|rdata| match rdata {
            RData::NS(ns) => Some(&ns.0),
            _ => None,
        })
    }

    pub fn addresses(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.rdatas.iter().filter_map(|rdata| match rdata {
            RData::A(a) => Some(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
    }

    pub fn cname_target(&self) -> Option<&Name> {
        self.rdatas.iter().find_map(|rdata| match rdata {
            RData::CNAME(cname) => Some(&cname.0),
            _ => None,
        })
    }

    //rough heap footprint, used as the lru cost
    pub fn size(&self) -> usize {
        mem::size_of::<RRset>()
            + self.name.len()
            + self
                .rdatas
                .iter()
                .map(|rdata| mem::size_of::<RData>() + rdata_len(rdata))
                .sum::<usize>()
    }
}

impl fmt::Display for RRset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, rdata) in self.rdatas.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{} {} {} {} {}",
                self.name, self.ttl, self.class, self.typ, rdata
            )?;
        }
        Ok(())
    }
}

fn rdata_len(rdata: &RData) -> usize {
    match rdata {
        RData::A(_) => 4,
        RData::AAAA(_) => 16,
        RData::NS(ns) => ns.0.len(),
        RData::CNAME(cname) => cname.0.len(),
        RData::SOA(soa) => soa.mname().len() + soa.rname().len() + 20,
        _ => mem::size_of::<RData>(),
    }
}

fn parse_name(s: &str) -> Result<Name, CacheError> {
    let name = if s.ends_with('.') {
        Name::from_ascii(s)
    } else {
        Name::from_ascii(format!("{}.", s))
    };
    name.map_err(|e| CacheError::InvalidRRset(format!("bad name {}: {}", s, e)))
}

fn parse_field<T: FromStr>(s: &str, what: &str) -> Result<T, CacheError> {
    s.parse::<T>()
        .map_err(|_| CacheError::InvalidRRset(format!("bad {} {}", what, s)))
}

fn parse_rdata(typ: RecordType, fields: &[&str]) -> Result<RData, CacheError> {
    let field_count = match typ {
        RecordType::SOA => 7,
        _ => 1,
    };
    if fields.len() != field_count {
        return Err(CacheError::InvalidRRset(format!(
            "{} rdata needs {} fields but get {}",
            typ,
            field_count,
            fields.len()
        )));
    }

    match typ {
        RecordType::A => Ok(RData::A(A(parse_field::<Ipv4Addr>(fields[0], "ipv4")?))),
        RecordType::AAAA => Ok(RData::AAAA(AAAA(parse_field::<Ipv6Addr>(
            fields[0], "ipv6",
        )?))),
        RecordType::NS => Ok(RData::NS(NS(parse_name(fields[0])?))),
        RecordType::CNAME => Ok(RData::CNAME(CNAME(parse_name(fields[0])?))),
        RecordType::SOA => Ok(RData::SOA(SOA::new(
            parse_name(fields[0])?,
            parse_name(fields[1])?,
            parse_field::<u32>(fields[2], "serial")?,
            parse_field::<i32>(fields[3], "refresh")?,
            parse_field::<i32>(fields[4], "retry")?,
            parse_field::<i32>(fields[5], "expire")?,
            parse_field::<u32>(fields[6], "minimum")?,
        ))),
        _ => Err(CacheError::InvalidRRset(format!(
            "rdata of type {} isn't supported",
            typ
        ))),
    }
}

//"www.zdns.cn. 300 IN A 1.1.1.1"
impl FromStr for RRset {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.split_whitespace().collect::<Vec<&str>>();
        if fields.len() < 5 {
            return Err(CacheError::InvalidRRset(format!("short of fields: {}", s)));
        }

        let name = parse_name(fields[0])?;
        let ttl = parse_field::<u32>(fields[1], "ttl")?;
        let class = parse_field::<DNSClass>(fields[2], "class")?;
        let typ = parse_field::<RecordType>(fields[3], "type")?;
        let rdata = parse_rdata(typ, &fields[4..])?;
        Ok(RRset {
            name,
            typ,
            class,
            ttl,
            rdatas: vec![rdata],
        })
    }
}
