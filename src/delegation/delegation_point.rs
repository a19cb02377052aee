use crate::error::CacheError;
use hickory_proto::rr::{DNSClass, Name};
use std::net::IpAddr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameserverEntry {
    pub name: Name,
    pub addresses: Vec<IpAddr>,
}

impl NameserverEntry {
    pub fn new(name: Name) -> Self {
        NameserverEntry {
            name,
            addresses: Vec::new(),
        }
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        !self.addresses.is_empty()
    }
}

//the closest zone cut known from cache and the servers to ask there
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegationPoint {
    zone: Name,
    class: DNSClass,
    nameservers: Vec<NameserverEntry>,
}

impl DelegationPoint {
    pub fn new(zone: Name, class: DNSClass) -> Self {
        DelegationPoint {
            zone,
            class,
            nameservers: Vec::new(),
        }
    }

    #[inline]
    pub fn zone(&self) -> &Name {
        &self.zone
    }

    #[inline]
    pub fn class(&self) -> DNSClass {
        self.class
    }

    #[inline]
    pub fn nameservers(&self) -> &[NameserverEntry] {
        &self.nameservers
    }

    pub fn add_nameserver(&mut self, name: Name) -> Result<(), CacheError> {
        if self.nameservers.iter().any(|ns| ns.name == name) {
            return Ok(());
        }
        self.nameservers
            .try_reserve(1)
            .map_err(|e| CacheError::AllocFailed("delegation", e))?;
        self.nameservers.push(NameserverEntry::new(name));
        Ok(())
    }

    //returns false if the name isn't one of the nameservers
    pub fn add_address(&mut self, name: &Name, address: IpAddr) -> Result<bool, CacheError> {
        let nameserver = match self.nameservers.iter_mut().find(|ns| &ns.name == name) {
            Some(nameserver) => nameserver,
            None => return Ok(false),
        };
        if !nameserver.addresses.contains(&address) {
            nameserver
                .addresses
                .try_reserve(1)
                .map_err(|e| CacheError::AllocFailed("delegation", e))?;
            nameserver.addresses.push(address);
        }
        Ok(true)
    }

    pub fn missing_names(&self) -> Vec<Name> {
        self.nameservers
            .iter()
            .filter(|ns| !ns.is_resolved())
            .map(|ns| ns.name.clone())
            .collect()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &IpAddr> {
        self.nameservers.iter().flat_map(|ns| ns.addresses.iter())
    }

    #[inline]
    pub fn has_address(&self) -> bool {
        self.nameservers.iter().any(NameserverEntry::is_resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    #[test]
    fn test_delegation_point() {
        let mut dp = DelegationPoint::new(name("example.com."), DNSClass::IN);
        dp.add_nameserver(name("ns1.example.com.")).unwrap();
        dp.add_nameserver(name("ns2.example.com.")).unwrap();
        dp.add_nameserver(name("ns1.example.com.")).unwrap();
        assert_eq!(dp.nameservers().len(), 2);
        assert!(!dp.has_address());
        assert_eq!(
            dp.missing_names(),
            vec![name("ns1.example.com."), name("ns2.example.com.")]
        );

        let addr = "1.2.3.4".parse().unwrap();
        assert!(dp.add_address(&name("ns1.example.com."), addr).unwrap());
        assert!(dp.add_address(&name("ns1.example.com."), addr).unwrap());
        assert!(!dp.add_address(&name("ns3.example.com."), addr).unwrap());
        assert_eq!(dp.missing_names(), vec![name("ns2.example.com.")]);
        assert_eq!(dp.addresses().collect::<Vec<_>>(), vec![&addr]);
        assert!(dp.has_address());
    }
}
