use hickory_proto::rr::{DNSClass, Name, RecordType};
use rustc_hash::FxHasher;
use std::{
    fmt::{self, Debug},
    hash::{Hash, Hasher},
    sync::Arc,
};

const RRSET_KEY_TAG: u8 = 0;
const MESSAGE_KEY_TAG: u8 = 1;

//lowercased wire form of the owner name, then type, class and a tag
//which keeps rrset keys and message keys apart
#[derive(Clone)]
pub struct EntryKey {
    bytes: Arc<[u8]>,
    hash: u64,
}

impl EntryKey {
    pub fn rrset(name: &Name, typ: RecordType, class: DNSClass) -> Self {
        EntryKey::from_labels(RRSET_KEY_TAG, name.iter(), typ, class, None)
    }

    pub fn message(name: &Name, typ: RecordType, class: DNSClass) -> Self {
        EntryKey::from_labels(MESSAGE_KEY_TAG, name.iter(), typ, class, None)
    }

    pub fn message_with_hash(name: &Name, typ: RecordType, class: DNSClass, hash: u64) -> Self {
        EntryKey::from_labels(MESSAGE_KEY_TAG, name.iter(), typ, class, Some(hash))
    }

    //keys of `typ` for the name itself and every ancestor, closest first
    pub fn rrset_of_ancestors(name: &Name, typ: RecordType, class: DNSClass) -> Vec<Self> {
        let labels = name.iter().collect::<Vec<&[u8]>>();
        (0..=labels.len())
            .map(|i| {
                EntryKey::from_labels(RRSET_KEY_TAG, labels[i..].iter().cloned(), typ, class, None)
            })
            .collect()
    }

    fn from_labels<'a, I: Iterator<Item = &'a [u8]>>(
        tag: u8,
        labels: I,
        typ: RecordType,
        class: DNSClass,
        hash: Option<u64>,
    ) -> Self {
        let mut bytes = Vec::with_capacity(64);
        for label in labels {
            bytes.push(label.len() as u8);
            bytes.extend(label.iter().map(|c| c.to_ascii_lowercase()));
        }
        bytes.push(0);
        bytes.extend_from_slice(&u16::from(typ).to_be_bytes());
        bytes.extend_from_slice(&u16::from(class).to_be_bytes());
        bytes.push(tag);
        let hash = hash.unwrap_or_else(|| hash_bytes(&bytes));
        EntryKey {
            bytes: Arc::from(bytes),
            hash,
        }
    }

    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    hasher.finish()
}

impl Hash for EntryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialEq for EntryKey {
    fn eq(&self, other: &EntryKey) -> bool {
        self.hash == other.hash && self.bytes == other.bytes
    }
}

impl Eq for EntryKey {}

impl Debug for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut pos = 0;
        loop {
            let len = self.bytes[pos] as usize;
            pos += 1;
            if len == 0 {
                break;
            }
            write!(f, "{}.", String::from_utf8_lossy(&self.bytes[pos..pos + len]))?;
            pos += len;
        }
        if pos == 1 {
            write!(f, ".")?;
        }
        let typ = u16::from_be_bytes([self.bytes[pos], self.bytes[pos + 1]]);
        let class = u16::from_be_bytes([self.bytes[pos + 2], self.bytes[pos + 3]]);
        write!(
            f,
            ":{}:{}",
            RecordType::from(typ),
            DNSClass::from_u16(class).unwrap_or(DNSClass::IN)
        )
    }
}
