use core::{fmt, num::NonZeroU16, str::FromStr};

use crate::{
    error::Error,
    hash::Sha256Digest,
    tlv::{parse_tlvs, write_tlv, Encode, TlvError, TLV_TYPE_NAME},
};

const NAME_COMPONENT_TYPE_GENERIC: u16 = 8;
const NAME_COMPONENT_TYPE_IMPLICIT_SHA256: u16 = 1;
const NAME_COMPONENT_TYPE_PARAMETER_SHA256: u16 = 2;

const LOCALHOST: &[u8] = b"localhost";
const LOCALHOP: &[u8] = b"localhop";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NameComponentType {
    Generic,
    ImplicitSha256Digest,
    ParameterSha256Digest,
    Other(NonZeroU16),
}

impl From<NonZeroU16> for NameComponentType {
    fn from(value: NonZeroU16) -> Self {
        match value.get() {
            NAME_COMPONENT_TYPE_GENERIC => NameComponentType::Generic,
            NAME_COMPONENT_TYPE_IMPLICIT_SHA256 => NameComponentType::ImplicitSha256Digest,
            NAME_COMPONENT_TYPE_PARAMETER_SHA256 => NameComponentType::ParameterSha256Digest,
            _ => NameComponentType::Other(value),
        }
    }
}

impl From<NameComponentType> for NonZeroU16 {
    fn from(value: NameComponentType) -> Self {
        let typ = match value {
            NameComponentType::Generic => NAME_COMPONENT_TYPE_GENERIC,
            NameComponentType::ImplicitSha256Digest => NAME_COMPONENT_TYPE_IMPLICIT_SHA256,
            NameComponentType::ParameterSha256Digest => NAME_COMPONENT_TYPE_PARAMETER_SHA256,
            NameComponentType::Other(v) => return v,
        };
        // The constants above are all non-zero
        NonZeroU16::new(typ).unwrap_or(NonZeroU16::MIN)
    }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameComponent {
    pub typ: NonZeroU16,
    pub bytes: Box<[u8]>,
}

impl NameComponent {
    pub fn new(typ: NameComponentType, bytes: &[u8]) -> Self {
        Self {
            typ: typ.into(),
            bytes: Box::from(bytes),
        }
    }

    pub fn generic(bytes: &[u8]) -> Self {
        Self::new(NameComponentType::Generic, bytes)
    }

    pub fn implicit_digest(digest: &Sha256Digest) -> Self {
        Self::new(NameComponentType::ImplicitSha256Digest, &digest.0)
    }

    pub fn component_type(&self) -> NameComponentType {
        self.typ.into()
    }

    pub fn is_implicit_digest(&self) -> bool {
        self.component_type() == NameComponentType::ImplicitSha256Digest && self.bytes.len() == 32
    }

    fn fmt_escaped(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Components made only of periods get three extra ones, "." and ".." are reserved
        if bytes.iter().all(|b| *b == b'.') {
            f.write_str("...")?;
        }
        for b in bytes {
            match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                    write!(f, "{}", *b as char)?
                }
                _ => write!(f, "%{:02X}", b)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component_type() {
            NameComponentType::Generic => Self::fmt_escaped(&self.bytes, f),
            NameComponentType::ImplicitSha256Digest if self.bytes.len() == 32 => {
                f.write_str("sha256digest=")?;
                self.bytes.iter().try_for_each(|b| write!(f, "{:02x}", b))
            }
            NameComponentType::ParameterSha256Digest if self.bytes.len() == 32 => {
                f.write_str("params-sha256=")?;
                self.bytes.iter().try_for_each(|b| write!(f, "{:02x}", b))
            }
            _ => {
                write!(f, "{}=", self.typ)?;
                Self::fmt_escaped(&self.bytes, f)
            }
        }
    }
}

impl fmt::Debug for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for NameComponent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidName(s.to_string());

        if let Some(hex) = s.strip_prefix("sha256digest=") {
            let bytes = parse_hex(hex).ok_or_else(invalid)?;
            if bytes.len() != 32 {
                return Err(invalid());
            }
            return Ok(Self::new(NameComponentType::ImplicitSha256Digest, &bytes));
        }
        if let Some(hex) = s.strip_prefix("params-sha256=") {
            let bytes = parse_hex(hex).ok_or_else(invalid)?;
            if bytes.len() != 32 {
                return Err(invalid());
            }
            return Ok(Self::new(NameComponentType::ParameterSha256Digest, &bytes));
        }

        let (typ, value) = match s.split_once('=') {
            Some((typ, value)) if !typ.is_empty() && typ.bytes().all(|b| b.is_ascii_digit()) => {
                let typ: u16 = typ.parse().map_err(|_| invalid())?;
                let typ = NonZeroU16::new(typ).ok_or_else(invalid)?;
                (typ, value)
            }
            _ => (NameComponentType::Generic.into(), s),
        };

        let mut bytes = unescape(value).ok_or_else(invalid)?;
        if bytes.iter().all(|b| *b == b'.') {
            if bytes.len() < 3 {
                return Err(invalid());
            }
            bytes.truncate(bytes.len() - 3);
        }

        Ok(Self {
            typ,
            bytes: bytes.into_boxed_slice(),
        })
    }
}

fn parse_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

fn unescape(s: &str) -> Option<Vec<u8>> {
    let raw = s.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Some(out)
}

/// A hierarchical NDN name.
///
/// Names order component-wise, so a prefix always sorts before the names it
/// is a prefix of.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    pub fn from_components(components: Vec<NameComponent>) -> Self {
        Self { components }
    }

    // Decodes the value of a Name TLV, i.e. a concatenation of components.
    pub fn from_tlv_value(bytes: &[u8]) -> Result<Self, TlvError> {
        let mut components = Vec::new();
        for tlv in parse_tlvs(bytes) {
            let tlv = tlv?;
            let typ = u16::try_from(tlv.typ.get())
                .ok()
                .and_then(NonZeroU16::new)
                .ok_or(TlvError::InvalidType)?;
            components.push(NameComponent {
                typ,
                bytes: Box::from(tlv.val),
            });
        }
        Ok(Self { components })
    }

    pub fn components(&self) -> &[NameComponent] {
        &self.components
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    pub fn last(&self) -> Option<&NameComponent> {
        self.components.last()
    }

    // The first `count` components, the whole name if it is shorter
    pub fn prefix(&self, count: usize) -> Name {
        let count = count.min(self.components.len());
        Name {
            components: self.components[..count].to_vec(),
        }
    }

    pub fn dropping_last_component(&self) -> Option<Name> {
        if self.components.is_empty() {
            None
        } else {
            Some(self.prefix(self.components.len() - 1))
        }
    }

    pub fn adding_component(&self, component: NameComponent) -> Name {
        let mut name = self.clone();
        name.components.push(component);
        name
    }

    pub fn push(&mut self, component: NameComponent) {
        self.components.push(component)
    }

    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self.components[..] == other.components[..self.components.len()]
    }

    pub fn is_localhost(&self) -> bool {
        self.starts_with_generic(LOCALHOST)
    }

    pub fn is_localhop(&self) -> bool {
        self.starts_with_generic(LOCALHOP)
    }

    fn starts_with_generic(&self, bytes: &[u8]) -> bool {
        self.components.first().map_or(false, |c| {
            c.component_type() == NameComponentType::Generic && &c.bytes[..] == bytes
        })
    }

    fn components_len(&self) -> usize {
        self.components
            .iter()
            .map(|c| {
                let l = c.bytes.len() as u64;
                (c.typ.get() as u64).encoded_length() + l.encoded_length() + c.bytes.len()
            })
            .sum()
    }
}

impl Encode for Name {
    fn encoded_length(&self) -> usize {
        let component_len = self.components_len();
        (TLV_TYPE_NAME as u64).encoded_length()
            + (component_len as u64).encoded_length()
            + component_len
    }

    fn encode(&self, out: &mut Vec<u8>) {
        (TLV_TYPE_NAME as u64).encode(out);
        (self.components_len() as u64).encode(out);
        for c in self.components.iter() {
            write_tlv(out, c.typ.get() as u32, &c.bytes);
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for c in self.components.iter() {
            write!(f, "/{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("ndn:").unwrap_or(s);
        let s = s.strip_prefix('/').unwrap_or(s);
        let mut components = Vec::new();
        for part in s.split('/') {
            if part.is_empty() {
                // Trailing slash
                continue;
            }
            components.push(part.parse()?);
        }
        Ok(Self { components })
    }
}
