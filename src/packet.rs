use core::fmt;

use crate::{
    error::Error,
    face::FaceId,
    hash::Sha256Hasher,
    name::{Name, NameComponent},
    tlv::{
        parse_tlvs, write_nonneg_integer_tlv, write_tlv, Encode, TLV_TYPE_CONTENT,
        TLV_TYPE_DELEGATION, TLV_TYPE_FRESHNESS_PERIOD, TLV_TYPE_NAME, TLV_TYPE_PREFERENCE,
    },
};

const TLV_TYPE_DATA: u32 = 6;
const TLV_TYPE_META_INFO: u32 = 20;

pub type Nonce = u32;

// Per-hop artifacts attached by the receiving face. They describe one
//  delivery and are never cached or forwarded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PacketTags {
    pub incoming_face_id: Option<FaceId>,
    pub hop_count: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interest {
    pub name: Name,
    pub can_be_prefix: bool,
    pub must_be_fresh: bool,
    pub nonce: Nonce,
    pub lifetime_ms: Option<u64>,
    // Encoded sequence of Delegation TLVs, validated when the Interest enters the forwarder
    pub link: Option<Vec<u8>>,
    pub selected_delegation: Option<Name>,
    pub push: bool,
    // How many Data packets a push consumer expects for this Interest
    pub expected_data: Option<u32>,
    pub tags: PacketTags,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            can_be_prefix: false,
            must_be_fresh: false,
            nonce: rand::random(),
            lifetime_ms: None,
            link: None,
            selected_delegation: None,
            push: false,
            expected_data: None,
            tags: PacketTags::default(),
        }
    }

    pub fn with_nonce(mut self, nonce: Nonce) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_can_be_prefix(mut self, can_be_prefix: bool) -> Self {
        self.can_be_prefix = can_be_prefix;
        self
    }

    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    pub fn with_lifetime(mut self, lifetime_ms: u64) -> Self {
        self.lifetime_ms = Some(lifetime_ms);
        self
    }

    pub fn with_push(mut self, push: bool) -> Self {
        self.push = push;
        self
    }

    pub fn with_expected_data(mut self, expected_data: u32) -> Self {
        self.expected_data = Some(expected_data);
        self
    }

    pub fn with_link(mut self, link: &Link) -> Self {
        self.link = Some(link.encode());
        self
    }

    pub fn with_selected_delegation(mut self, delegation: Name) -> Self {
        self.selected_delegation = Some(delegation);
        self
    }

    pub fn lifetime_or(&self, default_ms: u64) -> u64 {
        self.lifetime_ms.unwrap_or(default_ms)
    }

    // Picks a random nonce different from the current one
    pub fn refresh_nonce(&mut self) {
        let old = self.nonce;
        while self.nonce == old {
            self.nonce = rand::random();
        }
    }

    pub fn decode_link(&self) -> Result<Option<Link>, Error> {
        self.link.as_deref().map(Link::decode).transpose()
    }

    // Selector matching as done by the PIT, freshness is left to the cache
    pub fn matches_data(&self, data: &Data) -> bool {
        let n = self.name.component_count();
        let m = data.name.component_count();
        if n == m + 1 {
            // Could only match through the implicit digest
            return self.name.last().map_or(false, |c| c.is_implicit_digest())
                && self.name == data.full_name();
        }
        if self.can_be_prefix {
            self.name.is_prefix_of(&data.name)
        } else {
            self.name == data.name
        }
    }

    // Same name and selectors, i.e. would share a PIT entry. Push and
    //  one-shot Interests never share one.
    pub fn same_selectors(&self, other: &Interest) -> bool {
        self.name == other.name
            && self.can_be_prefix == other.can_be_prefix
            && self.must_be_fresh == other.must_be_fresh
            && self.push == other.push
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.push {
            f.write_str("?push")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Data {
    pub name: Name,
    pub content: Vec<u8>,
    pub freshness_period_ms: Option<u64>,
    pub push: bool,
    pub tags: PacketTags,
}

impl Data {
    pub fn new(name: Name, content: &[u8]) -> Self {
        Self {
            name,
            content: content.to_vec(),
            freshness_period_ms: None,
            push: false,
            tags: PacketTags::default(),
        }
    }

    pub fn with_freshness_period(mut self, freshness_period_ms: u64) -> Self {
        self.freshness_period_ms = Some(freshness_period_ms);
        self
    }

    pub fn with_push(mut self, push: bool) -> Self {
        self.push = push;
        self
    }

    // Canonical TLV encoding of the named content, the input of the implicit digest.
    //  Tags and the push marker are delivery properties and are not covered.
    pub fn wire_encode(&self) -> Vec<u8> {
        let mut inner = Vec::new();
        self.name.encode(&mut inner);
        if let Some(freshness) = self.freshness_period_ms {
            let mut meta = Vec::new();
            write_nonneg_integer_tlv(&mut meta, TLV_TYPE_FRESHNESS_PERIOD, freshness);
            write_tlv(&mut inner, TLV_TYPE_META_INFO, &meta);
        }
        write_tlv(&mut inner, TLV_TYPE_CONTENT, &self.content);

        let mut out = Vec::new();
        write_tlv(&mut out, TLV_TYPE_DATA, &inner);
        out
    }

    pub fn full_name(&self) -> Name {
        let digest = Sha256Hasher::digest(&self.wire_encode());
        self.name
            .adding_component(NameComponent::implicit_digest(&digest))
    }

    // The copy that may be cached or re-sent, with per-delivery tags removed
    pub fn without_tags(&self) -> Data {
        Data {
            tags: PacketTags::default(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.push {
            f.write_str("?push")?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NackReason {
    None,
    Congestion,
    Duplicate,
    NoRoute,
}

impl NackReason {
    fn code(&self) -> u32 {
        match self {
            NackReason::None => 0,
            NackReason::Congestion => 50,
            NackReason::Duplicate => 100,
            NackReason::NoRoute => 150,
        }
    }

    // An unspecified reason is the most severe of all
    pub fn is_less_severe(&self, other: &NackReason) -> bool {
        match (self, other) {
            (NackReason::None, _) => false,
            (_, NackReason::None) => true,
            _ => self.code() < other.code(),
        }
    }
}

impl fmt::Display for NackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NackReason::None => "None",
            NackReason::Congestion => "Congestion",
            NackReason::Duplicate => "Duplicate",
            NackReason::NoRoute => "NoRoute",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nack {
    pub interest: Interest,
    pub reason: NackReason,
    pub tags: PacketTags,
}

impl Nack {
    pub fn new(interest: Interest, reason: NackReason) -> Self {
        Self {
            interest,
            reason,
            tags: PacketTags::default(),
        }
    }

    pub fn nonce(&self) -> Nonce {
        self.interest.nonce
    }
}

impl fmt::Display for Nack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.interest.name, self.reason)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delegation {
    pub preference: u64,
    pub name: Name,
}

/// An ordered set of delegation names an Interest can be forwarded towards
/// when its own name is not routable.
///
/// Delegations are kept sorted by preference, lowest (most preferred) first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Link {
    delegations: Vec<Delegation>,
}

impl Link {
    pub fn new(delegations: impl IntoIterator<Item = (u64, Name)>) -> Self {
        let mut delegations: Vec<_> = delegations
            .into_iter()
            .map(|(preference, name)| Delegation { preference, name })
            .collect();
        delegations.sort_by(|a, b| {
            a.preference
                .cmp(&b.preference)
                .then_with(|| a.name.cmp(&b.name))
        });
        Self { delegations }
    }

    pub fn delegations(&self) -> &[Delegation] {
        &self.delegations
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.delegations.iter().any(|d| &d.name == name)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for d in self.delegations.iter() {
            let mut inner = Vec::new();
            write_nonneg_integer_tlv(&mut inner, TLV_TYPE_PREFERENCE, d.preference);
            d.name.encode(&mut inner);
            write_tlv(&mut out, TLV_TYPE_DELEGATION, &inner);
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Link, Error> {
        let mut delegations = Vec::new();
        for tlv in parse_tlvs(bytes) {
            let tlv = tlv?;
            tlv.expect_type(TLV_TYPE_DELEGATION)?;

            let mut fields = parse_tlvs(tlv.val);
            let preference = fields
                .next()
                .ok_or_else(|| Error::MalformedLink("delegation without preference".into()))??;
            preference.expect_type(TLV_TYPE_PREFERENCE)?;
            let name = fields
                .next()
                .ok_or_else(|| Error::MalformedLink("delegation without name".into()))??;
            name.expect_type(TLV_TYPE_NAME)?;
            if fields.next().is_some() {
                return Err(Error::MalformedLink("trailing delegation field".into()));
            }

            delegations.push((preference.val_as_u64()?, Name::from_tlv_value(name.val)?));
        }
        if delegations.is_empty() {
            return Err(Error::MalformedLink("no delegations".into()));
        }
        Ok(Link::new(delegations))
    }
}

/// A packet as delivered by a face, classified once at the boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    Interest(Interest),
    Data(Data),
    Nack(Nack),
}

impl From<Interest> for Packet {
    fn from(value: Interest) -> Self {
        Packet::Interest(value)
    }
}

impl From<Data> for Packet {
    fn from(value: Data) -> Self {
        Packet::Data(value)
    }
}

impl From<Nack> for Packet {
    fn from(value: Nack) -> Self {
        Packet::Nack(value)
    }
}
