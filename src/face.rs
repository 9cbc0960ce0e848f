use core::fmt;

use thiserror::Error;

use crate::packet::{Data, Interest, Nack};

// The Face abstracts away the underlying transport. The forwarder hands it
//  fully formed packets and never looks at how they travel.

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(pub u32);

impl FaceId {
    pub const INVALID: FaceId = FaceId(0);
    pub const CONTENT_STORE: FaceId = FaceId(254);

    // Ids up to this one are reserved for internal use
    pub const RESERVED_MAX: FaceId = FaceId(255);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FaceId({})", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FaceScope {
    Local,
    NonLocal,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkType {
    PointToPoint,
    MultiAccess,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceError {
    #[error("face disconnected")]
    Disconnected,
}

pub trait Face {
    fn scope(&self) -> FaceScope;
    fn link_type(&self) -> LinkType;
    fn send_interest(&mut self, interest: &Interest) -> Result<(), FaceError>;
    fn send_data(&mut self, data: &Data) -> Result<(), FaceError>;
    fn send_nack(&mut self, nack: &Nack) -> Result<(), FaceError>;
}

/// The faces known to a forwarder, indexed by the id handed out on insertion.
pub struct FaceTable {
    // Ordered by id, new faces always get a higher id
    faces: Vec<(FaceId, Box<dyn Face>)>,
    last_id: u32,
}

impl FaceTable {
    pub fn new() -> Self {
        Self {
            faces: Vec::new(),
            last_id: FaceId::RESERVED_MAX.0,
        }
    }

    pub fn add(&mut self, face: Box<dyn Face>) -> Option<FaceId> {
        let id = FaceId(self.last_id.checked_add(1)?);
        self.last_id = id.0;
        self.faces.push((id, face));
        Some(id)
    }

    pub fn remove(&mut self, id: FaceId) -> Option<Box<dyn Face>> {
        let idx = self.find(id)?;
        Some(self.faces.remove(idx).1)
    }

    pub fn get(&self, id: FaceId) -> Option<&dyn Face> {
        let idx = self.find(id)?;
        Some(self.faces[idx].1.as_ref())
    }

    pub fn get_mut(&mut self, id: FaceId) -> Option<&mut (dyn Face + 'static)> {
        let idx = self.find(id)?;
        Some(self.faces[idx].1.as_mut())
    }

    pub fn contains(&self, id: FaceId) -> bool {
        self.find(id).is_some()
    }

    pub fn scope(&self, id: FaceId) -> Option<FaceScope> {
        self.get(id).map(|f| f.scope())
    }

    pub fn link_type(&self, id: FaceId) -> Option<LinkType> {
        self.get(id).map(|f| f.link_type())
    }

    pub fn ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.iter().map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    fn find(&self, id: FaceId) -> Option<usize> {
        self.faces.binary_search_by_key(&id, |x| x.0).ok()
    }
}

impl Default for FaceTable {
    fn default() -> Self {
        Self::new()
    }
}
