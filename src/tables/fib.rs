use core::cmp::Ordering;

use crate::{
    face::FaceId,
    name::{Name, NameComponent},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct NextHop {
    pub cost: u32,
    pub face: FaceId,
}

/// The result of a FIB lookup: the matched prefix and its next hops,
/// cheapest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FibEntry {
    prefix: Name,
    next_hops: Vec<NextHop>,
}

impl FibEntry {
    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    pub fn next_hops(&self) -> &[NextHop] {
        &self.next_hops
    }

    pub fn has_next_hops(&self) -> bool {
        !self.next_hops.is_empty()
    }

    pub fn has_next_hop(&self, face: FaceId) -> bool {
        self.next_hops.iter().any(|h| h.face == face)
    }
}

struct TableEntry {
    // Ordered by cost
    next_hops: Vec<NextHop>,
    // Ordered by component
    children: Vec<(NameComponent, TableEntry)>,
}

impl TableEntry {
    fn new() -> Self {
        Self {
            next_hops: Vec::new(),
            children: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.next_hops.is_empty() && self.children.is_empty()
    }

    fn find_child(&self, component: &NameComponent) -> Result<usize, usize> {
        self.children
            .binary_search_by(|x| compare_components(&x.0, component))
    }

    fn get_child(&self, component: &NameComponent) -> Option<&TableEntry> {
        let idx = self.find_child(component).ok()?;
        Some(&self.children[idx].1)
    }

    fn get_or_insert_child(&mut self, component: &NameComponent) -> &mut TableEntry {
        let idx = match self.find_child(component) {
            Ok(idx) => idx,
            Err(idx) => {
                self.children
                    .insert(idx, (component.clone(), TableEntry::new()));
                idx
            }
        };
        &mut self.children[idx].1
    }

    fn add_next_hop(&mut self, face: FaceId, cost: u32) -> bool {
        let is_new = match self.next_hops.iter().position(|h| h.face == face) {
            Some(index) => {
                self.next_hops[index].cost = cost;
                false
            }
            None => {
                self.next_hops.push(NextHop { cost, face });
                true
            }
        };
        self.next_hops.sort();
        is_new
    }

    fn remove_next_hop(&mut self, components: &[NameComponent], face: FaceId) -> bool {
        match components.split_first() {
            Some((first, rest)) => {
                let idx = match self.find_child(first) {
                    Ok(idx) => idx,
                    Err(_) => return false,
                };
                let removed = self.children[idx].1.remove_next_hop(rest, face);
                if self.children[idx].1.is_empty() {
                    self.children.remove(idx);
                }
                removed
            }
            None => {
                let before = self.next_hops.len();
                self.next_hops.retain(|h| h.face != face);
                self.next_hops.len() != before
            }
        }
    }

    // Returns how many prefixes lost their last next hop
    fn remove_face(&mut self, face: FaceId) -> usize {
        let had_hops = !self.next_hops.is_empty();
        self.next_hops.retain(|h| h.face != face);
        let mut emptied = (had_hops && self.next_hops.is_empty()) as usize;
        for child in self.children.iter_mut() {
            emptied += child.1.remove_face(face);
        }
        self.children.retain(|c| !c.1.is_empty());
        emptied
    }
}

fn compare_components(a: &NameComponent, b: &NameComponent) -> Ordering {
    if a.typ == b.typ {
        return a.bytes.as_ref().cmp(b.bytes.as_ref());
    }
    a.typ.cmp(&b.typ)
}

/// The Forwarding Information Base: name prefixes mapped to next hops.
pub struct Fib {
    root: TableEntry,
    // Prefixes with at least one next hop
    len: usize,
}

impl Fib {
    pub fn new() -> Self {
        Self {
            root: TableEntry::new(),
            len: 0,
        }
    }

    // Interests under `prefix` will be forwarded to `face`. Call again to update the cost.
    pub fn add_or_update_next_hop(&mut self, prefix: &Name, face: FaceId, cost: u32) {
        let mut node = &mut self.root;
        for component in prefix.components() {
            node = node.get_or_insert_child(component);
        }
        let was_empty = node.next_hops.is_empty();
        if node.add_next_hop(face, cost) && was_empty {
            self.len += 1;
        }
    }

    pub fn remove_next_hop(&mut self, prefix: &Name, face: FaceId) -> bool {
        let removed = self.root.remove_next_hop(prefix.components(), face);
        if removed && self.find_exact(prefix).is_none() {
            self.len -= 1;
        }
        removed
    }

    pub fn remove_face(&mut self, face: FaceId) {
        self.len -= self.root.remove_face(face);
    }

    /// The deepest prefix of `name` that has next hops.
    ///
    /// When no prefix has any, the result is the root entry (empty prefix)
    /// without next hops.
    pub fn find_longest_prefix_match(&self, name: &Name) -> FibEntry {
        let mut node = &self.root;
        let mut best = (0, &self.root.next_hops);
        for (depth, component) in name.components().iter().enumerate() {
            node = match node.get_child(component) {
                Some(child) => child,
                None => break,
            };
            if !node.next_hops.is_empty() {
                best = (depth + 1, &node.next_hops);
            }
        }
        FibEntry {
            prefix: name.prefix(best.0),
            next_hops: best.1.clone(),
        }
    }

    pub fn find_exact(&self, prefix: &Name) -> Option<FibEntry> {
        let mut node = &self.root;
        for component in prefix.components() {
            node = node.get_child(component)?;
        }
        if node.next_hops.is_empty() {
            return None;
        }
        Some(FibEntry {
            prefix: prefix.clone(),
            next_hops: node.next_hops.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Fib {
    fn default() -> Self {
        Self::new()
    }
}
