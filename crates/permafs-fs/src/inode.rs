//! Inode numbers for nodes handed to the kernel.
//!
//! Inodes are keyed by the (parent inode, name) the kernel used to reach
//! them, never by the permanode they are bound to. A permanode reached by
//! two paths, or again below itself through a cycle, is a distinct inode at
//! each position. Slots live as long as the kernel holds lookups on them.

use std::collections::HashMap;

use crate::node::Node;

pub const ROOT_INO: u64 = 1;

#[derive(Debug)]
struct Slot {
    node: Node,
    parent: u64,
    name: String,
    nlookup: u64,
}

#[derive(Debug)]
pub struct InodeTable {
    slots: HashMap<u64, Slot>,
    by_name: HashMap<(u64, String), u64>,
    next: u64,
}

impl InodeTable {
    pub fn new(root: Node) -> Self {
        let mut slots = HashMap::new();
        slots.insert(
            ROOT_INO,
            Slot {
                node: root,
                parent: ROOT_INO,
                name: String::new(),
                nlookup: 0,
            },
        );
        Self {
            slots,
            by_name: HashMap::new(),
            next: ROOT_INO + 1,
        }
    }

    pub fn get(&self, ino: u64) -> Option<&Node> {
        self.slots.get(&ino).map(|s| &s.node)
    }

    /// Parent directory of a looked-up inode; the root is its own parent.
    pub fn parent_of(&self, ino: u64) -> Option<u64> {
        self.slots.get(&ino).map(|s| s.parent)
    }

    /// Inode for `name` under `parent`, assigned on first sight.
    ///
    /// Listings use this for names the kernel has not looked up yet, so a
    /// later lookup of the same name reports the same number.
    pub fn ino_for(&mut self, parent: u64, name: &str) -> u64 {
        let key = (parent, name.to_string());
        if let Some(&ino) = self.by_name.get(&key) {
            return ino;
        }
        let ino = self.next;
        self.next += 1;
        self.by_name.insert(key, ino);
        ino
    }

    /// Record one kernel lookup of `name` under `parent` and return its inode.
    ///
    /// The stored node is replaced by the fresh one.
    pub fn remember(&mut self, parent: u64, name: &str, node: Node) -> u64 {
        let ino = self.ino_for(parent, name);
        match self.slots.get_mut(&ino) {
            Some(slot) => {
                slot.node = node;
                slot.nlookup += 1;
            }
            None => {
                self.slots.insert(
                    ino,
                    Slot {
                        node,
                        parent,
                        name: name.to_string(),
                        nlookup: 1,
                    },
                );
            }
        }
        ino
    }

    /// Drop `nlookup` kernel references; the slot goes away at zero, along
    /// with numbers handed out for its listed but never looked-up children.
    pub fn forget(&mut self, ino: u64, nlookup: u64) {
        if ino == ROOT_INO {
            return;
        }
        let Some(slot) = self.slots.get_mut(&ino) else {
            return;
        };
        slot.nlookup = slot.nlookup.saturating_sub(nlookup);
        if slot.nlookup > 0 {
            return;
        }
        if let Some(slot) = self.slots.remove(&ino) {
            self.by_name.remove(&(slot.parent, slot.name));
        }
        let slots = &self.slots;
        self.by_name
            .retain(|(parent, _), child| *parent != ino || slots.contains_key(child));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::PermaFs;
    use permafs_blobref::BlobRef;
    use permafs_search::MemoryIndex;
    use std::sync::Arc;

    fn setup() -> (Node, InodeTable) {
        let fs = PermaFs::new(Arc::new(MemoryIndex::new()));
        let root = fs.root();
        (root.clone(), InodeTable::new(root))
    }

    fn name(seed: &str) -> String {
        BlobRef::for_content(seed.as_bytes()).to_string()
    }

    fn look(table: &mut InodeTable, parent: u64, name: &str) -> u64 {
        let child = table.get(parent).unwrap().lookup(name).unwrap();
        table.remember(parent, name, child)
    }

    #[test]
    fn test_root_is_ino_one() {
        let (_, table) = setup();
        assert!(matches!(table.get(ROOT_INO), Some(Node::Roots(_))));
        assert_eq!(table.parent_of(ROOT_INO), Some(ROOT_INO));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_repeat_lookup_same_ino() {
        let (_, mut table) = setup();
        let a = name("a");
        let a1 = look(&mut table, ROOT_INO, &a);
        let a2 = look(&mut table, ROOT_INO, &a);
        assert_eq!(a1, a2);
        assert_ne!(a1, ROOT_INO);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_cycle_gets_fresh_inode_at_each_depth() {
        let (_, mut table) = setup();
        let (a, b) = (name("a"), name("b"));

        let ino_a = look(&mut table, ROOT_INO, &a);
        let ino_ab = look(&mut table, ino_a, &b);
        let ino_aba = look(&mut table, ino_ab, &a);

        assert_ne!(ino_aba, ino_a);
        assert_ne!(ino_aba, ino_ab);
        assert_eq!(table.parent_of(ino_aba), Some(ino_ab));
        assert_eq!(table.get(ino_aba).unwrap().blob_ref(), table.get(ino_a).unwrap().blob_ref());
    }

    #[test]
    fn test_shared_subtree_distinct_per_parent() {
        let (_, mut table) = setup();
        let shared = name("shared");
        let ino_x = look(&mut table, ROOT_INO, &name("x"));
        let ino_y = look(&mut table, ROOT_INO, &name("y"));

        let via_x = look(&mut table, ino_x, &shared);
        let via_y = look(&mut table, ino_y, &shared);
        assert_ne!(via_x, via_y);
        assert_eq!(table.parent_of(via_x), Some(ino_x));
        assert_eq!(table.parent_of(via_y), Some(ino_y));
    }

    #[test]
    fn test_listed_ino_matches_later_lookup() {
        let (_, mut table) = setup();
        let a = name("a");
        let listed = table.ino_for(ROOT_INO, &a);
        assert_eq!(table.ino_for(ROOT_INO, "not-a-blobref"), listed + 1);
        assert!(table.get(listed).is_none());

        assert_eq!(look(&mut table, ROOT_INO, &a), listed);
        assert!(table.get(listed).is_some());
    }

    #[test]
    fn test_forget_releases_slot() {
        let (_, mut table) = setup();
        let a = name("a");
        let ino = look(&mut table, ROOT_INO, &a);
        look(&mut table, ROOT_INO, &a);

        table.forget(ino, 1);
        assert!(table.get(ino).is_some());
        table.forget(ino, 1);
        assert!(table.get(ino).is_none());

        // A later lookup gets a new inode
        let again = look(&mut table, ROOT_INO, &a);
        assert_ne!(again, ino);
    }

    #[test]
    fn test_forget_drops_unvisited_children() {
        let (_, mut table) = setup();
        let dir = look(&mut table, ROOT_INO, &name("d"));
        let visited = look(&mut table, dir, &name("v"));
        let listed = table.ino_for(dir, "label");

        table.forget(dir, 1);
        // Still held by the kernel, so its number stays
        assert_eq!(table.ino_for(dir, &name("v")), visited);
        assert_ne!(table.ino_for(dir, "label"), listed);
    }

    #[test]
    fn test_forget_root_is_ignored() {
        let (_, mut table) = setup();
        table.forget(ROOT_INO, 10);
        assert!(table.get(ROOT_INO).is_some());
        assert!(!table.is_empty());
    }
}
