//! Arena-backed item tree
//!
//! Every item lives in a single map keyed by [`ItemId`]. A container owns its
//! children through its child map; the `parent` field is only a navigational
//! back-reference. Moving a subtree re-links one entry and keeps every id in
//! the subtree valid.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::error::{FsError, FsResult};
use crate::names::{ItemNameComparer, UserName, UserNameSet};
use crate::path;
use crate::types::{ItemId, ItemKind};

static NO_LOCKS: UserNameSet = UserNameSet::new();

/// Kind-specific node payload
#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    Root { children: BTreeMap<String, ItemId> },
    Volume { children: BTreeMap<String, ItemId> },
    Directory { children: BTreeMap<String, ItemId> },
    File { locked_by: UserNameSet },
}

/// Tree node
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub name: String,
    pub parent: Option<ItemId>,
    pub kind: NodeKind,
}

impl Node {
    fn item_kind(&self) -> ItemKind {
        match self.kind {
            NodeKind::Root { .. } => ItemKind::Root,
            NodeKind::Volume { .. } => ItemKind::Volume,
            NodeKind::Directory { .. } => ItemKind::Directory,
            NodeKind::File { .. } => ItemKind::File,
        }
    }

    fn children(&self) -> Option<&BTreeMap<String, ItemId>> {
        match &self.kind {
            NodeKind::Root { children }
            | NodeKind::Volume { children }
            | NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut BTreeMap<String, ItemId>> {
        match &mut self.kind {
            NodeKind::Root { children }
            | NodeKind::Volume { children }
            | NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }
}

/// The in-memory file system tree
#[derive(Clone, Debug)]
pub struct FileSystemTree {
    nodes: HashMap<ItemId, Node>,
    root: ItemId,
    next_id: u64,
}

impl Default for FileSystemTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemTree {
    /// Creates a tree holding only the root item.
    pub fn new() -> Self {
        let root = ItemId(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                name: String::new(),
                parent: None,
                kind: NodeKind::Root {
                    children: BTreeMap::new(),
                },
            },
        );
        Self {
            nodes,
            root,
            next_id: 2,
        }
    }

    fn allocate_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    fn node(&self, id: ItemId) -> FsResult<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| FsError::invalid_argument(format!("unknown item {}", id.0)))
    }

    fn node_mut(&mut self, id: ItemId) -> FsResult<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| FsError::invalid_argument(format!("unknown item {}", id.0)))
    }

    pub fn root(&self) -> ItemId {
        self.root
    }

    /// Number of items stored, including the root and detached subtrees.
    pub fn item_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn kind(&self, id: ItemId) -> FsResult<ItemKind> {
        Ok(self.node(id)?.item_kind())
    }

    pub fn name(&self, id: ItemId) -> FsResult<&str> {
        Ok(&self.node(id)?.name)
    }

    pub fn parent(&self, id: ItemId) -> FsResult<Option<ItemId>> {
        Ok(self.node(id)?.parent)
    }

    /// Children of `id` in case-insensitive name order; empty for files.
    pub fn children(&self, id: ItemId) -> FsResult<Vec<ItemId>> {
        Ok(self
            .node(id)?
            .children()
            .map(|children| children.values().copied().collect())
            .unwrap_or_default())
    }

    /// Finds the child whose name matches `name` ignoring case.
    pub fn find_child(&self, id: ItemId, name: &str) -> FsResult<Option<ItemId>> {
        Ok(self
            .node(id)?
            .children()
            .and_then(|children| children.get(&ItemNameComparer::key(name)).copied()))
    }

    /// Lock holders of a file; always empty for other kinds.
    pub fn locked_by(&self, id: ItemId) -> FsResult<&UserNameSet> {
        match &self.node(id)?.kind {
            NodeKind::File { locked_by } => Ok(locked_by),
            _ => Ok(&NO_LOCKS),
        }
    }

    pub fn is_locked(&self, id: ItemId) -> FsResult<bool> {
        Ok(!self.locked_by(id)?.is_empty())
    }

    /// Depth from the root (root = 0).
    pub fn level(&self, id: ItemId) -> FsResult<usize> {
        let mut level = 0;
        let mut current = self.node(id)?.parent;
        while let Some(parent) = current {
            level += 1;
            current = self.node(parent)?.parent;
        }
        Ok(level)
    }

    /// Whether `ancestor` appears on the parent chain of `item` (strictly above it).
    pub fn is_ancestor_of(&self, ancestor: ItemId, item: ItemId) -> FsResult<bool> {
        let mut current = self.node(item)?.parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return Ok(true);
            }
            current = self.node(parent)?.parent;
        }
        Ok(false)
    }

    /// Absolute path of an attached item, e.g. `/C:/docs/a.txt`.
    pub fn path_of(&self, id: ItemId) -> FsResult<String> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(item) = current {
            let node = self.node(item)?;
            if node.parent.is_some() {
                segments.push(node.name.as_str());
            }
            current = node.parent;
        }
        segments.reverse();
        Ok(format!("{}{}", path::SEPARATOR, segments.join("/")))
    }

    /// Depth-first scan for a locked file at or below `id`.
    pub fn has_locks(&self, id: ItemId) -> FsResult<bool> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            match &node.kind {
                NodeKind::File { locked_by } => {
                    if !locked_by.is_empty() {
                        return Ok(true);
                    }
                }
                _ => {
                    if let Some(children) = node.children() {
                        stack.extend(children.values().copied());
                    }
                }
            }
        }
        Ok(false)
    }

    fn check_free_name(&self, parent: ItemId, name: &str) -> FsResult<()> {
        if self.find_child(parent, name)?.is_some() {
            return Err(FsError::name_conflict(name));
        }
        Ok(())
    }

    fn attach(&mut self, parent: ItemId, child: ItemId) -> FsResult<()> {
        let key = ItemNameComparer::key(self.name(child)?);
        let parent_node = self.node_mut(parent)?;
        let found = parent_node.item_kind();
        let children = parent_node
            .children_mut()
            .ok_or_else(|| FsError::wrong_kind(format!("item {}", parent.0), "a container", found))?;
        children.insert(key, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn insert_child(&mut self, parent: ItemId, name: &str, kind: NodeKind) -> FsResult<ItemId> {
        let parent_kind = self.kind(parent)?;
        let allowed = match kind {
            NodeKind::Volume { .. } => parent_kind == ItemKind::Root,
            _ => parent_kind.is_container(),
        };
        if !allowed {
            return Err(FsError::wrong_kind(
                self.path_of(parent)?,
                if parent_kind == ItemKind::Root {
                    "a volume or a directory"
                } else {
                    "a container"
                },
                parent_kind,
            ));
        }
        self.check_free_name(parent, name)?;

        let id = self.allocate_id();
        self.nodes.insert(
            id,
            Node {
                name: name.to_string(),
                parent: None,
                kind,
            },
        );
        self.attach(parent, id)?;
        trace!(parent = parent.0, child = id.0, name, "attached new item");
        Ok(id)
    }

    /// Provisions a volume under the root.
    pub fn add_child_volume(&mut self, name: &str) -> FsResult<ItemId> {
        let canonical = path::VALID_VOLUME_NAMES
            .iter()
            .find(|volume| ItemNameComparer::key(volume) == ItemNameComparer::key(name))
            .ok_or_else(|| FsError::invalid_argument(format!("'{name}' is not a valid volume name")))?;
        let root = self.root;
        self.insert_child(
            root,
            canonical,
            NodeKind::Volume {
                children: BTreeMap::new(),
            },
        )
    }

    pub fn add_child_directory(&mut self, parent: ItemId, name: &str) -> FsResult<ItemId> {
        if !path::is_valid_item_name(name) {
            return Err(FsError::invalid_argument(format!("'{name}' is not a valid directory name")));
        }
        self.insert_child(
            parent,
            name,
            NodeKind::Directory {
                children: BTreeMap::new(),
            },
        )
    }

    pub fn add_child_file(&mut self, parent: ItemId, name: &str) -> FsResult<ItemId> {
        if !path::is_valid_item_name(name) {
            return Err(FsError::invalid_argument(format!("'{name}' is not a valid file name")));
        }
        self.insert_child(
            parent,
            name,
            NodeKind::File {
                locked_by: UserNameSet::new(),
            },
        )
    }

    /// Attaches a detached directory or file (and its subtree) under `parent`.
    pub fn add_child(&mut self, parent: ItemId, item: ItemId) -> FsResult<()> {
        let node = self.node(item)?;
        let kind = node.item_kind();
        if !kind.is_movable() {
            return Err(FsError::wrong_kind(format!("item {}", item.0), "a directory or a file", kind));
        }
        if node.parent.is_some() {
            return Err(FsError::invalid_argument(format!("item {} is still attached", item.0)));
        }
        let parent_kind = self.kind(parent)?;
        if !parent_kind.is_container() {
            return Err(FsError::wrong_kind(self.path_of(parent)?, "a volume or a directory", parent_kind));
        }
        if parent == item || self.is_ancestor_of(item, parent)? {
            return Err(FsError::invalid_relocation("an item cannot contain itself"));
        }
        let name = self.node(item)?.name.clone();
        self.check_free_name(parent, &name)?;
        self.attach(parent, item)
    }

    /// Detaches `item` from `parent` without discarding it.
    ///
    /// The subtree stays in the arena, addressable by its ids, until it is
    /// attached again with [`FileSystemTree::add_child`].
    pub fn remove_child(&mut self, parent: ItemId, item: ItemId) -> FsResult<()> {
        let name = self.node(item)?.name.clone();
        if self.find_child(parent, &name)? != Some(item) {
            return Err(FsError::path_not_found(format!(
                "{}/{}",
                self.path_of(parent)?,
                name
            )));
        }
        if let Some(children) = self.node_mut(parent)?.children_mut() {
            children.remove(&ItemNameComparer::key(&name));
        }
        self.node_mut(item)?.parent = None;
        Ok(())
    }

    fn child_of_kind(&self, parent: ItemId, name: &str, kind: ItemKind) -> FsResult<ItemId> {
        let child = self.find_child(parent, name)?.ok_or_else(|| {
            FsError::path_not_found(path::combine_path(
                &self.path_of(parent).unwrap_or_default(),
                name,
            ))
        })?;
        let found = self.kind(child)?;
        if found != kind {
            let expected = match kind {
                ItemKind::Directory => "a directory",
                _ => "a file",
            };
            return Err(FsError::wrong_kind(self.path_of(child)?, expected, found));
        }
        Ok(child)
    }

    /// Removes an empty child directory.
    pub fn remove_child_directory(&mut self, parent: ItemId, name: &str) -> FsResult<()> {
        let child = self.child_of_kind(parent, name, ItemKind::Directory)?;
        if !self.children(child)?.is_empty() {
            return Err(FsError::not_empty(self.path_of(child)?));
        }
        self.remove_child(parent, child)?;
        self.discard(child);
        Ok(())
    }

    /// Removes a child directory and everything below it.
    ///
    /// Locks are not consulted here.
    pub fn remove_child_directory_with_tree(&mut self, parent: ItemId, name: &str) -> FsResult<()> {
        let child = self.child_of_kind(parent, name, ItemKind::Directory)?;
        self.remove_child(parent, child)?;
        self.discard(child);
        Ok(())
    }

    pub fn remove_child_file(&mut self, parent: ItemId, name: &str) -> FsResult<()> {
        let child = self.child_of_kind(parent, name, ItemKind::File)?;
        self.remove_child(parent, child)?;
        self.discard(child);
        Ok(())
    }

    fn discard(&mut self, id: ItemId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                if let Some(children) = node.children() {
                    stack.extend(children.values().copied());
                }
            }
        }
    }

    fn file_locks_mut(&mut self, id: ItemId) -> FsResult<&mut UserNameSet> {
        let node = self.node_mut(id)?;
        let found = node.item_kind();
        match &mut node.kind {
            NodeKind::File { locked_by } => Ok(locked_by),
            _ => Err(FsError::wrong_kind(format!("item {}", id.0), "a file", found)),
        }
    }

    /// Adds `user` to the holders of a file lock. Returns false if already held.
    pub fn lock(&mut self, id: ItemId, user: &UserName) -> FsResult<bool> {
        Ok(self.file_locks_mut(id)?.insert(user.clone()))
    }

    /// Removes `user` from the holders of a file lock. Returns false if not held.
    pub fn unlock(&mut self, id: ItemId, user: &UserName) -> FsResult<bool> {
        Ok(self.file_locks_mut(id)?.remove(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserName {
        UserName::new(name).unwrap()
    }

    fn tree_with_volume() -> (FileSystemTree, ItemId) {
        let mut tree = FileSystemTree::new();
        let volume = tree.add_child_volume("c:").unwrap();
        (tree, volume)
    }

    #[test]
    fn test_volume_provisioning() {
        let (mut tree, volume) = tree_with_volume();
        assert_eq!(tree.name(volume).unwrap(), "C:");
        assert_eq!(tree.kind(volume).unwrap(), ItemKind::Volume);
        assert!(matches!(tree.add_child_volume("C:"), Err(FsError::NameConflict { .. })));
        assert!(matches!(tree.add_child_volume("Q:"), Err(FsError::InvalidArgument { .. })));
    }

    #[test]
    fn test_sibling_names_are_case_insensitive() {
        let (mut tree, volume) = tree_with_volume();
        tree.add_child_directory(volume, "Docs").unwrap();
        assert!(matches!(
            tree.add_child_directory(volume, "DOCS"),
            Err(FsError::NameConflict { .. })
        ));
        assert!(matches!(
            tree.add_child_file(volume, "docs"),
            Err(FsError::NameConflict { .. })
        ));
    }

    #[test]
    fn test_kind_rules() {
        let (mut tree, volume) = tree_with_volume();
        let root = tree.root();
        let file = tree.add_child_file(volume, "a.txt").unwrap();

        assert!(matches!(tree.add_child_directory(root, "x"), Err(FsError::WrongKind { .. })));
        assert!(matches!(tree.add_child_file(file, "x"), Err(FsError::WrongKind { .. })));
        assert!(matches!(tree.lock(volume, &user("alice")), Err(FsError::WrongKind { .. })));
        assert!(matches!(
            tree.add_child_directory(volume, "bad/name"),
            Err(FsError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_level_and_path() {
        let (mut tree, volume) = tree_with_volume();
        let docs = tree.add_child_directory(volume, "docs").unwrap();
        let file = tree.add_child_file(docs, "a.txt").unwrap();

        assert_eq!(tree.level(tree.root()).unwrap(), 0);
        assert_eq!(tree.level(volume).unwrap(), 1);
        assert_eq!(tree.level(file).unwrap(), 3);
        assert_eq!(tree.path_of(file).unwrap(), "/C:/docs/a.txt");
        assert!(tree.is_ancestor_of(volume, file).unwrap());
        assert!(!tree.is_ancestor_of(file, volume).unwrap());
        assert!(!tree.is_ancestor_of(docs, docs).unwrap());
    }

    #[test]
    fn test_remove_child_directory_requires_empty() {
        let (mut tree, volume) = tree_with_volume();
        let docs = tree.add_child_directory(volume, "docs").unwrap();
        tree.add_child_file(docs, "a.txt").unwrap();

        assert!(matches!(
            tree.remove_child_directory(volume, "docs"),
            Err(FsError::NotEmpty { .. })
        ));
        tree.remove_child_file(docs, "A.TXT").unwrap();
        tree.remove_child_directory(volume, "Docs").unwrap();
        assert!(tree.find_child(volume, "docs").unwrap().is_none());
        assert!(!tree.contains(docs));
    }

    #[test]
    fn test_remove_with_tree_discards_descendants() {
        let (mut tree, volume) = tree_with_volume();
        let docs = tree.add_child_directory(volume, "docs").unwrap();
        let reports = tree.add_child_directory(docs, "reports").unwrap();
        let file = tree.add_child_file(reports, "q1.txt").unwrap();
        let before = tree.item_count();

        tree.remove_child_directory_with_tree(volume, "docs").unwrap();
        assert_eq!(tree.item_count(), before - 3);
        assert!(!tree.contains(file));
        assert!(matches!(
            tree.remove_child_directory_with_tree(volume, "docs"),
            Err(FsError::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_multi_holder_locks() {
        let (mut tree, volume) = tree_with_volume();
        let docs = tree.add_child_directory(volume, "docs").unwrap();
        let file = tree.add_child_file(docs, "a.txt").unwrap();

        assert!(!tree.has_locks(docs).unwrap());
        assert!(tree.lock(file, &user("alice")).unwrap());
        assert!(tree.lock(file, &user("bob")).unwrap());
        assert!(!tree.lock(file, &user("ALICE")).unwrap());
        assert!(tree.has_locks(volume).unwrap());

        assert!(!tree.unlock(file, &user("carol")).unwrap());
        assert_eq!(tree.locked_by(file).unwrap().len(), 2);
        assert!(tree.unlock(file, &user("Alice")).unwrap());
        assert!(tree.is_locked(file).unwrap());
        assert!(tree.unlock(file, &user("bob")).unwrap());
        assert!(!tree.has_locks(volume).unwrap());
        assert!(tree.locked_by(volume).unwrap().is_empty());
    }

    #[test]
    fn test_detach_and_reattach_keeps_ids() {
        let (mut tree, volume) = tree_with_volume();
        let docs = tree.add_child_directory(volume, "docs").unwrap();
        let backup = tree.add_child_directory(volume, "backup").unwrap();
        let file = tree.add_child_file(docs, "a.txt").unwrap();

        tree.remove_child(volume, docs).unwrap();
        assert_eq!(tree.parent(docs).unwrap(), None);
        tree.add_child(backup, docs).unwrap();

        assert_eq!(tree.parent(docs).unwrap(), Some(backup));
        assert_eq!(tree.path_of(file).unwrap(), "/C:/backup/docs/a.txt");
    }

    #[test]
    fn test_add_child_rejects_cycles_and_attached_items() {
        let (mut tree, volume) = tree_with_volume();
        let docs = tree.add_child_directory(volume, "docs").unwrap();
        let reports = tree.add_child_directory(docs, "reports").unwrap();

        assert!(matches!(tree.add_child(volume, reports), Err(FsError::InvalidArgument { .. })));

        tree.remove_child(volume, docs).unwrap();
        assert!(matches!(
            tree.add_child(reports, docs),
            Err(FsError::InvalidRelocation { .. })
        ));
        assert!(matches!(tree.add_child(volume, volume), Err(FsError::WrongKind { .. })));
    }

    #[test]
    fn test_failed_attach_can_return_to_previous_parent() {
        let (mut tree, volume) = tree_with_volume();
        let docs = tree.add_child_directory(volume, "docs").unwrap();
        let reports = tree.add_child_directory(docs, "reports").unwrap();

        tree.remove_child(volume, docs).unwrap();
        assert!(tree.add_child(reports, docs).is_err());
        tree.add_child(volume, docs).unwrap();

        assert_eq!(tree.path_of(reports).unwrap(), "/C:/docs/reports");
        assert_eq!(tree.find_child(volume, "DOCS").unwrap(), Some(docs));
    }
}
