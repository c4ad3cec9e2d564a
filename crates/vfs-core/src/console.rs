//! Path-addressed command console over a [`FileSystemTree`]
//!
//! Each command resolves its path arguments against the tree, checks every
//! precondition, and only then mutates. A failed command leaves the tree
//! untouched.

use std::cmp::Ordering;

use tracing::debug;

use crate::config::FsConfig;
use crate::error::{FsError, FsResult};
use crate::names::{ItemNameComparer, NameComparer, UserName};
use crate::path;
use crate::tree::FileSystemTree;
use crate::types::{ItemId, ItemKind};

const CONTAINER: &str = "a volume or a directory";

/// The command surface of the file system
#[derive(Clone, Debug)]
pub struct FileSystemConsole {
    tree: FileSystemTree,
    root: ItemId,
}

impl FileSystemConsole {
    /// Wraps `tree`; `root` must be the tree's root item.
    pub fn new(tree: FileSystemTree, root: ItemId) -> FsResult<Self> {
        let kind = tree.kind(root)?;
        if kind != ItemKind::Root {
            return Err(FsError::invalid_argument(format!(
                "console requires a root item, got a {kind}"
            )));
        }
        Ok(Self { tree, root })
    }

    /// Builds a tree holding the configured volumes.
    pub fn from_config(config: &FsConfig) -> FsResult<Self> {
        config.validate()?;
        let mut tree = FileSystemTree::new();
        for volume in &config.volumes {
            tree.add_child_volume(volume)?;
        }
        let root = tree.root();
        Self::new(tree, root)
    }

    pub fn tree(&self) -> &FileSystemTree {
        &self.tree
    }

    fn normalize_current_directory(current_directory: &str) -> &str {
        let trimmed = current_directory.trim();
        if trimmed.is_empty() {
            path::default_volume()
        } else {
            trimmed
        }
    }

    fn absolute_path(current_directory: &str, target: &str) -> String {
        if path::is_absolute_path(target) {
            target.trim().to_string()
        } else {
            path::combine_path(Self::normalize_current_directory(current_directory), target)
        }
    }

    fn walk(&self, full_path: &str, segments: &[&str]) -> FsResult<ItemId> {
        let mut current = self.root;
        for segment in segments {
            current = self
                .tree
                .find_child(current, segment)?
                .ok_or_else(|| FsError::path_not_found(full_path))?;
        }
        Ok(current)
    }

    /// Resolves every segment of `target`.
    fn resolve_item(&self, current_directory: &str, target: &str) -> FsResult<(String, ItemId)> {
        let full_path = Self::absolute_path(current_directory, target);
        let item = {
            let segments = path::split_path(&full_path)?;
            self.walk(&full_path, &segments)?
        };
        Ok((full_path, item))
    }

    /// Resolves all but the last segment of `target`, returning that last name.
    fn resolve_parent(
        &self,
        current_directory: &str,
        target: &str,
    ) -> FsResult<(String, ItemId, String)> {
        let full_path = Self::absolute_path(current_directory, target);
        let (parent, name) = {
            let segments = path::split_path(&full_path)?;
            let (last, init) = segments
                .split_last()
                .ok_or_else(|| FsError::invalid_argument("empty path"))?;
            (self.walk(&full_path, init)?, last.to_string())
        };
        Ok((full_path, parent, name))
    }

    fn require_kind(
        &self,
        item: ItemId,
        display_path: &str,
        expected: &'static str,
        accept: impl Fn(ItemKind) -> bool,
    ) -> FsResult<ItemKind> {
        let kind = self.tree.kind(item)?;
        if !accept(kind) {
            return Err(FsError::wrong_kind(display_path, expected, kind));
        }
        Ok(kind)
    }

    fn parent_of(&self, item: ItemId) -> FsResult<ItemId> {
        self.tree
            .parent(item)?
            .ok_or_else(|| FsError::invalid_argument("item has no parent"))
    }

    pub fn make_directory(&mut self, current_directory: &str, directory: &str) -> FsResult<String> {
        let (full_path, parent, name) = self.resolve_parent(current_directory, directory)?;
        let parent_path = self.tree.path_of(parent)?;
        self.require_kind(parent, &parent_path, CONTAINER, |k| k.is_container())?;

        self.tree.add_child_directory(parent, &name)?;
        debug!(path = %full_path, "made directory");
        Ok(full_path)
    }

    pub fn change_directory(&self, current_directory: &str, directory: &str) -> FsResult<String> {
        let (full_path, item) = self.resolve_item(current_directory, directory)?;
        self.require_kind(item, &full_path, CONTAINER, |k| k.is_container())?;
        Ok(full_path)
    }

    pub fn remove_directory(&mut self, current_directory: &str, directory: &str) -> FsResult<String> {
        let (full_path, item) = self.resolve_item(current_directory, directory)?;
        self.require_kind(item, &full_path, "a directory", |k| k == ItemKind::Directory)?;

        let parent = self.parent_of(item)?;
        let name = self.tree.name(item)?.to_string();
        self.tree.remove_child_directory(parent, &name)?;
        debug!(path = %full_path, "removed directory");
        Ok(full_path)
    }

    pub fn delete_tree(&mut self, current_directory: &str, directory: &str) -> FsResult<String> {
        let (full_path, item) = self.resolve_item(current_directory, directory)?;
        self.require_kind(item, &full_path, "a directory", |k| k == ItemKind::Directory)?;

        if self.tree.has_locks(item)? {
            return Err(FsError::locked(format!(
                "directory '{full_path}' or its subdirectories contain one or more locked files"
            )));
        }

        let parent = self.parent_of(item)?;
        let name = self.tree.name(item)?.to_string();
        self.tree.remove_child_directory_with_tree(parent, &name)?;
        debug!(path = %full_path, "deleted tree");
        Ok(full_path)
    }

    pub fn make_file(&mut self, current_directory: &str, file_name: &str) -> FsResult<String> {
        let (full_path, parent, name) = self.resolve_parent(current_directory, file_name)?;
        let parent_path = self.tree.path_of(parent)?;
        self.require_kind(parent, &parent_path, CONTAINER, |k| k.is_container())?;

        self.tree.add_child_file(parent, &name)?;
        debug!(path = %full_path, "made file");
        Ok(full_path)
    }

    /// Removes a file. Locks held on it do not prevent the removal.
    pub fn delete_file(&mut self, current_directory: &str, file_name: &str) -> FsResult<String> {
        let (full_path, item) = self.resolve_item(current_directory, file_name)?;
        self.require_kind(item, &full_path, "a file", |k| k == ItemKind::File)?;

        let parent = self.parent_of(item)?;
        let name = self.tree.name(item)?.to_string();
        self.tree.remove_child_file(parent, &name)?;
        debug!(path = %full_path, "deleted file");
        Ok(full_path)
    }

    pub fn lock_file(
        &mut self,
        user_name: &str,
        current_directory: &str,
        file_name: &str,
    ) -> FsResult<String> {
        let user = UserName::new(user_name)?;
        let (full_path, item) = self.resolve_item(current_directory, file_name)?;
        self.require_kind(item, &full_path, "a file", |k| k == ItemKind::File)?;

        if !self.tree.lock(item, &user)? {
            debug!(path = %full_path, user = %user, "lock already held");
        }
        Ok(full_path)
    }

    /// Releases `user_name`'s hold on a file. Releasing a lock the user does
    /// not hold succeeds and leaves other holders untouched.
    pub fn unlock_file(
        &mut self,
        user_name: &str,
        current_directory: &str,
        file_name: &str,
    ) -> FsResult<String> {
        let user = UserName::new(user_name)?;
        let (full_path, item) = self.resolve_item(current_directory, file_name)?;
        self.require_kind(item, &full_path, "a file", |k| k == ItemKind::File)?;

        if !self.tree.unlock(item, &user)? {
            debug!(path = %full_path, user = %user, "lock was not held");
        }
        Ok(full_path)
    }

    fn check_relocation(
        &self,
        current_directory: &str,
        source_path: &str,
        dest_path: &str,
    ) -> FsResult<(ItemId, ItemId)> {
        let (source_path, source) = self.resolve_item(current_directory, source_path)?;
        let source_kind =
            self.require_kind(source, &source_path, "a directory or a file", |k| k.is_movable())?;

        if source_kind == ItemKind::File && self.tree.is_locked(source)? {
            return Err(FsError::locked(format!("file '{source_path}' is locked")));
        }

        let (dest_path, dest) = self.resolve_item(current_directory, dest_path)?;
        self.require_kind(dest, &dest_path, CONTAINER, |k| k.is_container())?;

        if source == dest {
            return Err(FsError::invalid_relocation(
                "source path and destination path must not be equal",
            ));
        }

        if self.tree.parent(source)? == Some(dest) {
            return Err(FsError::invalid_relocation(
                "source path cannot be copied or moved to its parent",
            ));
        }

        if source_kind == ItemKind::Directory && self.tree.is_ancestor_of(source, dest)? {
            return Err(FsError::invalid_relocation(
                "source directory cannot be a parent of the destination directory",
            ));
        }

        if self.tree.has_locks(source)? {
            return Err(FsError::locked(format!(
                "'{source_path}' contains one or more locked files and cannot be copied or moved"
            )));
        }

        let name = self.tree.name(source)?;
        if self.tree.find_child(dest, name)?.is_some() {
            return Err(FsError::name_conflict(name));
        }

        Ok((source, dest))
    }

    fn copy_item_tree(&mut self, item: ItemId, dest: ItemId) -> FsResult<()> {
        let name = self.tree.name(item)?.to_string();
        let copy = match self.tree.kind(item)? {
            ItemKind::Directory => self.tree.add_child_directory(dest, &name)?,
            ItemKind::File => self.tree.add_child_file(dest, &name)?,
            other => {
                return Err(FsError::wrong_kind(
                    self.tree.path_of(item)?,
                    "a directory or a file",
                    other,
                ))
            }
        };

        for child in self.tree.children(item)? {
            self.copy_item_tree(child, copy)?;
        }
        Ok(())
    }

    /// Re-creates the source subtree under the destination. Locks are not copied.
    pub fn copy(&mut self, current_directory: &str, source_path: &str, dest_path: &str) -> FsResult<()> {
        let (source, dest) = self.check_relocation(current_directory, source_path, dest_path)?;
        self.copy_item_tree(source, dest)?;
        debug!(source = %source_path, dest = %dest_path, "copied");
        Ok(())
    }

    /// Relinks the source subtree under the destination, keeping its identity.
    pub fn move_item(&mut self, current_directory: &str, source_path: &str, dest_path: &str) -> FsResult<()> {
        let (source, dest) = self.check_relocation(current_directory, source_path, dest_path)?;
        let previous_parent = self.parent_of(source)?;

        self.tree.remove_child(previous_parent, source)?;
        if let Err(err) = self.tree.add_child(dest, source) {
            // The source was attached under `previous_parent` a moment ago, so
            // reattaching it there cannot conflict.
            let restored = self.tree.add_child(previous_parent, source);
            debug_assert!(restored.is_ok(), "rollback of a failed move must succeed");
            restored?;
            return Err(err);
        }
        debug!(source = %source_path, dest = %dest_path, "moved");
        Ok(())
    }

    fn sorted_children(&self, item: ItemId) -> FsResult<Vec<ItemId>> {
        let mut children = Vec::new();
        for child in self.tree.children(item)? {
            children.push((self.tree.kind(child)?, self.tree.name(child)?, child));
        }
        children.sort_by(|a, b| match a.0.cmp(&b.0) {
            Ordering::Equal => ItemNameComparer.compare(a.1, b.1),
            other => other,
        });
        Ok(children.into_iter().map(|(_, _, id)| id).collect())
    }

    fn print_item(&self, item: ItemId, lines: &mut Vec<String>, print_root: bool) -> FsResult<()> {
        let kind = self.tree.kind(item)?;
        if kind == ItemKind::Root && !print_root {
            return Ok(());
        }

        let mut line = String::new();
        let mut level = self.tree.level(item)?;
        if !print_root {
            level -= 1;
        }
        if level > 0 {
            line.push_str(&"| ".repeat(level));
            line.pop();
            line.push('_');
        }

        line.push_str(self.tree.name(item)?);
        match kind {
            ItemKind::Directory => line.push_str(" [DIR]"),
            ItemKind::File => line.push_str(" [FILE]"),
            _ => {}
        }

        let holders = self.tree.locked_by(item)?;
        if !holders.is_empty() {
            let names: Vec<&str> = holders.iter().map(UserName::as_str).collect();
            line.push_str(&format!(" [LOCKED BY: {}]", names.join(", ")));
        }

        lines.push(line);
        Ok(())
    }

    fn print_tree_helper(&self, item: ItemId, lines: &mut Vec<String>, print_root: bool) -> FsResult<()> {
        self.print_item(item, lines, print_root)?;
        for child in self.sorted_children(item)? {
            self.print_tree_helper(child, lines, print_root)?;
        }
        Ok(())
    }

    /// Renders the whole tree, one item per line.
    pub fn print_tree(&self, print_root: bool) -> FsResult<String> {
        let mut lines = Vec::new();
        self.print_tree_helper(self.root, &mut lines, print_root)?;
        Ok(lines.join("\n"))
    }
}
