//! Hierarchy engine.
//!
//! Directories and tags are both forests of named nodes, and every tree
//! operation (recursive resolution, creation, rename/move, duplicate
//! collapse, cascaded deletion) is the same algorithm over either kind.
//! The [`Forest`] trait is the seam: [`DirectoryForest`] and [`TagForest`]
//! adapt the metadata store and define what "references" mean for their
//! kind (files owned by a directory, tag entries on files).

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use serde::Serialize;
use shelf_metadata::{DirectoryRow, MetadataStore, TagRow};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

/// A directory or tag node, uniform across both forests.
#[derive(Clone, Debug, Serialize)]
pub struct TreeNode {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

impl From<DirectoryRow> for TreeNode {
    fn from(row: DirectoryRow) -> Self {
        Self {
            id: row.directory_id,
            name: row.directory_name,
            parent_id: row.parent_id,
        }
    }
}

impl From<TagRow> for TreeNode {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.tag_id,
            name: row.tag_name,
            parent_id: row.parent_id,
        }
    }
}

/// One forest of nodes (directories or tags) over the metadata store.
#[async_trait]
pub trait Forest: Send + Sync {
    /// Node kind for error messages and logs.
    fn kind(&self) -> &'static str;

    /// Get a node by id.
    async fn get(&self, id: Uuid) -> ApiResult<Option<TreeNode>>;

    /// Find nodes by name/parent criteria, insertion-ordered. An omitted
    /// axis is unconstrained; a `None` parent entry matches root nodes.
    async fn find(
        &self,
        names: Option<&[String]>,
        parents: Option<&[Option<Uuid>]>,
    ) -> ApiResult<Vec<TreeNode>>;

    /// Insert a node.
    async fn insert(&self, name: &str, parent: Option<Uuid>) -> ApiResult<Uuid>;

    /// Rename and/or reparent a node (`Some(None)` parent means root).
    async fn rename(
        &self,
        id: Uuid,
        new_name: Option<&str>,
        new_parent: Option<Option<Uuid>>,
    ) -> ApiResult<()>;

    /// Delete one node record (no cascade).
    async fn remove_node(&self, id: Uuid) -> ApiResult<bool>;

    /// Repoint every file reference from the `from` nodes onto `to`.
    async fn collapse_references(&self, from: &[Uuid], to: Uuid) -> ApiResult<()>;
}

/// Directory forest over the metadata store.
pub struct DirectoryForest {
    store: Arc<dyn MetadataStore>,
}

impl DirectoryForest {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Forest for DirectoryForest {
    fn kind(&self) -> &'static str {
        "directory"
    }

    async fn get(&self, id: Uuid) -> ApiResult<Option<TreeNode>> {
        Ok(self.store.get_directory(id).await?.map(TreeNode::from))
    }

    async fn find(
        &self,
        names: Option<&[String]>,
        parents: Option<&[Option<Uuid>]>,
    ) -> ApiResult<Vec<TreeNode>> {
        let rows = self.store.find_directories(names, parents).await?;
        Ok(rows.into_iter().map(TreeNode::from).collect())
    }

    async fn insert(&self, name: &str, parent: Option<Uuid>) -> ApiResult<Uuid> {
        Ok(self.store.insert_directory(name, parent).await?)
    }

    async fn rename(
        &self,
        id: Uuid,
        new_name: Option<&str>,
        new_parent: Option<Option<Uuid>>,
    ) -> ApiResult<()> {
        Ok(self.store.update_directory(id, new_name, new_parent).await?)
    }

    async fn remove_node(&self, id: Uuid) -> ApiResult<bool> {
        Ok(self.store.delete_directory(id).await?)
    }

    async fn collapse_references(&self, from: &[Uuid], to: Uuid) -> ApiResult<()> {
        Ok(self.store.reassign_files(from, to).await?)
    }
}

/// Tag forest over the metadata store.
pub struct TagForest {
    store: Arc<dyn MetadataStore>,
}

impl TagForest {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Delete a tag and its whole subtree, stripping every reference to
    /// any of those tags from all files first. Returns the number of tags
    /// removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_cascade(&self, id: Uuid) -> ApiResult<usize> {
        let ids = subtree(self, id).await?;
        self.store.strip_tags(&ids).await?;
        // Children before parents.
        for tag_id in ids.iter().rev() {
            self.remove_node(*tag_id).await?;
        }
        tracing::info!(tag_id = %id, removed = ids.len(), "deleted tag subtree");
        Ok(ids.len())
    }
}

#[async_trait]
impl Forest for TagForest {
    fn kind(&self) -> &'static str {
        "tag"
    }

    async fn get(&self, id: Uuid) -> ApiResult<Option<TreeNode>> {
        Ok(self.store.get_tag(id).await?.map(TreeNode::from))
    }

    async fn find(
        &self,
        names: Option<&[String]>,
        parents: Option<&[Option<Uuid>]>,
    ) -> ApiResult<Vec<TreeNode>> {
        let rows = self.store.find_tags(names, parents).await?;
        Ok(rows.into_iter().map(TreeNode::from).collect())
    }

    async fn insert(&self, name: &str, parent: Option<Uuid>) -> ApiResult<Uuid> {
        Ok(self.store.insert_tag(name, parent).await?)
    }

    async fn rename(
        &self,
        id: Uuid,
        new_name: Option<&str>,
        new_parent: Option<Option<Uuid>>,
    ) -> ApiResult<()> {
        Ok(self.store.update_tag(id, new_name, new_parent).await?)
    }

    async fn remove_node(&self, id: Uuid) -> ApiResult<bool> {
        Ok(self.store.delete_tag(id).await?)
    }

    async fn collapse_references(&self, from: &[Uuid], to: Uuid) -> ApiResult<()> {
        Ok(self.store.repoint_file_tags(from, to).await?)
    }
}

/// Resolve nodes by criteria. With `recursive` set, the result is the
/// breadth-first closure of the matches: matched nodes first, then their
/// children generation by generation.
pub async fn resolve(
    forest: &dyn Forest,
    names: Option<&[String]>,
    parents: Option<&[Option<Uuid>]>,
    recursive: bool,
) -> ApiResult<Vec<TreeNode>> {
    let mut result = forest.find(names, parents).await?;
    if !recursive {
        return Ok(result);
    }

    let mut seen: HashSet<Uuid> = result.iter().map(|n| n.id).collect();
    let mut frontier: Vec<Option<Uuid>> = result.iter().map(|n| Some(n.id)).collect();
    while !frontier.is_empty() {
        let generation = forest.find(None, Some(&frontier)).await?;
        frontier = Vec::new();
        for node in generation {
            // The forest is acyclic by construction, but a node matched by
            // the base criteria can reappear as a child of another match.
            if seen.insert(node.id) {
                frontier.push(Some(node.id));
                result.push(node);
            }
        }
    }
    Ok(result)
}

/// Direct children of a node.
pub async fn children(forest: &dyn Forest, id: Uuid) -> ApiResult<Vec<TreeNode>> {
    forest.find(None, Some(&[Some(id)])).await
}

/// The node plus all its descendants, in breadth-first order.
/// `NotFound` for unknown ids.
pub async fn subtree(forest: &dyn Forest, id: Uuid) -> ApiResult<Vec<Uuid>> {
    if forest.get(id).await?.is_none() {
        return Err(ApiError::NotFound(format!("{} {id}", forest.kind())));
    }

    let mut ids = vec![id];
    let mut frontier: Vec<Option<Uuid>> = vec![Some(id)];
    while !frontier.is_empty() {
        let generation = forest.find(None, Some(&frontier)).await?;
        frontier = Vec::new();
        for node in generation {
            frontier.push(Some(node.id));
            ids.push(node.id);
        }
    }
    Ok(ids)
}

/// Create a node, rejecting same-name siblings with `Conflict`.
#[tracing::instrument(skip(forest), fields(kind = forest.kind()))]
pub async fn create(forest: &dyn Forest, name: &str, parent: Option<Uuid>) -> ApiResult<Uuid> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!(
            "{} name must not be empty",
            forest.kind()
        )));
    }
    if let Some(parent_id) = parent {
        if forest.get(parent_id).await?.is_none() {
            return Err(ApiError::NotFound(format!(
                "{} {parent_id}",
                forest.kind()
            )));
        }
    }

    let siblings = forest
        .find(Some(std::slice::from_ref(&name.to_string())), Some(&[parent]))
        .await?;
    if !siblings.is_empty() {
        return Err(ApiError::Conflict(format!(
            "{} '{name}' already exists under that parent",
            forest.kind()
        )));
    }

    let id = forest.insert(name, parent).await?;
    tracing::info!(id = %id, name, "created node");
    Ok(id)
}

/// Rename and/or move a node, then collapse any duplicate sibling group
/// the change produced. Returns the id of the surviving record, which is
/// the node itself unless it merged into a pre-existing sibling.
#[tracing::instrument(skip(forest), fields(kind = forest.kind()))]
pub async fn rename_move(
    forest: &dyn Forest,
    id: Uuid,
    new_name: Option<&str>,
    new_parent: Option<Option<Uuid>>,
) -> ApiResult<Uuid> {
    let node = forest
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} {id}", forest.kind())))?;

    if let Some(name) = new_name {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "{} name must not be empty",
                forest.kind()
            )));
        }
    }

    if let Some(Some(parent_id)) = new_parent {
        if parent_id == id {
            return Err(ApiError::InvalidInput(format!(
                "cannot move a {} under itself",
                forest.kind()
            )));
        }
        let descendants = subtree(forest, id).await?;
        if descendants.contains(&parent_id) {
            return Err(ApiError::InvalidInput(format!(
                "cannot move a {} under its own descendant",
                forest.kind()
            )));
        }
        if forest.get(parent_id).await?.is_none() {
            return Err(ApiError::NotFound(format!(
                "{} {parent_id}",
                forest.kind()
            )));
        }
    }

    forest.rename(id, new_name, new_parent).await?;

    let effective_name = new_name.map(str::to_string).unwrap_or(node.name);
    let effective_parent = new_parent.unwrap_or(node.parent_id);
    let survivor = merge_similar(forest, &effective_name, effective_parent)
        .await?
        .unwrap_or(id);
    Ok(survivor)
}

/// Collapse duplicate sibling groups starting at `(name, parent)`.
///
/// The first-found (oldest) record survives; children of the duplicates
/// are reparented onto it, file references are repointed, and the
/// duplicate records are deleted. Reparenting can itself create new
/// duplicate groups one level down, so the collapse walks a worklist
/// until no group has more than one member.
///
/// Returns the surviving id of the initial group, `None` when the group
/// is empty.
pub async fn merge_similar(
    forest: &dyn Forest,
    name: &str,
    parent: Option<Uuid>,
) -> ApiResult<Option<Uuid>> {
    let mut initial_survivor = None;
    let mut work: VecDeque<(String, Option<Uuid>)> = VecDeque::new();
    let mut seen: HashSet<(String, Option<Uuid>)> = HashSet::new();
    work.push_back((name.to_string(), parent));

    while let Some((group_name, group_parent)) = work.pop_front() {
        if !seen.insert((group_name.clone(), group_parent)) {
            continue;
        }

        let group = forest
            .find(
                Some(std::slice::from_ref(&group_name)),
                Some(&[group_parent]),
            )
            .await?;
        let Some((survivor, duplicates)) = group.split_first() else {
            continue;
        };
        if initial_survivor.is_none() {
            initial_survivor = Some(survivor.id);
        }
        if duplicates.is_empty() {
            continue;
        }

        let duplicate_ids: Vec<Uuid> = duplicates.iter().map(|n| n.id).collect();
        tracing::info!(
            kind = forest.kind(),
            name = %group_name,
            survivor = %survivor.id,
            duplicates = duplicate_ids.len(),
            "collapsing duplicate siblings"
        );

        let duplicate_parents: Vec<Option<Uuid>> =
            duplicate_ids.iter().map(|d| Some(*d)).collect();
        let orphans = forest.find(None, Some(&duplicate_parents)).await?;
        for child in orphans {
            forest
                .rename(child.id, None, Some(Some(survivor.id)))
                .await?;
            work.push_back((child.name, Some(survivor.id)));
        }

        forest.collapse_references(&duplicate_ids, survivor.id).await?;
        for duplicate_id in duplicate_ids {
            forest.remove_node(duplicate_id).await?;
        }
    }

    Ok(initial_survivor)
}
