//! Shared wire types for the directory and tag surfaces.

use crate::error::ApiResult;
use crate::query::{parse_directory_ref, split_csv};
use serde::Deserialize;
use uuid::Uuid;

/// Query parameters for node listing/resolution.
#[derive(Debug, Deserialize)]
pub struct ListNodesParams {
    /// Comma-separated node names.
    pub name: Option<String>,
    /// Comma-separated parent ids; `root` matches top-level nodes.
    pub parent: Option<String>,
    /// Include all descendants of the matches.
    #[serde(default)]
    pub recursive: bool,
}

impl ListNodesParams {
    pub fn names(&self) -> Option<Vec<String>> {
        self.name.as_deref().map(split_csv)
    }

    pub fn parents(&self) -> ApiResult<Option<Vec<Option<Uuid>>>> {
        match self.parent.as_deref() {
            None => Ok(None),
            Some(raw) => split_csv(raw)
                .iter()
                .map(|p| parse_directory_ref(p))
                .collect::<ApiResult<Vec<_>>>()
                .map(Some),
        }
    }
}

/// Body for node creation.
#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    pub name: String,
    /// Parent id, or `root` / absent for a top-level node.
    pub parent: Option<String>,
}

impl CreateNodeRequest {
    pub fn parent_id(&self) -> ApiResult<Option<Uuid>> {
        match self.parent.as_deref() {
            None => Ok(None),
            Some(raw) => parse_directory_ref(raw),
        }
    }
}

/// Body for node rename/move.
#[derive(Debug, Deserialize)]
pub struct NodePatchRequest {
    pub name: Option<String>,
    /// New parent id, or `root` to move to the top level. Absent leaves
    /// the parent alone.
    pub parent: Option<String>,
}

impl NodePatchRequest {
    pub fn new_parent(&self) -> ApiResult<Option<Option<Uuid>>> {
        match self.parent.as_deref() {
            None => Ok(None),
            Some(raw) => parse_directory_ref(raw).map(Some),
        }
    }
}
