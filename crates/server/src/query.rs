//! Query composition: wire criteria to a metadata file filter.

use crate::error::{ApiError, ApiResult};
use shelf_metadata::{parse_id, FileFilter};
use uuid::Uuid;

/// The wire literal that selects files (or directories) at the root,
/// i.e. records with no owning directory.
pub const ROOT_SENTINEL: &str = "root";

/// Parse a wire identifier, rejecting malformed input at the boundary.
pub fn parse_wire_id(s: &str) -> ApiResult<Uuid> {
    parse_id(s).map_err(|_| ApiError::InvalidIdentifier(s.to_string()))
}

/// Parse a wire directory reference: the root sentinel or an id.
pub fn parse_directory_ref(s: &str) -> ApiResult<Option<Uuid>> {
    if s == ROOT_SENTINEL {
        Ok(None)
    } else {
        parse_wire_id(s).map(Some)
    }
}

/// Split a comma-separated query value into trimmed non-empty items.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a file filter from wire criteria.
///
/// Tag and directory entries are ids; directories additionally accept the
/// root sentinel. Types pass through as-is. Axes left empty stay
/// unconstrained, so no criteria at all matches every file.
pub fn build_file_filter(
    tags: &[String],
    types: &[String],
    directories: &[String],
) -> ApiResult<FileFilter> {
    let mut filter = FileFilter::all();

    if !tags.is_empty() {
        let tag_ids = tags
            .iter()
            .map(|t| parse_wire_id(t))
            .collect::<ApiResult<Vec<_>>>()?;
        filter = filter.with_tags(tag_ids);
    }

    if !types.is_empty() {
        filter = filter.with_types(types.to_vec());
    }

    if !directories.is_empty() {
        let directory_refs = directories
            .iter()
            .map(|d| parse_directory_ref(d))
            .collect::<ApiResult<Vec<_>>>()?;
        filter = filter.with_directories(directory_refs);
    }

    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_criteria_is_unconstrained() {
        let filter = build_file_filter(&[], &[], &[]).unwrap();
        assert!(filter.is_unconstrained());
    }

    #[test]
    fn test_root_sentinel_maps_to_none() {
        let id = Uuid::new_v4();
        let filter =
            build_file_filter(&[], &[], &["root".to_string(), id.to_string()]).unwrap();
        assert!(filter.directories.contains(&None));
        assert!(filter.directories.contains(&Some(id)));
    }

    #[test]
    fn test_malformed_tag_id_rejected() {
        let err = build_file_filter(&["not-an-id".to_string()], &[], &[]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_malformed_directory_id_rejected() {
        let err = build_file_filter(&[], &[], &["roots".to_string()]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_split_csv_trims_and_drops_empties() {
        assert_eq!(split_csv("a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_csv("").is_empty());
    }
}
