//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{DirectoryRepo, FileRepo, TagRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: FileRepo + DirectoryRepo + TagRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// Schema for the three record kinds and their association tables.
///
/// There is deliberately no unique index on `(name, parent)` for
/// directories or tags: sibling uniqueness is enforced by the tree
/// engine (rejected at create, reconciled after rename/move), so a
/// transient duplicate state is representable. Likewise file uniqueness
/// on `(name, type, size, directory)` is a pre-insert existence check,
/// not a constraint.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    file_id       BLOB PRIMARY KEY,
    file_name     TEXT NOT NULL,
    file_type     TEXT NOT NULL,
    size_bytes    INTEGER NOT NULL,
    directory_id  BLOB,
    created_at    TEXT,
    uploaded_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_files_directory ON files(directory_id);
CREATE INDEX IF NOT EXISTS idx_files_identity ON files(file_name, file_type, size_bytes, directory_id);

CREATE TABLE IF NOT EXISTS file_chunks (
    file_id       BLOB NOT NULL REFERENCES files(file_id) ON DELETE CASCADE,
    position      INTEGER NOT NULL,
    chunk_handle  TEXT NOT NULL,
    PRIMARY KEY (file_id, position)
);

CREATE TABLE IF NOT EXISTS file_tags (
    file_id  BLOB NOT NULL REFERENCES files(file_id) ON DELETE CASCADE,
    tag_id   BLOB NOT NULL,
    PRIMARY KEY (file_id, tag_id)
);
CREATE INDEX IF NOT EXISTS idx_file_tags_tag ON file_tags(tag_id);

CREATE TABLE IF NOT EXISTS directories (
    directory_id    BLOB PRIMARY KEY,
    directory_name  TEXT NOT NULL,
    parent_id       BLOB,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_directories_parent ON directories(parent_id);

CREATE TABLE IF NOT EXISTS tags (
    tag_id      BLOB PRIMARY KEY,
    tag_name    TEXT NOT NULL,
    parent_id   BLOB,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tags_parent ON tags(parent_id);
"#;

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store, running migrations.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MetadataError::Config(format!("cannot create db directory: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))
            .map_err(MetadataError::Database)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures under axum
            // concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::filter::FileFilter;
    use crate::models::{DirectoryRow, FileRecord, FileRow, NewFile, TagRow};
    use sqlx::QueryBuilder;
    use time::OffsetDateTime;
    use uuid::Uuid;

    /// Append `col IN (…)` with one bind per value.
    fn push_in_list<'a, T>(
        qb: &mut QueryBuilder<'a, Sqlite>,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) where
        T: 'a + sqlx::Encode<'a, Sqlite> + sqlx::Type<Sqlite> + Send,
    {
        qb.push(column);
        qb.push(" IN (");
        let mut separated = qb.separated(", ");
        for value in values {
            separated.push_bind(value);
        }
        qb.push(")");
    }

    /// Append a name/parent criteria clause shared by directory and tag
    /// lookups. `None` parents match root records.
    fn push_tree_criteria<'a>(
        qb: &mut QueryBuilder<'a, Sqlite>,
        name_column: &str,
        names: Option<&'a [String]>,
        parents: Option<&'a [Option<Uuid>]>,
    ) {
        if let Some(names) = names {
            qb.push(" AND ");
            push_in_list(qb, name_column, names);
        }
        if let Some(parents) = parents {
            let ids: Vec<Uuid> = parents.iter().filter_map(|p| *p).collect();
            let match_root = parents.iter().any(|p| p.is_none());

            qb.push(" AND (");
            if !ids.is_empty() {
                push_in_list(qb, "parent_id", ids);
                if match_root {
                    qb.push(" OR parent_id IS NULL");
                }
            } else if match_root {
                qb.push("parent_id IS NULL");
            } else {
                // Constrained to an empty parent set: match nothing.
                qb.push("0");
            }
            qb.push(")");
        }
    }

    #[async_trait]
    impl FileRepo for SqliteStore {
        async fn get_file(&self, file_id: Uuid) -> MetadataResult<Option<FileRecord>> {
            let row = sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE file_id = ?")
                .bind(file_id)
                .fetch_optional(&self.pool)
                .await?;
            let Some(row) = row else {
                return Ok(None);
            };

            let chunk_handles: Vec<String> = sqlx::query_scalar(
                "SELECT chunk_handle FROM file_chunks WHERE file_id = ? ORDER BY position",
            )
            .bind(file_id)
            .fetch_all(&self.pool)
            .await?;

            let tags: Vec<Uuid> =
                sqlx::query_scalar("SELECT tag_id FROM file_tags WHERE file_id = ?")
                    .bind(file_id)
                    .fetch_all(&self.pool)
                    .await?;

            Ok(Some(FileRecord {
                file_id: row.file_id,
                file_name: row.file_name,
                file_type: row.file_type,
                size_bytes: row.size_bytes.max(0) as u64,
                directory_id: row.directory_id,
                tags,
                created_at: row.created_at,
                uploaded_at: row.uploaded_at,
                chunk_handles,
            }))
        }

        async fn find_file_ids(&self, filter: &FileFilter) -> MetadataResult<Vec<Uuid>> {
            let mut qb = QueryBuilder::new("SELECT f.file_id FROM files f WHERE 1=1");

            if !filter.types.is_empty() {
                qb.push(" AND ");
                push_in_list(&mut qb, "f.file_type", &filter.types);
            }

            if !filter.directories.is_empty() {
                let ids: Vec<Uuid> = filter.directories.iter().filter_map(|d| *d).collect();
                let match_root = filter.directories.iter().any(|d| d.is_none());

                qb.push(" AND (");
                if !ids.is_empty() {
                    push_in_list(&mut qb, "f.directory_id", ids);
                    if match_root {
                        qb.push(" OR f.directory_id IS NULL");
                    }
                } else {
                    qb.push("f.directory_id IS NULL");
                }
                qb.push(")");
            }

            if !filter.tags.is_empty() {
                // All-of: the file must reference every listed tag. The
                // filter deduplicates its tag list, so a simple count works.
                qb.push(" AND (SELECT COUNT(*) FROM file_tags ft WHERE ft.file_id = f.file_id AND ");
                push_in_list(&mut qb, "ft.tag_id", filter.tags.iter().copied());
                qb.push(") = ");
                qb.push_bind(filter.tags.len() as i64);
            }

            qb.push(" ORDER BY f.rowid");

            let ids: Vec<Uuid> = qb.build_query_scalar().fetch_all(&self.pool).await?;
            Ok(ids)
        }

        async fn file_exists(
            &self,
            file_name: &str,
            file_type: &str,
            size_bytes: u64,
            directory_id: Option<Uuid>,
        ) -> MetadataResult<bool> {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM files \
                 WHERE file_name = ? AND file_type = ? AND size_bytes = ? \
                 AND ((?4 IS NULL AND directory_id IS NULL) OR directory_id = ?4))",
            )
            .bind(file_name)
            .bind(file_type)
            .bind(size_bytes as i64)
            .bind(directory_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(exists)
        }

        async fn insert_file(&self, file: &NewFile) -> MetadataResult<Uuid> {
            let file_id = Uuid::new_v4();
            let uploaded_at = OffsetDateTime::now_utc();

            let mut tx = self.pool.begin().await?;

            sqlx::query(
                "INSERT INTO files \
                 (file_id, file_name, file_type, size_bytes, directory_id, created_at, uploaded_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(file_id)
            .bind(&file.file_name)
            .bind(&file.file_type)
            .bind(file.size_bytes as i64)
            .bind(file.directory_id)
            .bind(file.created_at)
            .bind(uploaded_at)
            .execute(&mut *tx)
            .await?;

            for (position, handle) in file.chunk_handles.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO file_chunks (file_id, position, chunk_handle) VALUES (?, ?, ?)",
                )
                .bind(file_id)
                .bind(position as i32)
                .bind(handle)
                .execute(&mut *tx)
                .await?;
            }

            for tag_id in &file.tags {
                sqlx::query("INSERT OR IGNORE INTO file_tags (file_id, tag_id) VALUES (?, ?)")
                    .bind(file_id)
                    .bind(tag_id)
                    .execute(&mut *tx)
                    .await?;
            }

            tx.commit().await?;
            Ok(file_id)
        }

        async fn update_file_directory(
            &self,
            file_id: Uuid,
            directory_id: Option<Uuid>,
        ) -> MetadataResult<()> {
            let result = sqlx::query("UPDATE files SET directory_id = ? WHERE file_id = ?")
                .bind(directory_id)
                .bind(file_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("file {file_id}")));
            }
            Ok(())
        }

        async fn add_file_tags(&self, file_id: Uuid, tags: &[Uuid]) -> MetadataResult<()> {
            self.require_file(file_id).await?;
            for tag_id in tags {
                sqlx::query("INSERT OR IGNORE INTO file_tags (file_id, tag_id) VALUES (?, ?)")
                    .bind(file_id)
                    .bind(tag_id)
                    .execute(&self.pool)
                    .await?;
            }
            Ok(())
        }

        async fn remove_file_tags(&self, file_id: Uuid, tags: &[Uuid]) -> MetadataResult<()> {
            self.require_file(file_id).await?;
            if tags.is_empty() {
                return Ok(());
            }
            let mut qb = QueryBuilder::new("DELETE FROM file_tags WHERE file_id = ");
            qb.push_bind(file_id);
            qb.push(" AND ");
            push_in_list(&mut qb, "tag_id", tags.iter().copied());
            qb.build().execute(&self.pool).await?;
            Ok(())
        }

        async fn replace_file_tags(&self, file_id: Uuid, tags: &[Uuid]) -> MetadataResult<()> {
            self.require_file(file_id).await?;
            let mut tx = self.pool.begin().await?;
            sqlx::query("DELETE FROM file_tags WHERE file_id = ?")
                .bind(file_id)
                .execute(&mut *tx)
                .await?;
            for tag_id in tags {
                sqlx::query("INSERT OR IGNORE INTO file_tags (file_id, tag_id) VALUES (?, ?)")
                    .bind(file_id)
                    .bind(tag_id)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
            Ok(())
        }

        async fn delete_file(&self, file_id: Uuid) -> MetadataResult<bool> {
            // file_tags and file_chunks cascade via foreign keys.
            let result = sqlx::query("DELETE FROM files WHERE file_id = ?")
                .bind(file_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        }

        async fn file_ids_in_directories(
            &self,
            directory_ids: &[Uuid],
        ) -> MetadataResult<Vec<Uuid>> {
            if directory_ids.is_empty() {
                return Ok(Vec::new());
            }
            let mut qb = QueryBuilder::new("SELECT file_id FROM files WHERE ");
            push_in_list(&mut qb, "directory_id", directory_ids.iter().copied());
            qb.push(" ORDER BY rowid");
            let ids: Vec<Uuid> = qb.build_query_scalar().fetch_all(&self.pool).await?;
            Ok(ids)
        }

        async fn files_tagged_any(&self, tag_ids: &[Uuid]) -> MetadataResult<Vec<Uuid>> {
            if tag_ids.is_empty() {
                return Ok(Vec::new());
            }
            let mut qb = QueryBuilder::new("SELECT DISTINCT file_id FROM file_tags WHERE ");
            push_in_list(&mut qb, "tag_id", tag_ids.iter().copied());
            let ids: Vec<Uuid> = qb.build_query_scalar().fetch_all(&self.pool).await?;
            Ok(ids)
        }

        async fn reassign_files(&self, from: &[Uuid], to: Uuid) -> MetadataResult<()> {
            if from.is_empty() {
                return Ok(());
            }
            let mut qb = QueryBuilder::new("UPDATE files SET directory_id = ");
            qb.push_bind(to);
            qb.push(" WHERE ");
            push_in_list(&mut qb, "directory_id", from.iter().copied());
            qb.build().execute(&self.pool).await?;
            Ok(())
        }

        async fn repoint_file_tags(&self, from: &[Uuid], to: Uuid) -> MetadataResult<()> {
            if from.is_empty() {
                return Ok(());
            }
            let mut tx = self.pool.begin().await?;

            // Tag the survivor on every file that carried a duplicate,
            // then drop the duplicate references. INSERT OR IGNORE keeps
            // files that already carry the survivor intact.
            let mut insert = QueryBuilder::new(
                "INSERT OR IGNORE INTO file_tags (file_id, tag_id) SELECT DISTINCT file_id, ",
            );
            insert.push_bind(to);
            insert.push(" FROM file_tags WHERE ");
            push_in_list(&mut insert, "tag_id", from.iter().copied());
            insert.build().execute(&mut *tx).await?;

            let mut delete = QueryBuilder::new("DELETE FROM file_tags WHERE ");
            push_in_list(&mut delete, "tag_id", from.iter().copied());
            delete.build().execute(&mut *tx).await?;

            tx.commit().await?;
            Ok(())
        }

        async fn strip_tags(&self, tag_ids: &[Uuid]) -> MetadataResult<()> {
            if tag_ids.is_empty() {
                return Ok(());
            }
            let mut qb = QueryBuilder::new("DELETE FROM file_tags WHERE ");
            push_in_list(&mut qb, "tag_id", tag_ids.iter().copied());
            qb.build().execute(&self.pool).await?;
            Ok(())
        }
    }

    impl SqliteStore {
        async fn require_file(&self, file_id: Uuid) -> MetadataResult<()> {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM files WHERE file_id = ?)")
                    .bind(file_id)
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                return Err(MetadataError::NotFound(format!("file {file_id}")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DirectoryRepo for SqliteStore {
        async fn get_directory(
            &self,
            directory_id: Uuid,
        ) -> MetadataResult<Option<DirectoryRow>> {
            let row = sqlx::query_as::<_, DirectoryRow>(
                "SELECT * FROM directories WHERE directory_id = ?",
            )
            .bind(directory_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn find_directories(
            &self,
            names: Option<&[String]>,
            parents: Option<&[Option<Uuid>]>,
        ) -> MetadataResult<Vec<DirectoryRow>> {
            let mut qb = QueryBuilder::new("SELECT * FROM directories WHERE 1=1");
            push_tree_criteria(&mut qb, "directory_name", names, parents);
            qb.push(" ORDER BY rowid");
            let rows = qb
                .build_query_as::<DirectoryRow>()
                .fetch_all(&self.pool)
                .await?;
            Ok(rows)
        }

        async fn insert_directory(
            &self,
            name: &str,
            parent_id: Option<Uuid>,
        ) -> MetadataResult<Uuid> {
            let directory_id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO directories (directory_id, directory_name, parent_id, created_at) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(directory_id)
            .bind(name)
            .bind(parent_id)
            .bind(OffsetDateTime::now_utc())
            .execute(&self.pool)
            .await?;
            Ok(directory_id)
        }

        async fn update_directory(
            &self,
            directory_id: Uuid,
            new_name: Option<&str>,
            new_parent: Option<Option<Uuid>>,
        ) -> MetadataResult<()> {
            if new_name.is_none() && new_parent.is_none() {
                return self.require_directory(directory_id).await;
            }
            let mut qb = QueryBuilder::new("UPDATE directories SET ");
            {
                let mut separated = qb.separated(", ");
                if let Some(name) = new_name {
                    separated.push("directory_name = ").push_bind_unseparated(name);
                }
                if let Some(parent) = new_parent {
                    // Binding None writes NULL, moving the node to the root.
                    separated.push("parent_id = ").push_bind_unseparated(parent);
                }
            }
            qb.push(" WHERE directory_id = ");
            qb.push_bind(directory_id);

            let result = qb.build().execute(&self.pool).await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("directory {directory_id}")));
            }
            Ok(())
        }

        async fn delete_directory(&self, directory_id: Uuid) -> MetadataResult<bool> {
            let result = sqlx::query("DELETE FROM directories WHERE directory_id = ?")
                .bind(directory_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        }
    }

    impl SqliteStore {
        async fn require_directory(&self, directory_id: Uuid) -> MetadataResult<()> {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM directories WHERE directory_id = ?)",
            )
            .bind(directory_id)
            .fetch_one(&self.pool)
            .await?;
            if !exists {
                return Err(MetadataError::NotFound(format!("directory {directory_id}")));
            }
            Ok(())
        }

        async fn require_tag(&self, tag_id: Uuid) -> MetadataResult<()> {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tags WHERE tag_id = ?)")
                    .bind(tag_id)
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                return Err(MetadataError::NotFound(format!("tag {tag_id}")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TagRepo for SqliteStore {
        async fn get_tag(&self, tag_id: Uuid) -> MetadataResult<Option<TagRow>> {
            let row = sqlx::query_as::<_, TagRow>("SELECT * FROM tags WHERE tag_id = ?")
                .bind(tag_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn find_tags(
            &self,
            names: Option<&[String]>,
            parents: Option<&[Option<Uuid>]>,
        ) -> MetadataResult<Vec<TagRow>> {
            let mut qb = QueryBuilder::new("SELECT * FROM tags WHERE 1=1");
            push_tree_criteria(&mut qb, "tag_name", names, parents);
            qb.push(" ORDER BY rowid");
            let rows = qb.build_query_as::<TagRow>().fetch_all(&self.pool).await?;
            Ok(rows)
        }

        async fn insert_tag(&self, name: &str, parent_id: Option<Uuid>) -> MetadataResult<Uuid> {
            let tag_id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO tags (tag_id, tag_name, parent_id, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(tag_id)
            .bind(name)
            .bind(parent_id)
            .bind(OffsetDateTime::now_utc())
            .execute(&self.pool)
            .await?;
            Ok(tag_id)
        }

        async fn update_tag(
            &self,
            tag_id: Uuid,
            new_name: Option<&str>,
            new_parent: Option<Option<Uuid>>,
        ) -> MetadataResult<()> {
            if new_name.is_none() && new_parent.is_none() {
                return self.require_tag(tag_id).await;
            }
            let mut qb = QueryBuilder::new("UPDATE tags SET ");
            {
                let mut separated = qb.separated(", ");
                if let Some(name) = new_name {
                    separated.push("tag_name = ").push_bind_unseparated(name);
                }
                if let Some(parent) = new_parent {
                    // Binding None writes NULL, moving the node to the root.
                    separated.push("parent_id = ").push_bind_unseparated(parent);
                }
            }
            qb.push(" WHERE tag_id = ");
            qb.push_bind(tag_id);

            let result = qb.build().execute(&self.pool).await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("tag {tag_id}")));
            }
            Ok(())
        }

        async fn delete_tag(&self, tag_id: Uuid) -> MetadataResult<bool> {
            let result = sqlx::query("DELETE FROM tags WHERE tag_id = ?")
                .bind(tag_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FileFilter;
    use crate::models::NewFile;
    use uuid::Uuid;

    async fn store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("test.db")).await.unwrap();
        (dir, store)
    }

    fn new_file(name: &str, file_type: &str, size: u64, directory: Option<Uuid>) -> NewFile {
        NewFile {
            file_name: name.to_string(),
            file_type: file_type.to_string(),
            size_bytes: size,
            directory_id: directory,
            tags: Vec::new(),
            created_at: None,
            chunk_handles: vec!["h-1".to_string(), "h-2".to_string()],
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_file() {
        let (_dir, store) = store().await;
        let id = store
            .insert_file(&new_file("a.txt", "text", 10, None))
            .await
            .unwrap();

        let record = store.get_file(id).await.unwrap().unwrap();
        assert_eq!(record.file_name, "a.txt");
        assert_eq!(record.size_bytes, 10);
        assert_eq!(record.chunk_handles, vec!["h-1", "h-2"]); // stored order
        assert!(record.created_at.is_none());
    }

    #[tokio::test]
    async fn test_get_unknown_file() {
        let (_dir, store) = store().await;
        assert!(store.get_file(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unconstrained_filter_matches_all() {
        let (_dir, store) = store().await;
        assert!(store.find_file_ids(&FileFilter::all()).await.unwrap().is_empty());

        let a = store.insert_file(&new_file("a", "t", 1, None)).await.unwrap();
        let b = store.insert_file(&new_file("b", "t", 2, None)).await.unwrap();

        let ids = store.find_file_ids(&FileFilter::all()).await.unwrap();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn test_tag_filter_is_all_of() {
        let (_dir, store) = store().await;
        let t1 = store.insert_tag("one", None).await.unwrap();
        let t2 = store.insert_tag("two", None).await.unwrap();

        let mut f = new_file("a", "t", 1, None);
        f.tags = vec![t1];
        let only_t1 = store.insert_file(&f).await.unwrap();

        let mut f = new_file("b", "t", 2, None);
        f.tags = vec![t1, t2];
        let both = store.insert_file(&f).await.unwrap();

        let ids = store
            .find_file_ids(&FileFilter::all().with_tags(vec![t1, t2]))
            .await
            .unwrap();
        assert_eq!(ids, vec![both]);

        let ids = store
            .find_file_ids(&FileFilter::all().with_tags(vec![t1]))
            .await
            .unwrap();
        assert_eq!(ids, vec![only_t1, both]);
    }

    #[tokio::test]
    async fn test_directory_filter_with_root_sentinel() {
        let (_dir, store) = store().await;
        let dir_id = store.insert_directory("docs", None).await.unwrap();

        let rooted = store.insert_file(&new_file("a", "t", 1, None)).await.unwrap();
        let nested = store
            .insert_file(&new_file("b", "t", 2, Some(dir_id)))
            .await
            .unwrap();

        let ids = store
            .find_file_ids(&FileFilter::all().with_directories(vec![None]))
            .await
            .unwrap();
        assert_eq!(ids, vec![rooted]);

        let ids = store
            .find_file_ids(&FileFilter::all().with_directories(vec![None, Some(dir_id)]))
            .await
            .unwrap();
        assert_eq!(ids, vec![rooted, nested]);
    }

    #[tokio::test]
    async fn test_type_and_directory_combined() {
        let (_dir, store) = store().await;
        let dir_id = store.insert_directory("docs", None).await.unwrap();
        store
            .insert_file(&new_file("a", "pdf", 1, Some(dir_id)))
            .await
            .unwrap();
        let wanted = store
            .insert_file(&new_file("b", "png", 2, Some(dir_id)))
            .await
            .unwrap();
        store.insert_file(&new_file("c", "png", 3, None)).await.unwrap();

        let ids = store
            .find_file_ids(
                &FileFilter::all()
                    .with_types(vec!["png".into()])
                    .with_directories(vec![Some(dir_id)]),
            )
            .await
            .unwrap();
        assert_eq!(ids, vec![wanted]);
    }

    #[tokio::test]
    async fn test_file_exists_identity_key() {
        let (_dir, store) = store().await;
        store.insert_file(&new_file("a", "t", 1, None)).await.unwrap();

        assert!(store.file_exists("a", "t", 1, None).await.unwrap());
        assert!(!store.file_exists("a", "t", 2, None).await.unwrap());
        assert!(!store.file_exists("a", "u", 1, None).await.unwrap());
        assert!(
            !store
                .file_exists("a", "t", 1, Some(Uuid::new_v4()))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_delete_file_cascades_associations() {
        let (_dir, store) = store().await;
        let tag = store.insert_tag("x", None).await.unwrap();
        let mut f = new_file("a", "t", 1, None);
        f.tags = vec![tag];
        let id = store.insert_file(&f).await.unwrap();

        assert!(store.delete_file(id).await.unwrap());
        assert!(!store.delete_file(id).await.unwrap());
        assert!(store.files_tagged_any(&[tag]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_directories_insertion_order() {
        let (_dir, store) = store().await;
        let first = store.insert_directory("dup", None).await.unwrap();
        let second = store.insert_directory("dup", None).await.unwrap();

        let rows = store
            .find_directories(Some(&["dup".to_string()]), Some(&[None]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].directory_id, first); // pre-existing record first
        assert_eq!(rows[1].directory_id, second);
    }

    #[tokio::test]
    async fn test_repoint_file_tags_dedups() {
        let (_dir, store) = store().await;
        let survivor = store.insert_tag("s", None).await.unwrap();
        let dup = store.insert_tag("s", None).await.unwrap();

        let mut f = new_file("a", "t", 1, None);
        f.tags = vec![survivor, dup];
        let id = store.insert_file(&f).await.unwrap();

        store.repoint_file_tags(&[dup], survivor).await.unwrap();
        let record = store.get_file(id).await.unwrap().unwrap();
        assert_eq!(record.tags, vec![survivor]);
    }

    #[tokio::test]
    async fn test_reassign_files() {
        let (_dir, store) = store().await;
        let from = store.insert_directory("dup", None).await.unwrap();
        let to = store.insert_directory("dup", None).await.unwrap();
        let id = store
            .insert_file(&new_file("a", "t", 1, Some(from)))
            .await
            .unwrap();

        store.reassign_files(&[from], to).await.unwrap();
        let record = store.get_file(id).await.unwrap().unwrap();
        assert_eq!(record.directory_id, Some(to));
    }

    #[tokio::test]
    async fn test_update_directory_not_found() {
        let (_dir, store) = store().await;
        let err = store
            .update_directory(Uuid::new_v4(), Some("x"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::NotFound(_)));
    }
}
