//! Filesystem-backed workflow store

use async_trait::async_trait;
use musikant_domain::{WorkflowFile, WorkflowStore, WorkflowStoreError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Reads workflow files from one directory and writes rewritten documents
/// either back in place or to a sink such as stdout
pub struct FsWorkflowStore {
    directory: PathBuf,
    sink: Option<Mutex<Box<dyn Write + Send>>>,
}

impl FsWorkflowStore {
    /// Rewrite files in place
    pub fn overwrite(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            sink: None,
        }
    }

    /// Print rewritten documents to standard output
    pub fn to_stdout(directory: impl AsRef<Path>) -> Self {
        Self::to_writer(directory, Box::new(std::io::stdout()))
    }

    pub fn to_writer(directory: impl AsRef<Path>, writer: Box<dyn Write + Send>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            sink: Some(Mutex::new(writer)),
        }
    }
}

#[async_trait]
impl WorkflowStore for FsWorkflowStore {
    async fn list(&self) -> Result<Vec<WorkflowFile>, WorkflowStoreError> {
        let list_error = |source| WorkflowStoreError::List {
            path: self.directory.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.directory)
            .await
            .map_err(list_error)?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
            let file_type = entry.file_type().await.map_err(list_error)?;
            if file_type.is_dir() {
                continue;
            }

            files.push(WorkflowFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!(
            directory = %self.directory.display(),
            count = files.len(),
            "Listed workflow files"
        );
        Ok(files)
    }

    async fn read(&self, file: &WorkflowFile) -> Result<String, WorkflowStoreError> {
        tokio::fs::read_to_string(&file.path)
            .await
            .map_err(|source| WorkflowStoreError::Read {
                path: file.path.clone(),
                source,
            })
    }

    async fn write(&self, file: &WorkflowFile, contents: &str) -> Result<(), WorkflowStoreError> {
        let write_error = |source| WorkflowStoreError::Write {
            path: file.path.clone(),
            source,
        };

        if let Some(sink) = &self.sink {
            let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
            sink.write_all(contents.as_bytes()).map_err(write_error)?;
            if !contents.ends_with('\n') {
                sink.write_all(b"\n").map_err(write_error)?;
            }
            return sink.flush().map_err(write_error);
        }

        let permissions = tokio::fs::metadata(&file.path)
            .await
            .map_err(write_error)?
            .permissions();

        tokio::fs::write(&file.path, contents)
            .await
            .map_err(write_error)?;
        tokio::fs::set_permissions(&file.path, permissions)
            .await
            .map_err(write_error)?;

        tracing::info!(file = %file.path.display(), "Wrote pinned workflow");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Writer whose output can be inspected after the store is done with it
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn setup_workflows() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("release.yml"), "name: release\n").unwrap();
        std::fs::write(dir.path().join("ci.yml"), "name: ci\n").unwrap();
        std::fs::create_dir(dir.path().join("templates")).unwrap();
        std::fs::write(dir.path().join("templates").join("nested.yml"), "x: 1\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_list_skips_directories_and_sorts() {
        let dir = setup_workflows();
        let store = FsWorkflowStore::overwrite(dir.path());

        let files = store.list().await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(names, vec!["ci.yml", "release.yml"]);
        assert_eq!(files[0].path, dir.path().join("ci.yml"));
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = FsWorkflowStore::overwrite(dir.path().join("missing"));

        let result = store.list().await;
        assert!(matches!(result, Err(WorkflowStoreError::List { .. })));
    }

    #[tokio::test]
    async fn test_read_file_contents() {
        let dir = setup_workflows();
        let store = FsWorkflowStore::overwrite(dir.path());
        let files = store.list().await.unwrap();

        let contents = store.read(&files[0]).await.unwrap();
        assert_eq!(contents, "name: ci\n");
    }

    #[tokio::test]
    async fn test_overwrite_replaces_file() {
        let dir = setup_workflows();
        let store = FsWorkflowStore::overwrite(dir.path());
        let files = store.list().await.unwrap();

        store.write(&files[0], "name: pinned\n").await.unwrap();

        let contents = std::fs::read_to_string(dir.path().join("ci.yml")).unwrap();
        assert_eq!(contents, "name: pinned\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_overwrite_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = setup_workflows();
        let path = dir.path().join("ci.yml");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();

        let store = FsWorkflowStore::overwrite(dir.path());
        let files = store.list().await.unwrap();
        store.write(&files[0], "name: pinned\n").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_writer_mode_leaves_file_untouched() {
        let dir = setup_workflows();
        let buffer = SharedBuffer::default();
        let store = FsWorkflowStore::to_writer(dir.path(), Box::new(buffer.clone()));
        let files = store.list().await.unwrap();

        store.write(&files[0], "name: pinned").await.unwrap();
        store.write(&files[1], "name: also\n").await.unwrap();

        assert_eq!(buffer.contents(), "name: pinned\nname: also\n");
        let contents = std::fs::read_to_string(dir.path().join("ci.yml")).unwrap();
        assert_eq!(contents, "name: ci\n");
    }
}
