use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::FilesConfig;
use crate::dto::{DeletedFile, FileListing};
use crate::interceptors::{AppError, AppResult};
use crate::utils::absolute_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Data,
    ProcessList,
}

impl FileKind {
    fn label(&self) -> &'static str {
        match self {
            FileKind::Data => "data file",
            FileKind::ProcessList => "process list",
        }
    }
}

/// Finds and validates the files jobs are submitted with.
#[derive(Debug, Clone)]
pub struct FileService {
    data_extensions: Vec<String>,
    process_list_extensions: Vec<String>,
}

impl FileService {
    pub fn new(config: &FilesConfig) -> Self {
        let normalize = |exts: &[String]| -> Vec<String> {
            exts.iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect()
        };

        Self {
            data_extensions: normalize(&config.data_extensions),
            process_list_extensions: normalize(&config.process_list_extensions),
        }
    }

    fn extensions(&self, kind: FileKind) -> &[String] {
        match kind {
            FileKind::Data => &self.data_extensions,
            FileKind::ProcessList => &self.process_list_extensions,
        }
    }

    fn has_kind_extension(&self, path: &Path, kind: FileKind) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions(kind).iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// True when `path` is an existing regular file of the given kind.
    pub fn is_valid(&self, path: &Path, kind: FileKind) -> bool {
        path.is_file() && self.has_kind_extension(path, kind)
    }

    /// Resolve a user supplied path and check it is a file of `kind`.
    pub fn validate(&self, user_path: &str, kind: FileKind) -> AppResult<PathBuf> {
        if user_path.trim().is_empty() {
            return Err(AppError::NotFound(format!("No {} given", kind.label())));
        }

        let path = absolute_path(user_path);
        if self.is_valid(&path, kind) {
            Ok(path)
        } else {
            Err(AppError::NotFound(format!("'{}' is not a valid {}", path.display(), kind.label())))
        }
    }

    /// Every file of `kind` below `user_path`, sorted.
    ///
    /// Walks the file system synchronously; call it from a blocking task.
    pub fn find_files(&self, user_path: &str, kind: FileKind) -> FileListing {
        let root = absolute_path(user_path);

        let mut files: Vec<String> = WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(root = %root.display(), "Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && self.has_kind_extension(entry.path(), kind))
            .map(|entry| entry.path().display().to_string())
            .collect();
        files.sort();

        FileListing {
            path: root.display().to_string(),
            files,
        }
    }

    /// Delete a process list file.
    pub async fn delete_process_list(&self, filename: &str) -> AppResult<DeletedFile> {
        let path = self.validate(filename, FileKind::ProcessList)?;
        tokio::fs::remove_file(&path).await?;

        tracing::info!(path = %path.display(), "Process list deleted");
        Ok(DeletedFile {
            filename: path.display().to_string(),
        })
    }

    /// Raw bytes of a process list file.
    pub async fn read_process_list(&self, filename: &str) -> AppResult<(PathBuf, Vec<u8>)> {
        let path = self.validate(filename, FileKind::ProcessList)?;
        let bytes = tokio::fs::read(&path).await?;
        Ok((path, bytes))
    }
}
