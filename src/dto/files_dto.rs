use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct PathQuery {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilenameQuery {
    pub filename: Option<String>,
}

/// Files of one kind found below a directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListing {
    pub path: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedFile {
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginQuery {
    pub query: Option<String>,
}
