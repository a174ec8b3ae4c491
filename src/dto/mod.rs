pub mod files_dto;
pub mod job_dto;
pub mod ws_dto;

pub use files_dto::{DeletedFile, FileListing, FilenameQuery, PathQuery, PluginQuery};
pub use job_dto::{JobStatusPayload, QueueListResponse, SubmitJobQuery};
pub use ws_dto::{ClientEvent, JobTopicRequest, ServerEvent, WsErrorPayload};
