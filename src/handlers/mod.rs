pub mod file_handler;
pub mod health_handler;
pub mod job_handler;
pub mod plugin_handler;
pub mod ws_handler;

pub use file_handler::{default_paths, delete_process_list, download_process_list, find_data, list_process_lists};
pub use health_handler::health_check;
pub use job_handler::{get_job_status, list_queues, submit_job};
pub use plugin_handler::{get_plugin, list_plugins};
pub use ws_handler::job_status_socket;
