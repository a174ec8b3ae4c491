pub mod paths;
pub mod validation;

pub use paths::absolute_path;
pub use validation::validate_request;
