use validator::Validate;

use crate::interceptors::AppError;

/// Run the `validator` rules of a request DTO.
///
/// All field failures are folded into one `ValidationError`, fields in
/// alphabetical order so the message is stable.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request.validate().map_err(|e| {
        let mut fields: Vec<String> = e
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let messages: Vec<String> = errors
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect();
        fields.sort();

        AppError::ValidationError(fields.join("; "))
    })
}
