pub const SUCCESS_MESSAGE: &str = "Face verification successful!";
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Server rejection codes and the text shown to the operator
const ERROR_MESSAGES: &[(&str, &str)] = &[
    ("Missing 'image' in request", "No image sent with the request."),
    ("Image decoding failed", "There was an issue decoding the image."),
    (
        "Multiple faces detected. Only one face is allowed.",
        "Multiple faces detected, only one is allowed.",
    ),
    ("No valid face detected", "No face detected in the image."),
];

pub fn error_message(code: Option<&str>) -> &'static str {
    code.and_then(|code| {
        ERROR_MESSAGES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, message)| *message)
    })
    .unwrap_or(UNKNOWN_ERROR_MESSAGE)
}
