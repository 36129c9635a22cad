use crate::error::RtokenError;

pub fn exit_code_for_error(err: &RtokenError) -> i32 {
    match err {
        RtokenError::Config(_) => 2,
        RtokenError::InvalidUrl(_) => 3,
        RtokenError::Browser(_) => 4,
        RtokenError::BrowserClosed => 5,
        RtokenError::EmptyStore(_) => 6,
        RtokenError::Io(_) | RtokenError::Store(_) => 23,
        RtokenError::Json(_) => 26,
        RtokenError::Timeout => 28,
        RtokenError::FileNotFound(_) => 37,
    }
}
