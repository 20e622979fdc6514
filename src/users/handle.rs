use lazy_static::lazy_static;
use regex::Regex;

/// Handles are 3-30 chars of `[a-z0-9_-]`, starting with a letter or digit.
pub fn is_valid_handle(candidate: &str) -> bool {
    lazy_static! {
        static ref HANDLE_RE: Regex = Regex::new(r"^[a-z0-9][a-z0-9_-]{2,29}$").unwrap();
    }
    HANDLE_RE.is_match(candidate)
}
