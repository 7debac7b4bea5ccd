use std::sync::LazyLock;

use rand::Rng;

use crate::errors::HuddleError;

static CODE_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[a-z]{3}-[a-z]{4}-[a-z]{3}$").unwrap());

const GROUPS: [usize; 3] = [3, 4, 3];

/// A fresh meeting code shaped like `abc-defg-hij`.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    GROUPS
        .iter()
        .map(|&len| {
            (0..len)
                .map(|_| rng.gen_range(b'a'..=b'z') as char)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Extract and validate a meeting code from user input.
/// Accepts a full link (`https://meet.example.com/abc-defg-hij`) or a bare code.
pub fn extract_code(input: &str) -> Result<String, HuddleError> {
    let input = input.trim().trim_end_matches('/');
    let candidate = input.rsplit('/').next().unwrap_or("");
    if CODE_RE.is_match(candidate) {
        Ok(candidate.to_string())
    } else {
        Err(HuddleError::InvalidCode(format!(
            "invalid meeting code format: '{candidate}'"
        )))
    }
}
