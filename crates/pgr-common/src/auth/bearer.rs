//! Bearer token extraction from an `Authorization` header value

const SCHEME: &str = "bearer";

/// Pull the token out of an `Authorization` header value.
///
/// Accepts `Bearer <token>` with any casing of the scheme and tolerates the
/// scheme being repeated (`Bearer Bearer <token>`), which some API consoles
/// produce when the user pastes the full header into a token field.
/// Returns `None` when the scheme is not bearer or no token remains.
#[must_use]
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    let mut rest = strip_scheme(header_value.trim())?;
    while let Some(inner) = strip_scheme(rest) {
        rest = inner;
    }
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return None;
    }
    Some(rest)
}

fn strip_scheme(value: &str) -> Option<&str> {
    let (scheme, rest) = value.split_once(char::is_whitespace)?;
    scheme
        .eq_ignore_ascii_case(SCHEME)
        .then(|| rest.trim_start())
}
