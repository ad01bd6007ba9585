//! Discord snowflake ids as they arrive from clients

/// Longest decimal rendering of a 64-bit snowflake
const MAX_SNOWFLAKE_DIGITS: usize = 20;

/// Whether a string looks like a Discord user id (decimal snowflake)
#[must_use]
pub fn is_discord_snowflake(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_SNOWFLAKE_DIGITS
        && value.bytes().all(|b| b.is_ascii_digit())
}
