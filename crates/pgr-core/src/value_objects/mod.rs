//! Value objects - immutable types that represent domain concepts

mod access_level;
mod discord_id;
mod subscription_status;

pub use access_level::{AccessLevel, ParseAccessLevelError};
pub use discord_id::is_discord_snowflake;
pub use subscription_status::{is_final_status, AccessEffect};
