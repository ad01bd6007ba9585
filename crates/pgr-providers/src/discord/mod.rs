//! Discord integration

mod oauth;
mod roles;

pub use oauth::DiscordOAuthClient;
pub use roles::DiscordRoleClient;

const PROVIDER: &str = "discord";
