use clap::Parser;
use serenity::model::id::GuildId;

use crate::commands::CommandScope;

/// Discord bot that turns `/todo` submissions into channels.
#[derive(Debug, Clone, Parser)]
#[command(name = "todo-bot", version)]
pub struct Config {
    /// Bot token
    #[arg(short = 't', long = "token", env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Register commands in this guild only instead of globally
    #[arg(short = 'g', long = "guild", env = "GUILD_ID")]
    pub guild_id: Option<u64>,

    /// Channel /todo has to be invoked from
    #[arg(short = 'c', long = "channel", env = "TODO_CHANNEL", default_value = "main")]
    pub todo_channel: String,
}

impl Config {
    pub fn scope(&self) -> CommandScope {
        match self.guild_id {
            Some(id) => CommandScope::Guild(GuildId(id)),
            None => CommandScope::Global,
        }
    }
}
