pub mod todo;

use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use serenity::async_trait;
use serenity::builder::CreateApplicationCommand;
use serenity::http::Http;
use serenity::model::application::command::Command;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::model::id::GuildId;
use serenity::prelude::Context;

use crate::error::BotError;

/// One application command together with the interactions it owns.
#[async_trait]
pub trait SlashCommand: Send + Sync {
    fn name(&self) -> &'static str;

    fn register<'a>(
        &self,
        command: &'a mut CreateApplicationCommand,
    ) -> &'a mut CreateApplicationCommand;

    async fn run(&self, ctx: &Context, command: &ApplicationCommandInteraction);

    /// Whether a submitted modal with this custom id belongs to the command.
    fn handles_modal(&self, _custom_id: &str) -> bool {
        false
    }

    async fn submit(&self, _ctx: &Context, modal: &ModalSubmitInteraction) {
        warn!("{} does not accept modal {}", self.name(), modal.data.custom_id);
    }
}

/// Read-only lookup from command name to its handler.
#[derive(Default)]
pub struct CommandSet {
    commands: HashMap<&'static str, Box<dyn SlashCommand>>,
}

impl CommandSet {
    pub fn with(mut self, command: impl SlashCommand + 'static) -> Self {
        self.commands.insert(command.name(), Box::new(command));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn SlashCommand> {
        self.commands.get(name).map(Box::as_ref)
    }

    pub fn modal_handler(&self, custom_id: &str) -> Option<&dyn SlashCommand> {
        self.commands
            .values()
            .find(|command| command.handles_modal(custom_id))
            .map(Box::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SlashCommand> {
        self.commands.values().map(Box::as_ref)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    Global,
    Guild(GuildId),
}

/// Creates every command in `commands`, giving up at the first failure.
pub async fn register_all(
    http: &Arc<Http>,
    scope: CommandScope,
    commands: &CommandSet,
) -> Result<Vec<Command>, BotError> {
    let mut registered = Vec::new();

    for command in commands.iter() {
        let created = match scope {
            CommandScope::Global => {
                Command::create_global_application_command(http, |c| command.register(c)).await
            }
            CommandScope::Guild(guild_id) => {
                guild_id
                    .create_application_command(http, |c| command.register(c))
                    .await
            }
        };
        let created = created.map_err(|source| BotError::Register {
            name: command.name(),
            source,
        })?;

        info!("Registered /{} ({})", created.name, created.id);
        registered.push(created);
    }
    Ok(registered)
}

pub async fn deregister_all(
    http: &Arc<Http>,
    scope: CommandScope,
    registered: &[Command],
) -> Result<(), BotError> {
    for command in registered {
        let deleted = match scope {
            CommandScope::Global => Command::delete_global_application_command(http, command.id).await,
            CommandScope::Guild(guild_id) => guild_id.delete_application_command(http, command.id).await,
        };
        deleted.map_err(|source| BotError::Deregister {
            name: command.name.clone(),
            source,
        })?;

        info!("Removed /{}", command.name);
    }
    Ok(())
}
