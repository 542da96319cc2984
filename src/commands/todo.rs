use chrono::NaiveDate;
use log::{debug, error, info};
use serenity::async_trait;
use serenity::builder::{CreateApplicationCommand, CreateComponents, CreateInteractionResponse};
use serenity::model::application::component::{ActionRow, ActionRowComponent, InputTextStyle};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::{Channel, ChannelType, GuildChannel};
use serenity::model::id::{ChannelId, UserId};
use serenity::prelude::Context;
use thiserror::Error;

use super::SlashCommand;
use crate::date::{format_deadline, parse_deadline, InvalidDate};

pub const NAME: &str = "todo";
const MODAL_TITLE: &str = "Create new todo";
const TITLE_MAX_LENGTH: u64 = 300;
const DEADLINE_LENGTH: u64 = 10;
/// Longest channel name Discord accepts.
pub const CHANNEL_NAME_MAX_LENGTH: usize = 100;

/// Everything that can go wrong with a single `/todo`. The message is sent
/// back to the user verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TodoError {
    #[error("I have failed you master...an error has occurred")]
    Lookup,

    #[error("todo can only be called in {expected} not {actual}")]
    WrongChannel { expected: String, actual: String },

    #[error("todos can only be created inside a server")]
    NotInGuild,

    #[error("the todo form is missing its {0}")]
    MissingField(&'static str),

    #[error("title should be longer than 1")]
    TitleTooShort,

    #[error("Date is invalid {0} is not a proper date")]
    InvalidDate(String),

    #[error("I could not create a channel for this todo")]
    ChannelCreation,
}

impl From<InvalidDate> for TodoError {
    fn from(err: InvalidDate) -> Self {
        TodoError::InvalidDate(err.input)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRequest {
    pub title: String,
    pub deadline: NaiveDate,
}

impl TodoRequest {
    /// The title is checked first, so a short title is reported even when
    /// the deadline is also bad. Its length is counted in characters, not
    /// bytes, so a lone multi-byte character such as `é` is still too short.
    pub fn new(title: &str, deadline: &str) -> Result<Self, TodoError> {
        if title.chars().count() <= 1 {
            return Err(TodoError::TitleTooShort);
        }
        let deadline = parse_deadline(deadline)?;

        Ok(Self {
            title: title.to_string(),
            deadline,
        })
    }

    /// `<title> (<deadline>)`, with the title cut short when the whole name
    /// would not fit in a Discord channel name.
    pub fn channel_name(&self) -> String {
        let deadline = format!(" ({})", format_deadline(self.deadline));
        let room = CHANNEL_NAME_MAX_LENGTH.saturating_sub(deadline.chars().count());

        if self.title.chars().count() <= room {
            return format!("{}{}", self.title, deadline);
        }
        let title: String = self.title.chars().take(room).collect();
        format!("{}{}", title.trim_end(), deadline)
    }
}

pub struct TodoCommand {
    channel: String,
}

impl TodoCommand {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    fn check_channel(&self, actual: &str) -> Result<(), TodoError> {
        if actual == self.channel {
            Ok(())
        } else {
            Err(TodoError::WrongChannel {
                expected: self.channel.clone(),
                actual: actual.to_string(),
            })
        }
    }

    async fn create_channel(
        &self,
        ctx: &Context,
        modal: &ModalSubmitInteraction,
        todo: &TodoRequest,
    ) -> Result<GuildChannel, TodoError> {
        let guild_id = modal.guild_id.ok_or(TodoError::NotInGuild)?;
        let name = todo.channel_name();

        guild_id
            .create_channel(&ctx.http, |channel| channel.name(&name).kind(ChannelType::Text))
            .await
            .map_err(|why| {
                error!("Cannot create channel {:?} in {}: {}", name, guild_id, why);
                TodoError::ChannelCreation
            })
    }
}

#[async_trait]
impl SlashCommand for TodoCommand {
    fn name(&self) -> &'static str {
        NAME
    }

    fn register<'a>(
        &self,
        command: &'a mut CreateApplicationCommand,
    ) -> &'a mut CreateApplicationCommand {
        command
            .name(NAME)
            .description("Create a new todo (creates a new channel under todo)")
    }

    async fn run(&self, ctx: &Context, command: &ApplicationCommandInteraction) {
        let allowed = match command.channel_id.to_channel(ctx).await {
            Ok(channel) => self.check_channel(channel_name(&channel)),
            Err(why) => {
                error!("Cannot look up channel {}: {}", command.channel_id, why);
                Err(TodoError::Lookup)
            }
        };

        let result = match allowed {
            Ok(()) => {
                command
                    .create_interaction_response(&ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::Modal)
                            .interaction_response_data(|modal| {
                                modal
                                    .custom_id(modal_id(command.user.id))
                                    .title(MODAL_TITLE)
                                    .components(modal_rows)
                            })
                    })
                    .await
            }
            Err(reason) => {
                info!("Refused /{} from {}: {}", NAME, command.user.name, reason);
                let refusal = Reply::refused(&reason);
                command
                    .create_interaction_response(&ctx.http, |response| reply(response, refusal))
                    .await
            }
        };

        if let Err(why) = result {
            error!("Cannot respond to slash command: {}", why);
        }
    }

    fn handles_modal(&self, custom_id: &str) -> bool {
        custom_id.starts_with(NAME)
    }

    async fn submit(&self, ctx: &Context, modal: &ModalSubmitInteraction) {
        debug!("Received todo modal {}", modal.data.custom_id);

        let created = match todo_from_rows(&modal.data.components) {
            Ok(todo) => self.create_channel(ctx, modal, &todo).await,
            Err(reason) => Err(reason),
        };

        let result = match created {
            Ok(channel) => {
                info!("Created todo channel {} ({})", channel.name, channel.id);
                let created = Reply::created(channel.id);
                modal
                    .create_interaction_response(&ctx.http, |response| reply(response, created))
                    .await
            }
            Err(reason) => {
                info!("Rejected todo {}: {}", modal.data.custom_id, reason);
                let refusal = Reply::refused(&reason);
                modal
                    .create_interaction_response(&ctx.http, |response| reply(response, refusal))
                    .await
            }
        };

        if let Err(why) = result {
            error!("Cannot respond to modal {}: {}", modal.data.custom_id, why);
        }
    }
}

fn modal_id(user: UserId) -> String {
    format!("{}_{}", NAME, user)
}

fn modal_rows(rows: &mut CreateComponents) -> &mut CreateComponents {
    rows.create_action_row(|row| {
        row.create_input_text(|input| {
            input
                .custom_id("Title")
                .label("Title")
                .placeholder("Name of your todo")
                .style(InputTextStyle::Short)
                .required(true)
                .max_length(TITLE_MAX_LENGTH)
        })
    })
    .create_action_row(|row| {
        row.create_input_text(|input| {
            input
                .custom_id("Deadline")
                .label("YYYY-MM-DD format please")
                .style(InputTextStyle::Short)
                .required(true)
                .min_length(DEADLINE_LENGTH)
                .max_length(DEADLINE_LENGTH)
        })
    })
}

fn channel_name(channel: &Channel) -> &str {
    match channel {
        Channel::Guild(channel) => &channel.name,
        Channel::Category(category) => &category.name,
        _ => "a direct message",
    }
}

/// A plain message answering an interaction. Refusals are only shown to the
/// user who asked.
#[derive(Debug, PartialEq, Eq)]
struct Reply {
    content: String,
    ephemeral: bool,
}

impl Reply {
    fn created(channel: ChannelId) -> Self {
        Self {
            content: format!("Created <#{}> for your todo", channel),
            ephemeral: false,
        }
    }

    fn refused(reason: &TodoError) -> Self {
        Self {
            content: reason.to_string(),
            ephemeral: true,
        }
    }
}

fn reply<'a, 'b>(
    response: &'b mut CreateInteractionResponse<'a>,
    answer: Reply,
) -> &'b mut CreateInteractionResponse<'a> {
    response
        .kind(InteractionResponseType::ChannelMessageWithSource)
        .interaction_response_data(|message| {
            message.content(answer.content).ephemeral(answer.ephemeral)
        })
}

/// Fields are read by position: title in the first row, deadline in the second.
fn todo_from_rows(rows: &[ActionRow]) -> Result<TodoRequest, TodoError> {
    let title = input_value(rows, 0).ok_or(TodoError::MissingField("title"))?;
    let deadline = input_value(rows, 1).ok_or(TodoError::MissingField("deadline"))?;
    TodoRequest::new(title, deadline)
}

fn input_value(rows: &[ActionRow], index: usize) -> Option<&str> {
    match rows.get(index)?.components.first()? {
        ActionRowComponent::InputText(input) => Some(input.value.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{json, Value};

    fn rows(title: &str, deadline: &str) -> Vec<ActionRow> {
        serde_json::from_value(json!([
            {"type": 1, "components": [{"type": 4, "custom_id": "Title", "value": title}]},
            {"type": 1, "components": [{"type": 4, "custom_id": "Deadline", "value": deadline}]},
        ]))
        .unwrap()
    }

    #[test]
    fn builds_channel_name_from_title_and_deadline() {
        let todo = TodoRequest::new("My task", "2024-01-01").unwrap();
        assert_eq!(todo.channel_name(), "My task (Monday 1st January 2024)");
    }

    #[test]
    fn rejects_invalid_date() {
        assert_eq!(
            TodoRequest::new("X2", "2024-13-40"),
            Err(TodoError::InvalidDate("2024-13-40".to_string()))
        );
    }

    #[rstest]
    #[case("", "2024-01-01")]
    #[case("X", "2024-01-01")]
    #[case("X", "2024-13-40")]
    #[case("é", "not a date")]
    fn rejects_short_titles_before_dates(#[case] title: &str, #[case] deadline: &str) {
        assert_eq!(TodoRequest::new(title, deadline), Err(TodoError::TitleTooShort));
    }

    #[test]
    fn counts_title_length_in_characters() {
        assert!(TodoRequest::new("éé", "2024-01-01").is_ok());
    }

    #[test]
    fn error_messages_match_user_replies() {
        assert_eq!(
            TodoError::InvalidDate("2024-13-40".to_string()).to_string(),
            "Date is invalid 2024-13-40 is not a proper date"
        );
        assert_eq!(TodoError::TitleTooShort.to_string(), "title should be longer than 1");
    }

    #[test]
    fn only_the_configured_channel_may_open_the_modal() {
        let command = TodoCommand::new("main");
        assert_eq!(command.check_channel("main"), Ok(()));

        let refused = command.check_channel("general").unwrap_err();
        assert_eq!(refused.to_string(), "todo can only be called in main not general");
    }

    #[test]
    fn handles_todo_prefixed_modals_only() {
        let command = TodoCommand::new("main");
        assert!(command.handles_modal(&modal_id(UserId(80351110224678912))));
        assert!(command.handles_modal("todo"));
        assert!(!command.handles_modal("poll_80351110224678912"));
    }

    #[test]
    fn modal_id_carries_the_user() {
        assert_eq!(modal_id(UserId(42)), "todo_42");
    }

    #[test]
    fn reads_modal_fields_by_position() {
        let todo = todo_from_rows(&rows("My task", "2024-01-01")).unwrap();
        assert_eq!(todo.title, "My task");
        assert_eq!(todo.deadline, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn validates_modal_fields() {
        assert_eq!(
            todo_from_rows(&rows("X", "2024-13-40")),
            Err(TodoError::TitleTooShort)
        );
        assert_eq!(
            todo_from_rows(&rows("Ship it", "2024-13-40")),
            Err(TodoError::InvalidDate("2024-13-40".to_string()))
        );
    }

    #[test]
    fn missing_rows_are_reported() {
        let mut rows = rows("My task", "2024-01-01");
        rows.truncate(1);
        assert_eq!(todo_from_rows(&rows), Err(TodoError::MissingField("deadline")));
        assert_eq!(todo_from_rows(&[]), Err(TodoError::MissingField("title")));
    }

    #[test]
    fn registers_todo_descriptor() {
        let mut builder = CreateApplicationCommand::default();
        TodoCommand::new("main").register(&mut builder);

        assert_eq!(builder.0.get("name"), Some(&json!("todo")));
        assert_eq!(
            builder.0.get("description"),
            Some(&json!("Create a new todo (creates a new channel under todo)"))
        );
    }

    #[test]
    fn modal_asks_for_title_then_deadline() {
        let mut components = CreateComponents::default();
        modal_rows(&mut components);

        let inputs: Vec<&Value> = components
            .0
            .iter()
            .map(|row| &row["components"][0])
            .collect();
        assert_eq!(inputs.len(), 2);

        assert_eq!(inputs[0]["custom_id"], "Title");
        assert_eq!(inputs[0]["max_length"], 300);
        assert_eq!(inputs[0]["required"], true);

        assert_eq!(inputs[0]["label"], "Title");
        assert_eq!(inputs[0]["placeholder"], "Name of your todo");

        assert_eq!(inputs[1]["custom_id"], "Deadline");
        assert_eq!(inputs[1]["label"], "YYYY-MM-DD format please");
        assert_eq!(inputs[1]["min_length"], 10);
        assert_eq!(inputs[1]["max_length"], 10);
        assert_eq!(inputs[1]["required"], true);
    }

    #[test]
    fn direct_messages_are_refused_by_name() {
        let channel: Channel = serde_json::from_value(json!({
            "id": "381880193251409931",
            "type": 1,
            "recipients": [{
                "id": "80351110224678912",
                "username": "Nelly",
                "discriminator": "1337",
                "avatar": null
            }]
        }))
        .unwrap();

        assert_eq!(channel_name(&channel), "a direct message");
        assert_eq!(
            TodoCommand::new("main").check_channel(channel_name(&channel)).unwrap_err().to_string(),
            "todo can only be called in main not a direct message"
        );
    }

    #[test]
    fn categories_are_refused_by_their_name() {
        let channel: Channel = serde_json::from_value(json!({
            "id": "41771983423143937",
            "guild_id": "290926798626357999",
            "type": 4,
            "name": "planning",
            "position": 0,
            "permission_overwrites": [],
            "parent_id": null,
            "nsfw": false
        }))
        .unwrap();

        assert_eq!(channel_name(&channel), "planning");
        assert_eq!(
            TodoCommand::new("main").check_channel(channel_name(&channel)),
            Err(TodoError::WrongChannel {
                expected: "main".to_string(),
                actual: "planning".to_string(),
            })
        );
    }

    #[test]
    fn refusals_are_ephemeral() {
        let refusal = Reply::refused(&TodoError::TitleTooShort);
        assert!(refusal.ephemeral);
        assert_eq!(refusal.content, "title should be longer than 1");
    }

    #[test]
    fn confirmation_is_visible_and_links_the_channel() {
        assert_eq!(
            Reply::created(ChannelId(41771983423143937)),
            Reply {
                content: "Created <#41771983423143937> for your todo".to_string(),
                ephemeral: false,
            }
        );
    }

    #[test]
    fn reply_sends_a_channel_message() {
        let mut response = CreateInteractionResponse::default();
        reply(&mut response, Reply::refused(&TodoError::Lookup));

        assert_eq!(response.0.get("type"), Some(&json!(4)));
    }

    #[test]
    fn long_titles_are_cut_to_fit_a_channel_name() {
        let title = "a".repeat(300);
        let todo = TodoRequest::new(&title, "2024-01-01").unwrap();
        let name = todo.channel_name();

        assert_eq!(name.chars().count(), CHANNEL_NAME_MAX_LENGTH);
        assert!(name.starts_with("aaaa"));
        assert!(name.ends_with(" (Monday 1st January 2024)"));
    }

    #[test]
    fn cut_titles_do_not_end_in_spaces() {
        let title = format!("{} {}", "a".repeat(73), "b".repeat(200));
        let todo = TodoRequest::new(&title, "2024-01-01").unwrap();

        assert_eq!(
            todo.channel_name(),
            format!("{} (Monday 1st January 2024)", "a".repeat(73))
        );
    }

    #[test]
    fn titles_that_fit_are_kept_whole() {
        let title = "b".repeat(74);
        let todo = TodoRequest::new(&title, "2024-01-01").unwrap();

        assert_eq!(todo.channel_name().chars().count(), CHANNEL_NAME_MAX_LENGTH);
        assert!(todo.channel_name().starts_with(&title));
    }
}
