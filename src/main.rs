mod commands;
mod config;
mod date;
mod error;

use std::future::Future;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tokio::sync::Notify;

use commands::todo::TodoCommand;
use commands::CommandSet;
use config::Config;
use error::BotError;

struct Bot {
    commands: Arc<CommandSet>,
}

fn command_set(config: &Config) -> CommandSet {
    CommandSet::default().with(TodoCommand::new(config.todo_channel.clone()))
}

#[async_trait]
impl EventHandler for Bot {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                debug!("Received command interaction: {:#?}", command);

                match self.commands.get(&command.data.name) {
                    Some(handler) => handler.run(&ctx, &command).await,
                    None => warn!("No handler for /{}", command.data.name),
                }
            }
            Interaction::ModalSubmit(modal) => {
                debug!("Received modal submission: {:#?}", modal);

                if let Some(handler) = self.commands.modal_handler(&modal.data.custom_id) {
                    handler.submit(&ctx, &modal).await;
                }
            }
            _ => {}
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
    }
}

#[tokio::main]
async fn main() {
    // Load .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    if let Err(why) = run(config).await {
        error!("{}", why);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), BotError> {
    // Commands are created before the gateway starts, so the application id
    // has to be known up front.
    let application = Http::new(&config.token).get_current_application_info().await?;

    let handlers = Arc::new(command_set(&config));
    let bot = Bot {
        commands: handlers.clone(),
    };
    let scope = config.scope();

    let mut client = Client::builder(&config.token, GatewayIntents::GUILDS)
        .application_id(application.id.0)
        .event_handler(bot)
        .await?;

    let http = client.cache_and_http.http.clone();
    let shard_manager = client.shard_manager.clone();

    info!("Adding commands...");
    let registered = commands::register_all(&http, scope, &handlers).await?;

    // `client.start()` only returns once `shutdown_all` has stopped the shards.
    let client_stopped = Arc::new(Notify::new());
    let shutdown = tokio::spawn({
        let client_stopped = client_stopped.clone();
        async move {
            stop_requested(shutdown_signal(), &client_stopped).await;

            info!("Removing commands...");
            let removed = commands::deregister_all(&http, scope, &registered).await;

            shard_manager.lock().await.shutdown_all().await;
            removed
        }
    });

    info!("Bot is now running. Press CTRL-C to exit.");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
    client_stopped.notify_one();

    shutdown.await?
}

/// Resolves on `signal`, or once the client has stopped by itself.
async fn stop_requested(signal: impl Future<Output = ()>, client_stopped: &Notify) {
    tokio::select! {
        () = signal => info!("Shutdown requested"),
        () = client_stopped.notified() => info!("Client stopped"),
    }
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(why) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for CTRL-C: {}", why);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(why) => {
                error!("Cannot listen for SIGTERM: {}", why);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}
