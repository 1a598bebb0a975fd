//! Telegram command dispatch for group operators.
//!
//! [`CommandDispatcher`] holds everything a command needs to act on the
//! engine, plus the per-chat prompt state for the two-step flows
//! (`/addtoken`, `/startcomp`, `/setemoji`): the command arms a prompt,
//! and the next message from a group admin answers it.
//!
//! Replies here are plain text sent directly to the chat; contest
//! notices (kickoff, buy alerts, endings) go through the notifier
//! instead.

use std::sync::Arc;

use dashmap::DashMap;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, Chat, ParseMode};
use tracing::{error, info, warn};

use crate::app::config::ContestConfig;
use crate::domain::error::ContestError;
use crate::domain::group::GroupDirectory;
use crate::domain::id::{Address, GroupId};
use crate::domain::registry::ContestRegistry;
use crate::error::Error;
use crate::port::outbound::locator::PoolLocator;
use crate::port::outbound::resolver::AddressResolver;
use crate::service::{ContestLifecycle, End};

use super::command::{
    bot_commands, command_help, parse_command, CommandParseError, TelegramCommand,
};
use super::format;

/// Replies sent by the command surface.
pub mod replies {
    pub const ONLY_ADMIN: &str = "This command only can be used by admins";
    pub const ONLY_GROUPS: &str = "Please first add me to a group and make me an administrator";
    pub const GROUP_ADDED: &str = "Group successfully added";
    pub const GROUP_EXISTS: &str =
        "This group has already been added and started successfully, try another command.";
    pub const INIT_GROUP: &str = "First initialise the bot with the /start command";
    pub const SEND_TOKEN: &str = "Please send the jetton token address";
    pub const TOKEN_EXISTS: &str =
        "You already have a jetton address, please delete it and add the new one.";
    pub const INVALID_TOKEN: &str = "Invalid jetton, please check and try again";
    pub const NO_POOLS: &str =
        "No TON pool found for that jetton on STON.fi or DeDust, please check and try again";
    pub const TOKEN_ADDED: &str = "New jetton address successfully added.";
    pub const TOKEN_REMOVED: &str = "Token removed successfully";
    pub const NOTHING_TO_DELETE: &str = "Nothing to delete";
    pub const COMP_ACTIVE: &str = "This group already has an active competition, \
        please wait for it to stop or stop manually with /stopcomp.";
    pub const NO_TOKEN: &str = "I'm sorry this group doesn't have a valid jetton address.";
    pub const INVALID_HOURS: &str =
        "Invalid hours format for the competition, check and try again.";
    pub const COMP_NOT_ACTIVE: &str = "Sorry, the group has no active competition.";
    pub const SEND_EMOJI: &str = "Cool, send the new emoji.";
    pub const EMOJI_ADDED: &str = "The emoji has been changed.";
    pub const EMPTY_LIST: &str = "The list of competitors is empty.";
    pub const PURCHASE_REMOVED: &str = "The purchase has been removed";
    pub const NO_PURCHASE: &str = "No standing purchase for that wallet";
    pub const REMOVE_BUYER_USAGE: &str =
        "Please provide the buyer's address. Usage: /removebuyer <address>";
    pub const UNEXPECTED: &str = "Unexpected error, please try again.";
    pub const FALLBACK: &str =
        "I'm sorry, I didn't get your message. please contact with admins for more info";
}

/// Which answer the next admin message in a chat is taken as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingPrompt {
    Token,
    Duration,
    Emoji,
}

/// Stateful command handling shared by every update the bot receives.
pub struct CommandDispatcher {
    directory: Arc<GroupDirectory>,
    registry: Arc<ContestRegistry>,
    lifecycle: Arc<ContestLifecycle>,
    resolver: Arc<dyn AddressResolver>,
    locator: Arc<dyn PoolLocator>,
    contest: ContestConfig,
    pending: DashMap<GroupId, PendingPrompt>,
}

impl CommandDispatcher {
    /// Wire the dispatcher to the engine.
    #[must_use]
    pub fn new(
        directory: Arc<GroupDirectory>,
        registry: Arc<ContestRegistry>,
        lifecycle: Arc<ContestLifecycle>,
        resolver: Arc<dyn AddressResolver>,
        locator: Arc<dyn PoolLocator>,
        contest: ContestConfig,
    ) -> Self {
        Self {
            directory,
            registry,
            lifecycle,
            resolver,
            locator,
            contest,
            pending: DashMap::new(),
        }
    }

    /// Route one incoming message.
    pub async fn handle_message(&self, bot: &Bot, msg: &Message) {
        let Some(text) = msg.text() else { return };
        let group = GroupId::new(msg.chat.id.0);

        match parse_command(text) {
            Ok(command) => self.handle_command(bot, msg, group, command).await,
            Err(CommandParseError::MissingArgument(_)) => {
                send(bot, msg.chat.id, replies::REMOVE_BUYER_USAGE).await;
            }
            Err(CommandParseError::UnknownCommand(_)) => {
                // Groups see other bots' commands too; only answer
                // confusion in a private chat.
                if msg.chat.is_private() {
                    send(bot, msg.chat.id, replies::FALLBACK).await;
                }
            }
            Err(CommandParseError::NotACommand) => {
                if is_group_chat(&msg.chat) {
                    self.handle_prompt_reply(bot, msg, group, text).await;
                }
            }
        }
    }

    async fn handle_command(
        &self,
        bot: &Bot,
        msg: &Message,
        group: GroupId,
        command: TelegramCommand,
    ) {
        let chat = msg.chat.id;

        if command == TelegramCommand::Help {
            send(bot, chat, command_help()).await;
            return;
        }

        if !is_group_chat(&msg.chat) {
            send(bot, chat, replies::ONLY_GROUPS).await;
            return;
        }

        // /list is open to everyone in the group.
        if command == TelegramCommand::List {
            self.send_standings(bot, chat, group).await;
            return;
        }

        let Some(user) = msg.from.as_ref() else { return };
        if !is_chat_admin(bot, chat, user.id).await {
            send(bot, chat, replies::ONLY_ADMIN).await;
            return;
        }

        match command {
            TelegramCommand::Start => self.register_group(bot, chat, group).await,
            TelegramCommand::AddToken => self.prompt_for_token(bot, chat, group).await,
            TelegramCommand::RemoveToken => self.remove_token(bot, chat, group).await,
            TelegramCommand::StartComp => self.prompt_for_duration(bot, chat, group).await,
            TelegramCommand::StopComp => self.stop_contest(bot, chat, group).await,
            TelegramCommand::RemoveBuyer { wallet } => {
                self.remove_buyer(bot, chat, group, &wallet).await;
            }
            TelegramCommand::SetEmoji => self.prompt_for_emoji(bot, chat, group).await,
            TelegramCommand::List | TelegramCommand::Help => {}
        }
    }

    async fn register_group(&self, bot: &Bot, chat: ChatId, group: GroupId) {
        if self.directory.register(group) {
            info!(group = %group, "Group registered");
            send(bot, chat, replies::GROUP_ADDED).await;
        } else {
            send(bot, chat, replies::GROUP_EXISTS).await;
        }
    }

    async fn prompt_for_token(&self, bot: &Bot, chat: ChatId, group: GroupId) {
        let Some(profile) = self.directory.get(group) else {
            send(bot, chat, replies::INIT_GROUP).await;
            return;
        };
        if profile.token.is_some() {
            send(bot, chat, replies::TOKEN_EXISTS).await;
            return;
        }
        self.pending.insert(group, PendingPrompt::Token);
        send(bot, chat, replies::SEND_TOKEN).await;
    }

    async fn remove_token(&self, bot: &Bot, chat: ChatId, group: GroupId) {
        let Some(profile) = self.directory.get(group) else {
            send(bot, chat, replies::INIT_GROUP).await;
            return;
        };
        if profile.token.is_none() {
            send(bot, chat, replies::NOTHING_TO_DELETE).await;
            return;
        }
        // A contest cannot outlive its token binding.
        if profile.contest_active {
            if let Err(err) = self.lifecycle.conclude(group, End::Manual).await {
                warn!(group = %group, %err, "Could not stop the contest while removing the token");
            }
        }
        if let Err(err) = self.directory.clear_token(group) {
            error!(group = %group, %err, "Failed to clear the token binding");
            send(bot, chat, replies::UNEXPECTED).await;
            return;
        }
        info!(group = %group, "Token binding removed");
        send(bot, chat, replies::TOKEN_REMOVED).await;
    }

    async fn prompt_for_duration(&self, bot: &Bot, chat: ChatId, group: GroupId) {
        let Some(profile) = self.directory.get(group) else {
            send(bot, chat, replies::INIT_GROUP).await;
            return;
        };
        if profile.contest_active {
            send(bot, chat, replies::COMP_ACTIVE).await;
            return;
        }
        if profile.token.is_none() {
            send(bot, chat, replies::NO_TOKEN).await;
            return;
        }
        self.pending.insert(group, PendingPrompt::Duration);
        send(bot, chat, &duration_prompt(&self.contest)).await;
    }

    async fn stop_contest(&self, bot: &Bot, chat: ChatId, group: GroupId) {
        if !self.directory.is_registered(group) {
            send(bot, chat, replies::INIT_GROUP).await;
            return;
        }
        match self.lifecycle.conclude(group, End::Manual).await {
            Ok(()) => send(bot, chat, format::ENDED_TEXT).await,
            Err(ContestError::NotActive { .. }) => {
                send(bot, chat, replies::COMP_NOT_ACTIVE).await;
            }
            Err(err) => {
                error!(group = %group, %err, "Manual stop failed");
                send(bot, chat, replies::UNEXPECTED).await;
            }
        }
    }

    async fn remove_buyer(&self, bot: &Bot, chat: ChatId, group: GroupId, wallet: &str) {
        if !self.directory.is_registered(group) {
            send(bot, chat, replies::INIT_GROUP).await;
            return;
        }
        match self.lifecycle.remove_buyer(group, &Address::new(wallet)) {
            Ok(_) => send(bot, chat, replies::PURCHASE_REMOVED).await,
            Err(ContestError::NotActive { .. }) => {
                send(bot, chat, replies::COMP_NOT_ACTIVE).await;
            }
            Err(ContestError::NoPurchase { .. }) => send(bot, chat, replies::NO_PURCHASE).await,
            Err(err) => {
                error!(group = %group, %err, "Buyer removal failed");
                send(bot, chat, replies::UNEXPECTED).await;
            }
        }
    }

    async fn prompt_for_emoji(&self, bot: &Bot, chat: ChatId, group: GroupId) {
        if !self.directory.is_registered(group) {
            send(bot, chat, replies::INIT_GROUP).await;
            return;
        }
        self.pending.insert(group, PendingPrompt::Emoji);
        send(bot, chat, replies::SEND_EMOJI).await;
    }

    async fn send_standings(&self, bot: &Bot, chat: ChatId, group: GroupId) {
        if !self.directory.is_registered(group) {
            send(bot, chat, replies::INIT_GROUP).await;
            return;
        }
        let Some(record) = self.registry.get(group) else {
            send(bot, chat, replies::EMPTY_LIST).await;
            return;
        };
        let top = record.leaderboard(self.contest.leaderboard_size);
        if top.is_empty() {
            send(bot, chat, replies::EMPTY_LIST).await;
            return;
        }
        let table = format::format_standings(&top, self.contest.leaderboard_size);
        if let Err(e) = bot
            .send_message(chat, table)
            .parse_mode(ParseMode::MarkdownV2)
            .await
        {
            error!(error = %e, "Failed to send Telegram standings");
        }
    }

    /// A non-command group message: the answer to a pending prompt, or
    /// just chatter.
    async fn handle_prompt_reply(&self, bot: &Bot, msg: &Message, group: GroupId, text: &str) {
        let Some(prompt) = self.pending.get(&group).map(|p| *p) else {
            return;
        };
        let Some(user) = msg.from.as_ref() else { return };
        // The group keeps chatting while a prompt is pending; only an
        // admin's reply consumes it.
        if !is_chat_admin(bot, msg.chat.id, user.id).await {
            return;
        }

        let chat = msg.chat.id;
        let input = text.trim();
        match prompt {
            PendingPrompt::Token => self.bind_token(bot, chat, group, input).await,
            PendingPrompt::Duration => self.start_contest(bot, chat, group, input).await,
            PendingPrompt::Emoji => self.change_emoji(bot, chat, group, input).await,
        }
    }

    async fn bind_token(&self, bot: &Bot, chat: ChatId, group: GroupId, input: &str) {
        // Rejections keep the prompt armed so the admin can retry with a
        // corrected address.
        match self.resolver.validate(input).await {
            Ok(true) => {}
            Ok(false) | Err(Error::Event(_)) => {
                send(bot, chat, replies::INVALID_TOKEN).await;
                return;
            }
            Err(err) => {
                warn!(group = %group, %err, "Address validation unavailable");
                send(bot, chat, replies::UNEXPECTED).await;
                return;
            }
        }

        let token = Address::new(input);
        let pools = match self.locator.find_pools(&token).await {
            Ok(pools) => pools,
            Err(err) => {
                warn!(group = %group, %err, "Pool discovery failed");
                send(bot, chat, replies::UNEXPECTED).await;
                return;
            }
        };
        if pools.is_empty() {
            send(bot, chat, replies::NO_POOLS).await;
            return;
        }

        if let Err(err) = self.directory.set_token(group, token.clone(), pools) {
            warn!(group = %group, %err, "Token binding rejected");
            self.pending.remove(&group);
            send(bot, chat, replies::INIT_GROUP).await;
            return;
        }
        self.pending.remove(&group);
        info!(group = %group, token = %token, "Token bound");
        send(bot, chat, replies::TOKEN_ADDED).await;
    }

    async fn start_contest(&self, bot: &Bot, chat: ChatId, group: GroupId, input: &str) {
        let Some(seconds) = contest_duration(&self.contest, input) else {
            send(bot, chat, replies::INVALID_HOURS).await;
            return;
        };

        let deadline = chrono::Utc::now().timestamp() + seconds as i64;
        match self.lifecycle.start(group, deadline) {
            Ok(()) => {
                // The kickoff announcement goes out through the notifier.
                self.pending.remove(&group);
            }
            Err(ContestError::AlreadyActive { .. }) => {
                self.pending.remove(&group);
                send(bot, chat, replies::COMP_ACTIVE).await;
            }
            Err(ContestError::NoToken { .. } | ContestError::NoPools { .. }) => {
                self.pending.remove(&group);
                send(bot, chat, replies::NO_TOKEN).await;
            }
            Err(err) => {
                self.pending.remove(&group);
                error!(group = %group, %err, "Contest start failed");
                send(bot, chat, replies::UNEXPECTED).await;
            }
        }
    }

    async fn change_emoji(&self, bot: &Bot, chat: ChatId, group: GroupId, input: &str) {
        if input.is_empty() {
            return;
        }
        match self.directory.set_emoji(group, input) {
            Ok(()) => {
                self.pending.remove(&group);
                info!(group = %group, emoji = input, "Alert emoji changed");
                send(bot, chat, replies::EMOJI_ADDED).await;
            }
            Err(err) => {
                self.pending.remove(&group);
                warn!(group = %group, %err, "Emoji change rejected");
                send(bot, chat, replies::INIT_GROUP).await;
            }
        }
    }
}

/// Background worker that handles inbound Telegram commands.
pub async fn command_worker(bot_token: String, dispatcher: Arc<CommandDispatcher>) {
    let bot = Bot::new(&bot_token);

    // Register commands with Telegram so they appear in the "/" menu
    if let Err(e) = register_bot_commands(&bot).await {
        warn!(error = %e, "Failed to register bot commands with Telegram");
    }

    info!("Telegram command listener started");

    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let dispatcher = Arc::clone(&dispatcher);
        async move {
            dispatcher.handle_message(&bot, &msg).await;
            respond(())
        }
    })
    .await;
}

/// Register bot commands with Telegram for the "/" menu.
async fn register_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    let commands: Vec<BotCommand> = bot_commands()
        .into_iter()
        .map(|(cmd, desc)| BotCommand::new(cmd, desc))
        .collect();

    bot.set_my_commands(commands).await?;
    info!("Registered bot commands with Telegram");
    Ok(())
}

/// Turn a duration reply into contest seconds.
///
/// Accepts the configured hour choices; the literal `5` starts the
/// short test contest when one is configured.
fn contest_duration(contest: &ContestConfig, input: &str) -> Option<u64> {
    let value: u64 = input.parse().ok()?;
    if contest.allowed_hours.contains(&value) {
        return Some(value * 3600);
    }
    if value == 5 && contest.test_duration_secs > 0 {
        return Some(contest.test_duration_secs);
    }
    None
}

/// Prompt text listing the valid duration replies.
fn duration_prompt(contest: &ContestConfig) -> String {
    let hours: Vec<String> = contest.allowed_hours.iter().map(u64::to_string).collect();
    match hours.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!(
            "How many hours should the contest last? Reply with {} or {}",
            rest.join(", "),
            last
        ),
        _ => format!(
            "How many hours should the contest last? Reply with {}",
            hours.join(", ")
        ),
    }
}

fn is_group_chat(chat: &Chat) -> bool {
    chat.is_group() || chat.is_supergroup()
}

async fn is_chat_admin(bot: &Bot, chat: ChatId, user: UserId) -> bool {
    match bot.get_chat_member(chat, user).await {
        Ok(member) => member.is_privileged(),
        Err(e) => {
            error!(error = %e, "Failed to look up chat membership");
            false
        }
    }
}

async fn send(bot: &Bot, chat: ChatId, text: &str) {
    if let Err(e) = bot.send_message(chat, text).await {
        error!(error = %e, "Failed to send Telegram command response");
    }
}
