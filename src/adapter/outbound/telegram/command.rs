//! Telegram command parsing.

/// Supported Telegram commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelegramCommand {
    Start,
    AddToken,
    RemoveToken,
    StartComp,
    StopComp,
    List,
    RemoveBuyer { wallet: String },
    SetEmoji,
    Help,
}

/// Parse error for Telegram command messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    NotACommand,
    UnknownCommand(String),
    MissingArgument(&'static str),
}

impl std::fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotACommand => write!(f, "message is not a command"),
            Self::UnknownCommand(cmd) => write!(f, "unknown command `{cmd}`"),
            Self::MissingArgument(name) => write!(f, "missing argument `{name}`"),
        }
    }
}

impl std::error::Error for CommandParseError {}

/// Parse a Telegram message into a bot command.
///
/// Accepts the `/cmd@botname` form Telegram uses in groups with several
/// bots.
pub fn parse_command(text: &str) -> Result<TelegramCommand, CommandParseError> {
    let mut parts = text.split_whitespace();
    let Some(raw_command) = parts.next() else {
        return Err(CommandParseError::NotACommand);
    };
    if !raw_command.starts_with('/') {
        return Err(CommandParseError::NotACommand);
    }

    let command = raw_command
        .split_once('@')
        .map_or(raw_command, |(head, _)| head);

    match command {
        "/start" => Ok(TelegramCommand::Start),
        "/addtoken" => Ok(TelegramCommand::AddToken),
        "/removetoken" => Ok(TelegramCommand::RemoveToken),
        "/startcomp" => Ok(TelegramCommand::StartComp),
        "/stopcomp" => Ok(TelegramCommand::StopComp),
        "/list" => Ok(TelegramCommand::List),
        "/removebuyer" => {
            let wallet = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("address"))?;
            Ok(TelegramCommand::RemoveBuyer {
                wallet: wallet.to_string(),
            })
        }
        "/setemoji" => Ok(TelegramCommand::SetEmoji),
        "/help" => Ok(TelegramCommand::Help),
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}

/// Help text returned by `/help`.
#[must_use]
pub const fn command_help() -> &'static str {
    "📋 Commands\n\n\
    /start - Register this group\n\
    /addtoken - Bind a jetton address\n\
    /removetoken - Clear the jetton binding\n\
    /startcomp - Start a buy competition\n\
    /stopcomp - Stop the running competition\n\
    /list - Show the top buyers\n\
    /removebuyer <address> - Remove a wallet's standing purchase\n\
    /setemoji - Change the buy-alert emoji\n\
    /help - Show this message"
}

/// Bot commands for Telegram menu registration.
///
/// Returns tuples of (command, description) for `set_my_commands`.
#[must_use]
pub fn bot_commands() -> Vec<(&'static str, &'static str)> {
    vec![
        ("start", "Register this group"),
        ("addtoken", "Bind a jetton address"),
        ("removetoken", "Clear the jetton binding"),
        ("startcomp", "Start a buy competition"),
        ("stopcomp", "Stop the running competition"),
        ("list", "Show the top buyers"),
        ("removebuyer", "Remove a wallet's standing purchase"),
        ("setemoji", "Change the buy-alert emoji"),
        ("help", "Show all commands"),
    ]
}
