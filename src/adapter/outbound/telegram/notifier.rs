//! Telegram delivery of contest notices.
//!
//! Provides the [`TelegramNotifier`], which queues notices on an
//! unbounded channel and lets a background worker own the [`Bot`] and do
//! the actual sends. Buy alerts go out as `MarkdownV2`, optionally as a
//! promo video caption with an inline button; kickoff and ending
//! announcements are plain text.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use url::Url;

use crate::app::config::PromoConfig;
use crate::domain::id::GroupId;
use crate::port::outbound::notifier::{BuyAlertNotice, Notice, Notifier};

use super::format;

/// Telegram notifier that announces contest notices in their groups.
///
/// Implements the [`Notifier`] trait; construction spawns the delivery
/// worker.
pub struct TelegramNotifier {
    /// Channel sender for queuing outbound notices.
    sender: mpsc::UnboundedSender<Notice>,
}

impl TelegramNotifier {
    /// Create a new Telegram notifier and spawn the background worker.
    #[must_use]
    pub fn new(bot_token: impl Into<String>, promo: PromoConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(notice_worker(bot_token.into(), promo, receiver));
        Self { sender }
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, notice: Notice) {
        if self.sender.send(notice).is_err() {
            warn!("Telegram notifier channel closed");
        }
    }
}

/// Background worker that sends Telegram messages.
async fn notice_worker(
    bot_token: String,
    promo: PromoConfig,
    mut receiver: mpsc::UnboundedReceiver<Notice>,
) {
    let bot = Bot::new(&bot_token);
    let video = promo_video(&promo);
    let button = promo_button(&promo);

    info!("Telegram notifier started");

    while let Some(notice) = receiver.recv().await {
        match notice {
            Notice::ContestStarted { group, .. } => {
                send_plain(&bot, group, format::KICKOFF_TEXT).await;
            }
            Notice::ContestEnded { group } => {
                send_plain(&bot, group, format::ENDED_TEXT).await;
            }
            Notice::BuyAlert(alert) => {
                send_buy_alert(&bot, &alert, &promo.trailer, video.clone(), button.clone()).await;
            }
        }
    }

    warn!("Telegram notifier worker shutting down");
}

async fn send_plain(bot: &Bot, group: GroupId, text: &str) {
    let chat = ChatId(group.value());
    if let Err(e) = bot.send_message(chat, text).await {
        error!(error = %e, group = %group, "Failed to send Telegram announcement");
    }
}

async fn send_buy_alert(
    bot: &Bot,
    alert: &BuyAlertNotice,
    trailer: &str,
    video: Option<InputFile>,
    button: Option<InlineKeyboardMarkup>,
) {
    let chat = ChatId(alert.group.value());
    let now = chrono::Utc::now().timestamp();
    let text = format::format_buy_alert(alert, trailer, now);

    match video {
        Some(video) => {
            let caption = format::truncate(&text, format::CAPTION_LIMIT);
            let mut request = bot
                .send_video(chat, video)
                .caption(caption)
                .parse_mode(ParseMode::MarkdownV2);
            if let Some(markup) = button {
                request = request.reply_markup(markup);
            }
            if let Err(e) = request.await {
                error!(error = %e, group = %alert.group, "Failed to send Telegram buy alert");
            }
        }
        None => {
            let body = format::truncate(&text, format::MESSAGE_LIMIT);
            let mut request = bot
                .send_message(chat, body)
                .parse_mode(ParseMode::MarkdownV2);
            if let Some(markup) = button {
                request = request.reply_markup(markup);
            }
            if let Err(e) = request.await {
                error!(error = %e, group = %alert.group, "Failed to send Telegram buy alert");
            }
        }
    }
}

/// Promo video attachment for alerts: an http(s) value is fetched by
/// Telegram, anything else is taken as a file id of an earlier upload.
fn promo_video(promo: &PromoConfig) -> Option<InputFile> {
    if promo.video.is_empty() {
        return None;
    }
    match Url::parse(&promo.video) {
        Ok(url) if url.scheme().starts_with("http") => Some(InputFile::url(url)),
        _ => Some(InputFile::file_id(promo.video.clone())),
    }
}

/// Inline promo button for alerts, if one is configured and parses.
fn promo_button(promo: &PromoConfig) -> Option<InlineKeyboardMarkup> {
    if promo.button_url.is_empty() {
        return None;
    }
    match Url::parse(&promo.button_url) {
        Ok(url) => Some(InlineKeyboardMarkup::new([[InlineKeyboardButton::url(
            promo.button_text.clone(),
            url,
        )]])),
        Err(e) => {
            warn!(error = %e, url = %promo.button_url, "Promo button URL does not parse, dropping the button");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promo(video: &str, button_url: &str) -> PromoConfig {
        PromoConfig {
            trailer: String::new(),
            video: video.to_string(),
            button_text: "ADVERTISE HERE".to_string(),
            button_url: button_url.to_string(),
        }
    }

    #[test]
    fn test_promo_video_accepts_urls_and_file_ids() {
        assert!(promo_video(&promo("", "")).is_none());
        assert!(promo_video(&promo("https://cdn.example.com/promo.mp4", "")).is_some());
        // a bare Telegram file id is not a URL but still attaches
        assert!(promo_video(&promo("BAACAgIAAxkBAAIB", "")).is_some());
    }

    #[test]
    fn test_promo_button_requires_a_parsable_url() {
        assert!(promo_button(&promo("", "")).is_none());
        assert!(promo_button(&promo("", "::::")).is_none());
        assert!(promo_button(&promo("", "https://t.me/somebody")).is_some());
    }
}
