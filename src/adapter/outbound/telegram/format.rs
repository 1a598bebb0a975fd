//! Message formatting for Telegram alerts and standings.
//!
//! Buy alerts and the standings table go out as `MarkdownV2`, so every
//! dynamic value passes through [`escape_markdown`] and static
//! punctuation is pre-escaped in the templates. Plain-text replies from
//! the command surface never come through here escaped.

use rand::Rng;

use crate::domain::id::Address;
use crate::domain::ledger::LedgerEntry;
use crate::port::outbound::notifier::BuyAlertNotice;

/// Telegram's hard cap for a text message.
pub const MESSAGE_LIMIT: usize = 4096;

/// Telegram's hard cap for a media caption.
pub const CAPTION_LIMIT: usize = 1024;

/// Announcement sent to the group when a contest starts.
pub const KICKOFF_TEXT: &str = "The competition has started, let the buys begin!\n\n\
    Only direct buys with TON will be included. If you sell you will be \
    removed from the contest and your future buys won't count.";

/// Announcement sent to the group when a contest ends.
pub const ENDED_TEXT: &str = "The competition is over.";

/// Render a buy alert into a `MarkdownV2` message body.
///
/// `now` is the unix time the countdown footer is computed against.
pub fn format_buy_alert(alert: &BuyAlertNotice, trailer: &str, now: i64) -> String {
    let mut msg = format!("🚨*{} New Buy*🚨\n\n", escape_markdown(&alert.token_name));
    msg.push_str(&emoji_burst(&alert.emoji, alert.ton_amount));
    msg.push_str(&format!("\n\n💰Spent: {} *TON*\n", alert.ton_amount));
    msg.push_str(&format!(
        "🧳Bought: {} *{}*\n",
        format_with_commas(alert.token_amount),
        escape_markdown(&alert.token_symbol)
    ));
    msg.push_str(&format!("📊Competition Spot: {}\n", alert.rank));
    msg.push_str(&format!("💎Wallet: {}\n", tonviewer_link(&alert.buyer)));

    msg.push_str("\n*Leading Buys:*\n");
    for (medal, entry) in ["🥇", "🥈", "🥉"].iter().zip(alert.top.iter()) {
        msg.push_str(&format!(
            "{}{} *TON*  \\-  {}\n",
            medal,
            entry.trade.native_amount,
            tonviewer_link(&entry.trade.wallet)
        ));
    }

    msg.push_str(&format!(
        "Buy competition end at {}",
        format_countdown(alert.deadline, now)
    ));

    if !trailer.is_empty() {
        msg.push_str("\n\n");
        msg.push_str(&escape_markdown(trailer));
        msg.push('\n');
    }

    msg
}

/// Render the `/list` standings table in `MarkdownV2`.
///
/// Always emits exactly `rows` lines; positions nobody holds yet are
/// filled with `not set` placeholders.
pub fn format_standings(top: &[LedgerEntry], rows: usize) -> String {
    let mut msg = String::from("👑 *Top Buyers*:\n\n");
    for i in 0..rows {
        match top.get(i) {
            Some(entry) => msg.push_str(&format!(
                "{}\\.\\) {} *TON* \\- {}\n",
                i + 1,
                entry.trade.native_amount,
                tonviewer_link(&entry.trade.wallet)
            )),
            None => msg.push_str(&format!("{}\\.\\) not set *TON* \\- not set\n", i + 1)),
        }
    }
    msg
}

/// A run of the group's emoji sized by how big the buy was.
///
/// The tier picks a random length so alerts for similar buys still look
/// alive. The top tier is capped to keep a video caption under Telegram's
/// limit with the rest of the alert intact.
pub fn emoji_burst(emoji: &str, ton_amount: u64) -> String {
    let mut rng = rand::thread_rng();
    let count = match ton_amount {
        0..=9 => rng.gen_range(5..=15),
        10..=49 => rng.gen_range(15..=50),
        50..=99 => rng.gen_range(20..=69),
        _ => rng.gen_range(25..=150),
    };
    emoji.repeat(count)
}

/// Countdown footer fragment, bold in `MarkdownV2`.
pub fn format_countdown(deadline: i64, now: i64) -> String {
    let remaining = (deadline - now).max(0);
    let hours = remaining / 3600;
    let minutes = (remaining % 3600) / 60;
    let seconds = remaining % 60;
    format!("*{hours} hours: {minutes} minutes: {seconds} sec*")
}

/// Markdown link to the wallet on tonviewer, labelled with a shortened
/// address.
pub fn tonviewer_link(wallet: &Address) -> String {
    let label = escape_markdown(&short_wallet(wallet.as_str()));
    let encoded: String =
        url::form_urlencoded::byte_serialize(wallet.as_str().as_bytes()).collect();
    format!("[{label}](https://tonviewer.com/{encoded}/)")
}

/// Shorten an address to `first6...last6`. Anything too short to split
/// is returned whole.
pub fn short_wallet(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{head}...{tail}")
}

/// Group digits in threes: `1271506` becomes `1,271,506`.
pub fn format_with_commas(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Truncate a string with ellipsis (Unicode-safe).
pub fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

/// Escape special characters for Telegram `MarkdownV2`.
pub fn escape_markdown(text: &str) -> String {
    let special_chars = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        if special_chars.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::id::GroupId;
    use crate::domain::trade::NormalizedTrade;

    fn entry(wallet: &str, ton: u64, seq: u64) -> LedgerEntry {
        LedgerEntry {
            trade: NormalizedTrade::buy(wallet, "EQJetton", ton, ton * 1_000),
            seq,
        }
    }

    fn alert() -> BuyAlertNotice {
        BuyAlertNotice {
            group: GroupId::new(-100),
            token_name: "Kilo_Token".to_string(),
            token_symbol: "KILO".to_string(),
            buyer: Address::new("EQBuyerAddressWithPlentyOfChars123456"),
            ton_amount: 25,
            token_amount: 1_271_506,
            emoji: "🦾".to_string(),
            rank: 2,
            top: vec![
                entry("EQLeaderOneAddressLongEnough111111", 120, 1),
                entry("EQLeaderTwoAddressLongEnough222222", 90, 2),
            ],
            deadline: 10_000,
        }
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("hello"), "hello");
        assert_eq!(escape_markdown("hello_world"), "hello\\_world");
        assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
        assert_eq!(escape_markdown("test.com"), "test\\.com");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hello...");
        assert_eq!(truncate("🎯🚀💰", 2), "🎯🚀...");
    }

    #[test]
    fn test_format_with_commas() {
        assert_eq!(format_with_commas(0), "0");
        assert_eq!(format_with_commas(999), "999");
        assert_eq!(format_with_commas(1_000), "1,000");
        assert_eq!(format_with_commas(1_271_506), "1,271,506");
        assert_eq!(format_with_commas(1_000_000_000), "1,000,000,000");
    }

    #[test]
    fn test_short_wallet() {
        assert_eq!(
            short_wallet("EQB5GqP3DmDzr8cvFoPYHJTLvsYSB3AAyTzbmbVGO9x2Qeai"),
            "EQB5Gq...x2Qeai"
        );
        assert_eq!(short_wallet("EQshort"), "EQshort");
    }

    #[test]
    fn test_tonviewer_link_escapes_address_and_label() {
        let link = tonviewer_link(&Address::new("0:abc def"));
        assert!(link.contains("https://tonviewer.com/0%3Aabc+def/"));

        let link = tonviewer_link(&Address::new("EQB5GqP3DmDzr8cvFoPYHJTLvsYSB3AAyTzbmbVGO9x2Qeai"));
        assert!(link.starts_with("[EQB5Gq\\.\\.\\.x2Qeai]"));
        assert!(link.ends_with("(https://tonviewer.com/EQB5GqP3DmDzr8cvFoPYHJTLvsYSB3AAyTzbmbVGO9x2Qeai/)"));
    }

    #[test]
    fn test_countdown_breaks_down_remaining_time() {
        let deadline = 2 * 3600 + 15 * 60 + 3;
        assert_eq!(format_countdown(deadline, 0), "*2 hours: 15 minutes: 3 sec*");
        // long contests keep counting in hours
        assert_eq!(format_countdown(48 * 3600, 0), "*48 hours: 0 minutes: 0 sec*");
        // past the deadline the footer clamps instead of going negative
        assert_eq!(format_countdown(100, 500), "*0 hours: 0 minutes: 0 sec*");
    }

    #[test]
    fn test_emoji_burst_stays_in_tier() {
        for _ in 0..50 {
            let small = emoji_burst("🦾", 5).chars().count();
            assert!((5..=15).contains(&small), "got {small}");

            let large = emoji_burst("🦾", 5_000).chars().count();
            assert!((25..=150).contains(&large), "got {large}");
        }
    }

    #[test]
    fn test_buy_alert_layout() {
        let msg = format_buy_alert(&alert(), "***AD SPACE***", 0);

        assert!(msg.starts_with("🚨*Kilo\\_Token New Buy*🚨\n\n"));
        assert!(msg.contains("💰Spent: 25 *TON*\n"));
        assert!(msg.contains("🧳Bought: 1,271,506 *KILO*\n"));
        assert!(msg.contains("📊Competition Spot: 2\n"));
        assert!(msg.contains("💎Wallet: [EQBuye\\.\\.\\.123456]"));
        assert!(msg.contains("\n*Leading Buys:*\n"));
        assert!(msg.contains("🥇120 *TON*  \\-  [EQLead\\.\\.\\.111111]"));
        assert!(msg.contains("🥈90 *TON*  \\-  [EQLead\\.\\.\\.222222]"));
        // only two leaders, so no bronze row
        assert!(!msg.contains("🥉"));
        assert!(msg.contains("Buy competition end at *2 hours: 46 minutes: 40 sec*"));
        assert!(msg.ends_with("\\*\\*\\*AD SPACE\\*\\*\\*\n"));
    }

    #[test]
    fn test_buy_alert_without_trailer_ends_on_countdown() {
        let msg = format_buy_alert(&alert(), "", 0);
        assert!(msg.ends_with("sec*"));
    }

    #[test]
    fn test_standings_pads_to_requested_rows() {
        let top = vec![entry("EQLeaderOneAddressLongEnough111111", 120, 1)];
        let msg = format_standings(&top, 10);

        assert!(msg.starts_with("👑 *Top Buyers*:\n\n"));
        assert!(msg.contains("1\\.\\) 120 *TON* \\- [EQLead\\.\\.\\.111111]"));
        assert!(msg.contains("2\\.\\) not set *TON* \\- not set\n"));
        assert!(msg.contains("10\\.\\) not set *TON* \\- not set\n"));
        assert_eq!(msg.lines().count(), 12);
    }
}
