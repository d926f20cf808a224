//! Channel publishing over the Telegram Bot API.
//!
//! Messages go out in HTML parse mode. Media captions are limited to 1024
//! characters by Telegram; we cap at 1000 and deliver the remainder of a
//! long body as a follow-up text message.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode};
use tracing::warn;
use url::Url;

use courier_core::{Post, PostButton};
use courier_engine::{Receipt, Transport, TransportError};

/// Caption cap, under Telegram's 1024 limit with margin.
const CAPTION_MAX_CHARS: usize = 1000;
/// Pause before the overflow follow-up, to keep message order stable.
const OVERFLOW_DELAY_MS: u64 = 400;

/// Publishes posts to a single destination channel.
pub struct ChannelTransport {
    bot: Bot,
    channel: ChatId,
}

impl ChannelTransport {
    pub fn new(bot: Bot, channel_id: i64) -> Self {
        Self {
            bot,
            channel: ChatId(channel_id),
        }
    }

    async fn send_text(
        &self,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, TransportError> {
        let mut req = self
            .bot
            .send_message(self.channel, text)
            .parse_mode(ParseMode::Html);
        if let Some(kb) = keyboard {
            req = req.reply_markup(kb);
        }
        req.await.map_err(map_request_error)
    }

    async fn send_photo(
        &self,
        photo: Url,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, TransportError> {
        let mut req = self
            .bot
            .send_photo(self.channel, InputFile::url(photo))
            .caption(caption)
            .parse_mode(ParseMode::Html);
        if let Some(kb) = keyboard {
            req = req.reply_markup(kb);
        }
        req.await.map_err(map_request_error)
    }

    async fn send_video(
        &self,
        video: Url,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, TransportError> {
        let mut req = self
            .bot
            .send_video(self.channel, InputFile::url(video))
            .caption(caption)
            .parse_mode(ParseMode::Html);
        if let Some(kb) = keyboard {
            req = req.reply_markup(kb);
        }
        req.await.map_err(map_request_error)
    }

    /// Deliver the part of a long body that did not fit into the caption.
    ///
    /// The post itself is already out at this point, so a failure here must
    /// not bubble up — bubbling would leave the post un-recorded and
    /// re-publish the media on the next run.
    async fn send_overflow(&self, overflow: &str) {
        tokio::time::sleep(Duration::from_millis(OVERFLOW_DELAY_MS)).await;
        if let Err(e) = self.send_text(overflow, None).await {
            warn!(error = %e, "caption overflow message failed");
        }
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn publish(&self, post: &Post) -> Result<Receipt, TransportError> {
        let keyboard = build_keyboard(&post.buttons);

        let message = if let Some(photo) = &post.photo_url {
            let url = parse_media_url("photo", photo)?;
            let (caption, overflow) = split_caption(&post.text);
            let message = self.send_photo(url, &caption, keyboard).await?;
            if let Some(rest) = overflow {
                self.send_overflow(&rest).await;
            }
            message
        } else if let Some(video) = &post.video_url {
            let url = parse_media_url("video", video)?;
            let (caption, overflow) = split_caption(&post.text);
            let message = self.send_video(url, &caption, keyboard).await?;
            if let Some(rest) = overflow {
                self.send_overflow(&rest).await;
            }
            message
        } else {
            self.send_text(&post.text, keyboard).await?
        };

        Ok(Receipt {
            message_id: Some(message.id.0),
        })
    }
}

/// Split a body into a caption-sized head and the remaining tail.
///
/// Char-based, not byte-based — the cap must never cut inside a multibyte
/// character. A truncated head gets an ellipsis, as readers of the caption
/// alone should see that the text continues.
fn split_caption(text: &str) -> (String, Option<String>) {
    if text.chars().count() <= CAPTION_MAX_CHARS {
        return (text.to_string(), None);
    }
    let head: String = text.chars().take(CAPTION_MAX_CHARS).collect();
    let tail: String = text.chars().skip(CAPTION_MAX_CHARS).collect();
    (format!("{head}…"), Some(tail))
}

/// One button per row, matching how the catalog columns are laid out.
/// Buttons with unparseable URLs are dropped with a warning — a bad link
/// must not block the post itself.
fn build_keyboard(buttons: &[PostButton]) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = buttons
        .iter()
        .filter_map(|b| match Url::parse(&b.url) {
            Ok(url) => Some(vec![InlineKeyboardButton::url(b.label.clone(), url)]),
            Err(e) => {
                warn!(label = %b.label, url = %b.url, error = %e, "dropping button with bad URL");
                None
            }
        })
        .collect();

    (!rows.is_empty()).then(|| InlineKeyboardMarkup::new(rows))
}

fn parse_media_url(kind: &str, raw: &str) -> Result<Url, TransportError> {
    Url::parse(raw).map_err(|e| TransportError::Api(format!("invalid {kind} URL {raw:?}: {e}")))
}

fn map_request_error(e: teloxide::RequestError) -> TransportError {
    match e {
        teloxide::RequestError::Network(e) => TransportError::Network(e.to_string()),
        teloxide::RequestError::Io(e) => TransportError::Network(e.to_string()),
        other => TransportError::Api(other.to_string()),
    }
}
