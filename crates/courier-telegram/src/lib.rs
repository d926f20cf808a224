//! `courier-telegram` — Telegram implementations of the engine seams.
//!
//! [`ChannelTransport`] publishes posts to the destination channel;
//! [`OwnerNotifier`] forwards run events to the operator's chat, filtered by
//! notify mode. Both wrap one shared teloxide [`Bot`].
//!
//! [`Bot`]: teloxide::Bot

use teloxide::Bot;

use courier_core::config::TelegramConfig;
use courier_core::NotifyMode;

pub mod notifier;
pub mod transport;

pub use notifier::OwnerNotifier;
pub use transport::ChannelTransport;

/// Build both collaborators over one shared bot client.
pub fn connect(config: &TelegramConfig, mode: NotifyMode) -> (ChannelTransport, OwnerNotifier) {
    let bot = Bot::new(&config.bot_token);
    let transport = ChannelTransport::new(bot.clone(), config.channel_id);
    let notifier = OwnerNotifier::new(bot, config.owner_id, mode);
    (transport, notifier)
}
