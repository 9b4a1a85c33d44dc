// src/integrations/mod.rs — Chat platform layer

pub mod credentials;
pub mod telegram;
pub mod types;

pub use credentials::BotCredentials;
pub use telegram::TelegramAdapter;
pub use types::{ChatTransport, IncomingEvent, Update};
