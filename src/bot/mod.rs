// src/bot/mod.rs — Conversation layer: sessions, states, menus, dispatch

pub mod action;
pub mod dispatcher;
pub mod flows;
pub mod reply;
pub mod session;

pub use action::{Callback, PendingAction};
pub use dispatcher::{Dispatcher, Inbound};
pub use reply::{Button, Menu, Reply};
pub use session::{Session, UserId};
