pub mod sender;

pub use sender::{Ack, Notifier, WebhookSender};
