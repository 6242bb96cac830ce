pub mod events;
pub mod notification;
