pub mod events;
pub mod index;
