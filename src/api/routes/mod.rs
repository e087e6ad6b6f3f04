pub mod events;
pub mod meta;
pub mod upload;
