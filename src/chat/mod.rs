pub mod context;
pub mod conversation;
pub mod intent;
pub mod message;
