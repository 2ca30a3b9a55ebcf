pub mod config;
pub mod dispatch;
pub mod replies;
pub mod send_message;
pub mod types;
pub mod verify;
pub mod webhook;
