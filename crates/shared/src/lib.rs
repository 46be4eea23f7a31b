//! Request/response contract shared by the conversation client, the relay and the terminal front-end.

pub mod domain;
pub mod error;
pub mod protocol;
