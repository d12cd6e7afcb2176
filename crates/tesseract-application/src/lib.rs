//! Application layer for Tesseract.
//!
//! Coordinates the session store, the AI gateway and the auxiliary prompt
//! flows into the operations the front end calls.

pub mod auxiliary_flow_service;
pub mod chat_controller;

#[cfg(test)]
mod test_support;

pub use auxiliary_flow_service::AuxiliaryFlowService;
pub use chat_controller::{
    ChatController, ChatState, Notification, NotificationCallback, SendOutcome,
};
