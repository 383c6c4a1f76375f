//! The LSP Client and its wire-level framing.

mod client;
mod wire;

pub use client::{semantic_tokens_legend, ClientState, LspClient};
pub use wire::{read_message, write_notification, write_request, InboundMessage, RpcError};
