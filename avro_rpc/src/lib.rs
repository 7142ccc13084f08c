//! Framed request/response RPC on top of [`avro_value`]'s binary codec: a
//! `Frame` wire format, a one-shot hash-based handshake, and client/server
//! codecs built around it.

mod client;
mod error;
mod frame;
pub mod handshake;
mod server;

pub use client::{dial, ClientCodec};
pub use error::RpcError;
pub use frame::Frame;
pub use handshake::MatchCode;
pub use server::{serve, Handler, HandlerTable, Request, ServerCodec};
