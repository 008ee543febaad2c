//! Message routing: validated dispatch of inbound client messages.
//!
//! A room registers one handler per message type it understands. The
//! router owns the boundary between untrusted JSON and typed handler
//! code: it decodes the raw payload into the registered type, runs the
//! type's own validation, and only then invokes the handler. A message
//! that fails either step is dropped; it never reaches handler code and
//! never affects other clients.

use std::collections::HashMap;

use plaza_protocol::{MessagePayload, SessionId};
use serde_json::Value;

use crate::room::RoomCtx;

/// What happened to one dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran to completion.
    Handled,
    /// No handler is registered for this type; the message was ignored.
    UnknownType,
    /// The payload failed decoding or validation; the message was
    /// dropped without invoking a handler.
    Rejected(String),
}

type Handler = Box<dyn Fn(&mut RoomCtx<'_>, &SessionId, Value) -> DispatchOutcome + Send>;

/// Routes inbound messages to per-type handlers.
///
/// Built once per room when its logic registers handlers, then owned by
/// the room's actor task for the life of the room.
#[derive(Default)]
pub struct MessageRouter {
    handlers: HashMap<&'static str, Handler>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for the payload type `P`.
    ///
    /// The raw payload is decoded into `P` and validated before the
    /// handler runs; on failure the handler is never invoked. A second
    /// registration for the same `P::TYPE` replaces the first.
    pub fn register<P, F>(&mut self, handler: F)
    where
        P: MessagePayload,
        F: Fn(&mut RoomCtx<'_>, &SessionId, P) + Send + 'static,
    {
        let wrapped: Handler = Box::new(move |ctx, sender, raw| {
            let payload: P = match serde_json::from_value(raw) {
                Ok(payload) => payload,
                Err(error) => return DispatchOutcome::Rejected(error.to_string()),
            };
            if let Err(reason) = payload.validate() {
                return DispatchOutcome::Rejected(reason);
            }
            handler(ctx, sender, payload);
            DispatchOutcome::Handled
        });
        self.handlers.insert(P::TYPE, wrapped);
    }

    /// Dispatches one message from `sender`.
    ///
    /// Unknown types and invalid payloads are reported through the
    /// outcome so the caller can log them; nothing is ever surfaced
    /// back to the sender.
    pub fn dispatch(
        &self,
        ctx: &mut RoomCtx<'_>,
        sender: &SessionId,
        kind: &str,
        payload: Value,
    ) -> DispatchOutcome {
        match self.handlers.get(kind) {
            Some(handler) => handler(ctx, sender, payload),
            None => DispatchOutcome::UnknownType,
        }
    }

    /// Returns `true` if a handler is registered for `kind`.
    pub fn is_registered(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }
}

// =========================================================================
// Tests
// =========================================================================
