//! Event filter
//!
//! Recognizes key releases of grabbed codes and hands them to the
//! dispatcher. Presses are ignored: actions fire on release only.

use crate::dispatch::Dispatcher;
use crate::grab::BindingTable;
use crate::key::InputEvent;
use crate::platform::EventResponse;
use crate::transport::Transport;
use tracing::{debug, trace, warn};

/// Filter one event against the binding table.
///
/// Returns `Consume` only when a bound key was released and its action was
/// dispatched; everything else passes through.
pub async fn handle<T: Transport>(
    event: &InputEvent,
    table: &BindingTable,
    dispatcher: &mut Dispatcher<T>,
) -> EventResponse {
    let InputEvent::Key(key_event) = event else {
        return EventResponse::Passthrough;
    };
    if !key_event.release {
        trace!(code = %key_event.code, "ignoring key press");
        return EventResponse::Passthrough;
    }

    let Some(action) = table.lookup(key_event.code) else {
        if table.is_empty() {
            // Grabs are being rebuilt; stale events are expected
            debug!(code = %key_event.code, "key release while no keys are bound");
        } else {
            warn!(code = %key_event.code, "received key release for unrequested keycode");
        }
        return EventResponse::Passthrough;
    };

    dispatcher.dispatch(action, key_event.shift).await;
    EventResponse::Consume
}
