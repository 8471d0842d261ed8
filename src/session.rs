//! Media key session
//!
//! A session lives from activation to deactivation and owns everything the
//! event loop touches: the grabs and binding table, and the dispatcher with
//! its mute memory. Nothing here is shared between threads.

use crate::config::SessionConfig;
use crate::dispatch::Dispatcher;
use crate::filter;
use crate::grab::{BindingTable, GrabManager};
use crate::key::InputEvent;
use crate::platform::{EventResponse, WindowSystem};
use crate::transport::Transport;
use tokio::sync::watch;
use tracing::{info, warn};

pub struct Session<W, T> {
    grabs: GrabManager<W>,
    dispatcher: Dispatcher<T>,
}

impl<W: WindowSystem, T: Transport> Session<W, T> {
    /// Grab the media keys and get ready to handle their events
    pub fn activate(ws: W, transport: T, config: watch::Receiver<SessionConfig>) -> Self {
        let mut grabs = GrabManager::new(ws);
        grabs.grab_all();
        Self {
            grabs,
            dispatcher: Dispatcher::new(transport, config),
        }
    }

    #[cfg(test)]
    pub fn table(&self) -> &BindingTable {
        self.grabs.table()
    }

    /// Handle one event from the window system
    pub async fn handle_event(&mut self, event: InputEvent) -> EventResponse {
        if event == InputEvent::KeymapChanged {
            self.rebind();
            return EventResponse::Passthrough;
        }
        filter::handle(&event, self.grabs.table(), &mut self.dispatcher).await
    }

    /// Rebuild the binding table against the new keyboard mapping
    fn rebind(&mut self) {
        info!("keyboard mapping changed, grabbing keys again");
        self.grabs.ungrab_all();
        if let Err(e) = self.grabs.window_system_mut().reload_keymap() {
            warn!(error = %e, "couldn't reload the keyboard mapping");
        }
        self.grabs.grab_all();
    }

    /// Release every grab
    pub fn deactivate(mut self) {
        self.grabs.ungrab_all();
        info!("released media keys");
    }
}
