//! Global key grabs and the action → key code binding table
//!
//! The table is rebuilt from scratch on every grab cycle: `grab_all` fills it
//! entry by entry, `ungrab_all` releases and clears every bound entry. A
//! failed grab only leaves its own action unbound.

use crate::key::{KeyCode, LogicalAction};
use crate::platform::WindowSystem;
use crate::resolver;
use tracing::{debug, info, warn};

/// Which key code, if any, each action is currently grabbed with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingTable {
    codes: [Option<KeyCode>; LogicalAction::COUNT],
}

impl BindingTable {
    /// Key code bound to `action`
    pub fn get(&self, action: LogicalAction) -> Option<KeyCode> {
        self.codes[action.index()]
    }

    /// Action bound to `code`, scanning every bound entry
    pub fn lookup(&self, code: KeyCode) -> Option<LogicalAction> {
        LogicalAction::ALL
            .into_iter()
            .find(|action| self.get(*action) == Some(code))
    }

    /// Whether no action is bound
    pub fn is_empty(&self) -> bool {
        self.codes.iter().all(Option::is_none)
    }

    /// Number of bound actions
    pub fn bound_count(&self) -> usize {
        self.codes.iter().flatten().count()
    }

    /// Bound entries in table order
    pub fn iter(&self) -> impl Iterator<Item = (LogicalAction, KeyCode)> + '_ {
        LogicalAction::ALL
            .into_iter()
            .filter_map(|action| self.get(action).map(|code| (action, code)))
    }

    fn set(&mut self, action: LogicalAction, code: Option<KeyCode>) {
        self.codes[action.index()] = code;
    }
}

/// Owns the window system connection's grabs and the binding table
pub struct GrabManager<W> {
    ws: W,
    table: BindingTable,
}

impl<W: WindowSystem> GrabManager<W> {
    /// Create a manager with an empty table; nothing is grabbed yet
    pub fn new(ws: W) -> Self {
        Self {
            ws,
            table: BindingTable::default(),
        }
    }

    /// Current binding table
    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    /// Mutable access to the window system, for keymap reloads
    pub fn window_system_mut(&mut self) -> &mut W {
        &mut self.ws
    }

    /// Resolve and grab the key of every action on every screen.
    ///
    /// Actions whose symbol cannot be resolved, whose code is already bound to
    /// another action, or whose grab is refused on any screen stay unbound.
    pub fn grab_all(&mut self) {
        if !self.table.is_empty() {
            self.ungrab_all();
        }

        for action in LogicalAction::ALL {
            let code = self.grab_action(action);
            self.table.set(action, code);
        }

        info!(
            bound = self.table.bound_count(),
            total = LogicalAction::COUNT,
            "grabbed media keys"
        );
    }

    fn grab_action(&self, action: LogicalAction) -> Option<KeyCode> {
        let symbol = action.symbol_name();
        let code = resolver::resolve(symbol, &self.ws)?;

        if let Some(owner) = self.table.lookup(code) {
            warn!(
                symbol,
                %code,
                ?owner,
                "key code already bound to another action, leaving unbound"
            );
            return None;
        }

        for screen in 0..self.ws.screen_count() {
            if let Err(e) = self.ws.grab_key(code, screen) {
                warn!(
                    symbol,
                    %code,
                    screen,
                    error = %e,
                    "couldn't grab key: another client may already have done so"
                );
                self.release_screens(code, 0..screen);
                return None;
            }
        }

        debug!(symbol, %code, ?action, "grabbed key");
        Some(code)
    }

    /// Release every bound key on every screen and clear the table.
    ///
    /// Entries are cleared even if the window system reports an error, so
    /// calling this again is a no-op.
    pub fn ungrab_all(&mut self) {
        let bound: Vec<_> = self.table.iter().collect();
        for (action, code) in bound {
            self.release_screens(code, 0..self.ws.screen_count());
            self.table.set(action, None);
            debug!(?action, %code, "released key");
        }
    }

    fn release_screens(&self, code: KeyCode, screens: std::ops::Range<usize>) {
        let mut failed = false;
        for screen in screens {
            if let Err(e) = self.ws.ungrab_key(code, screen) {
                debug!(%code, screen, error = %e, "ungrab failed");
                failed = true;
            }
        }
        if failed {
            warn!(%code, "couldn't ungrab keycode");
        }
    }
}
