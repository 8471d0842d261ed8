//! Key symbol name → key code resolution

use crate::key::{KeyCode, keysym_from_name};
use crate::platform::WindowSystem;
use tracing::{debug, warn};

/// Resolve a key symbol name to the key code that produces it.
///
/// Returns `None` when the name is not a known symbol or when the current
/// keyboard layout has no key for it. Both cases are logged; callers leave
/// the corresponding action unbound.
pub fn resolve(name: &str, ws: &impl WindowSystem) -> Option<KeyCode> {
    let Some(keysym) = keysym_from_name(name) else {
        warn!(symbol = name, "unknown key symbol");
        return None;
    };

    let code = ws.keycode_for(keysym);
    match code {
        Some(code) => debug!(symbol = name, keysym, %code, "resolved key"),
        None => warn!(symbol = name, "no key in the current layout produces this symbol"),
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockWindowSystem;
    use assert2::assert;

    #[test]
    fn test_resolve_mapped_symbol() {
        let mut ws = MockWindowSystem::new(1);
        ws.map_key(0x1008_FF14, KeyCode::new(172));
        assert!(resolve("XF86AudioPlay", &ws) == Some(KeyCode::new(172)));
    }

    #[test]
    fn test_resolve_unknown_symbol() {
        let ws = MockWindowSystem::with_media_keys(1);
        assert!(resolve("XF86NotAKey", &ws).is_none());
    }

    #[test]
    fn test_resolve_symbol_missing_from_layout() {
        let ws = MockWindowSystem::new(1);
        assert!(resolve("XF86AudioMute", &ws).is_none());
    }
}
