use std::collections::HashSet;

use log::debug;

use crate::menu::MenuId;

/// Who a global listener belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerOwner {
    Menu(MenuId),
    Shortcuts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Click anywhere outside the owner's area.
    OutsideClick,
    /// Key presses routed to the owner before anything else.
    KeyDown,
}

/// Global listeners routed by the session. Registration is idempotent, so
/// each (owner, kind) pair is present at most once.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    active: HashSet<(ListenerOwner, ListenerKind)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the listener was already registered.
    pub fn register(&mut self, owner: ListenerOwner, kind: ListenerKind) -> bool {
        let added = self.active.insert((owner, kind));
        if added {
            debug!("Listener registered: {:?}/{:?}", owner, kind);
        }
        added
    }

    /// Returns false when nothing was registered.
    pub fn unregister(&mut self, owner: ListenerOwner, kind: ListenerKind) -> bool {
        let removed = self.active.remove(&(owner, kind));
        if removed {
            debug!("Listener removed: {:?}/{:?}", owner, kind);
        }
        removed
    }

    pub fn is_registered(&self, owner: ListenerOwner, kind: ListenerKind) -> bool {
        self.active.contains(&(owner, kind))
    }

    pub fn count(&self, owner: ListenerOwner, kind: ListenerKind) -> usize {
        usize::from(self.is_registered(owner, kind))
    }

    /// Owners currently listening for `kind`.
    pub fn owners(&self, kind: ListenerKind) -> impl Iterator<Item = ListenerOwner> + '_ {
        self.active.iter().filter(move |(_, k)| *k == kind).map(|(owner, _)| *owner)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_register_is_ignored() {
        let mut reg = ListenerRegistry::new();
        let owner = ListenerOwner::Menu(MenuId::Stream);
        assert!(reg.register(owner, ListenerKind::KeyDown));
        assert!(!reg.register(owner, ListenerKind::KeyDown));
        assert_eq!(reg.count(owner, ListenerKind::KeyDown), 1);

        assert!(reg.unregister(owner, ListenerKind::KeyDown));
        assert!(!reg.unregister(owner, ListenerKind::KeyDown));
        assert_eq!(reg.count(owner, ListenerKind::KeyDown), 0);
    }
}
