//! Single-character key bindings that live only while a dialog is open.
//!
//! The table is a plain ordered list: it never holds more than a couple of
//! entries, and keys are unique, so order has no effect on which binding fires.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding<T> {
    pub key: char,
    pub action: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDispatcher<T> {
    bindings: Vec<KeyBinding<T>>,
}

impl<T> Default for KeyDispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> KeyDispatcher<T> {
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Install `action` for `key`. Returns false without touching the table
    /// when `key` is already bound.
    pub fn bind(&mut self, key: char, action: T) -> bool {
        if self.lookup(key).is_some() {
            return false;
        }
        self.bindings.push(KeyBinding { key, action });
        true
    }

    /// Remove the binding for `key`. Returns whether one was removed.
    pub fn unbind(&mut self, key: char) -> bool {
        match self.bindings.iter().position(|b| b.key == key) {
            Some(idx) => {
                self.bindings.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn lookup(&self, key: char) -> Option<&T> {
        self.bindings
            .iter()
            .find(|b| b.key == key)
            .map(|b| &b.action)
    }

    /// Run `handler` with the action bound to `key`. Returns whether a binding matched.
    pub fn dispatch(&self, key: char, handler: impl FnOnce(&T)) -> bool {
        match self.lookup(key) {
            Some(action) => {
                handler(action);
                true
            }
            None => false,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = char> + '_ {
        self.bindings.iter().map(|b| b.key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
