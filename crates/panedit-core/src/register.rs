//! Yank/delete storage.
//!
//! A register is written once per delete or yank and never mutated.
//! Pasting clones the stored lines; each clone shares the original
//! `Arc<Origin>`, so three pastes of one deleted file are three
//! occurrences of the same identity.

use panedit_buffer::BufferItem;

/// What a register holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Register {
    /// Whole lines (`dd`, `yj`, `cG`, ...)
    Lines(Vec<BufferItem>),
    /// Text from inside one line (`dl`, `yiw`, `dfx`, ...)
    Chars(String),
}

impl Register {
    /// Returns true if the register holds whole lines.
    pub fn is_linewise(&self) -> bool {
        matches!(self, Register::Lines(_))
    }

    /// Lines to insert for `count` pastes.
    ///
    /// Items are cloned; origins are shared, not copied.
    pub fn paste_lines(&self, count: usize) -> Vec<BufferItem> {
        match self {
            Register::Lines(items) => {
                let mut out = Vec::with_capacity(items.len() * count);
                for _ in 0..count {
                    out.extend(items.iter().cloned());
                }
                out
            }
            Register::Chars(_) => Vec::new(),
        }
    }
}

/// The unnamed register shared by all buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    content: Option<Register>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores whole lines.
    pub fn write_lines(&mut self, items: Vec<BufferItem>) {
        if items.is_empty() {
            return;
        }
        tracing::trace!(lines = items.len(), "register write");
        self.content = Some(Register::Lines(items));
    }

    /// Stores text from inside a line.
    pub fn write_chars(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.content = Some(Register::Chars(text));
    }

    /// The current register content.
    pub fn get(&self) -> Option<&Register> {
        self.content.as_ref()
    }

    /// Returns true if nothing has been yanked or deleted yet.
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    /// Forgets the content.
    pub fn clear(&mut self) {
        self.content = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panedit_buffer::Origin;
    use std::sync::Arc;

    #[test]
    fn test_paste_shares_origin() {
        let mut registry = Registry::new();
        registry.write_lines(vec![BufferItem::real(Origin::file("a"))]);

        let Some(register) = registry.get() else {
            panic!("register should be set");
        };
        let pasted = register.paste_lines(3);
        assert_eq!(pasted.len(), 3);
        let first = pasted[0].origin().unwrap();
        assert!(pasted.iter().all(|item| Arc::ptr_eq(item.origin().unwrap(), first)));
    }

    #[test]
    fn test_empty_writes_are_ignored() {
        let mut registry = Registry::new();
        registry.write_chars("abc");
        registry.write_lines(Vec::new());
        registry.write_chars("");
        assert_eq!(registry.get(), Some(&Register::Chars("abc".into())));
        assert!(!registry.get().unwrap().is_linewise());
        assert!(registry.get().unwrap().paste_lines(2).is_empty());
    }
}
