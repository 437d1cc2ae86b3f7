/// The kind of boot menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A selectable entry, declared with `menuentry`.
    MenuItem,
    /// A grouping entry, declared with `submenu`.
    SubmenuHeader,
}

/// Represents a parsed boot menu entry.
///
/// Entries are stored in a flat list owned by [crate::Menu]. The hierarchy is
/// expressed by `parent`, an index into that same list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The kind of the entry.
    pub kind: EntryKind,
    /// The title of the entry, with the surrounding quotes removed.
    pub title: String,
    /// The position of this entry among its siblings at the same depth.
    pub index: usize,
    /// The nesting depth of the entry. Top-level entries have a depth of zero.
    pub depth: usize,
    /// The index of the enclosing submenu header in the menu, if any.
    pub parent: Option<usize>,
}

impl Entry {
    /// Checks if this entry is a selectable menu item.
    pub fn is_menu_item(&self) -> bool {
        self.kind == EntryKind::MenuItem
    }

    /// Checks if this entry is declared outside of any submenu.
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}
