//! Parser for generated GRUB boot menu files.
//!
//! Only entry boundaries are tracked: `menuentry` and `submenu` directives open scopes and
//! a line consisting of `}` closes the innermost one. Every other line is ignored.

use log::debug;
use thiserror::Error;

/// entry: A single parsed boot menu entry.
pub mod entry;

/// title: Extraction of quoted entry titles.
mod title;

pub use entry::{Entry, EntryKind};

/// The directive that declares a selectable entry.
pub const MENUENTRY_DIRECTIVE: &str = "menuentry";

/// The directive that declares a submenu.
pub const SUBMENU_DIRECTIVE: &str = "submenu";

/// The separator used to join the titles of nested entries into a full title.
pub const FULL_TITLE_SEPARATOR: &str = ">";

/// Errors produced when the boot menu is structurally malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuError {
    /// A directive was found while a `menuentry` scope was still open.
    #[error("a '{directive}' directive was detected inside the scope of a menuentry")]
    NestedEntry { directive: &'static str },
    /// A directive line did not carry a quoted title.
    #[error("unable to parse entry title from: {line:?}")]
    InvalidTitle { line: String },
}

/// Tracks the sibling positions at a single nesting depth.
#[derive(Default)]
struct LevelCounter {
    /// The next index to assign to a menu item.
    items: usize,
    /// The next index to assign to a submenu header.
    submenus: usize,
}

impl LevelCounter {
    /// Assigns the next index for an entry of `kind` at this level.
    fn next(&mut self, kind: EntryKind) -> usize {
        let counter = match kind {
            EntryKind::MenuItem => &mut self.items,
            EntryKind::SubmenuHeader => &mut self.submenus,
        };
        let index = *counter;
        *counter += 1;
        index
    }
}

/// A parsed boot menu: an ordered forest of entries stored as a flat list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Menu {
    entries: Vec<Entry>,
}

impl Menu {
    /// Parses the boot menu `input`. Parsing is all-or-nothing: any structural error
    /// discards the entries found so far.
    pub fn parse(input: &str) -> Result<Self, MenuError> {
        let mut entries: Vec<Entry> = Vec::new();
        // Whether a menuentry scope is currently open.
        let mut in_menu_item = false;
        // The indices of the submenus enclosing the current line, innermost last.
        let mut parents: Vec<usize> = Vec::new();
        // One counter per open depth. The top level is always present.
        let mut counters: Vec<LevelCounter> = vec![LevelCounter::default()];

        for line in input.lines() {
            let line = line.trim();

            // Determine which kind of directive this line holds, if any.
            let directive = if let Some(rest) = title::strip_directive(line, MENUENTRY_DIRECTIVE) {
                Some((EntryKind::MenuItem, MENUENTRY_DIRECTIVE, rest))
            } else {
                title::strip_directive(line, SUBMENU_DIRECTIVE)
                    .map(|rest| (EntryKind::SubmenuHeader, SUBMENU_DIRECTIVE, rest))
            };

            if let Some((kind, directive, rest)) = directive {
                // Nothing may be declared inside a menuentry.
                if in_menu_item {
                    return Err(MenuError::NestedEntry { directive });
                }

                let Some(title) = title::extract(rest) else {
                    return Err(MenuError::InvalidTitle {
                        line: line.to_string(),
                    });
                };

                let depth = parents.len();
                let index = counters
                    .last_mut()
                    .map_or(0, |counter| counter.next(kind));

                debug!("found entry: [{}] {}{}", depth, "  ".repeat(depth), title);
                entries.push(Entry {
                    kind,
                    title: title.to_string(),
                    index,
                    depth,
                    parent: parents.last().copied(),
                });

                match kind {
                    EntryKind::MenuItem => {
                        in_menu_item = true;
                    }

                    EntryKind::SubmenuHeader => {
                        // Open a new nesting level with fresh sibling counters.
                        parents.push(entries.len() - 1);
                        counters.push(LevelCounter::default());
                    }
                }
                continue;
            }

            if line == "}" {
                if in_menu_item {
                    in_menu_item = false;
                } else if parents.pop().is_some() {
                    counters.pop();
                }
                // Unmatched closing braces at the top level are ignored.
            }
        }

        Ok(Self { entries })
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Checks if the menu holds no selectable entries.
    pub fn has_menu_items(&self) -> bool {
        self.entries.iter().any(Entry::is_menu_item)
    }

    /// Fetches the parent of `entry`, if it is nested inside a submenu.
    pub fn parent(&self, entry: &Entry) -> Option<&Entry> {
        entry.parent.and_then(|index| self.entries.get(index))
    }

    /// Builds the full title of `entry`, including the titles of all enclosing submenus
    /// joined with [FULL_TITLE_SEPARATOR].
    pub fn full_title(&self, entry: &Entry) -> String {
        let mut titles = vec![entry.title.as_str()];
        let mut current = self.parent(entry);
        while let Some(parent) = current {
            titles.push(parent.title.as_str());
            current = self.parent(parent);
        }
        titles.reverse();
        titles.join(FULL_TITLE_SEPARATOR)
    }

    /// The full titles of every selectable entry, in declaration order.
    pub fn entry_titles(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.is_menu_item())
            .map(|entry| self.full_title(entry))
            .collect()
    }

    /// The titles of the selectable entries outside of any submenu, in declaration order.
    pub fn simple_entry_titles(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.is_menu_item() && entry.is_top_level())
            .map(|entry| entry.title.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRUB_CFG: &str = r#"
### BEGIN /etc/grub.d/10_linux ###
function gfxmode {
	set gfxpayload="${1}"
}
menuentry 'Debian GNU/Linux' --class debian --class gnu-linux $menuentry_id_option 'gnulinux-simple' {
	load_video
	linux	/boot/vmlinuz-6.1.0-13-amd64 root=UUID=abc ro quiet
}
submenu 'Advanced options for Debian GNU/Linux' $menuentry_id_option 'gnulinux-advanced' {
	menuentry 'Debian GNU/Linux, with Linux 6.1.0-13-amd64' --class debian {
		linux	/boot/vmlinuz-6.1.0-13-amd64
	}
	menuentry 'Debian GNU/Linux, with Linux 6.1.0-13-amd64 (recovery mode)' --class debian {
		linux	/boot/vmlinuz-6.1.0-13-amd64 single
	}
}
### END /etc/grub.d/10_linux ###
menuentry "Windows Boot Manager (on /dev/sda1)" --class windows {
	chainloader +1
}
"#;

    #[test]
    fn parses_top_level_and_nested_entries() {
        let menu = Menu::parse(GRUB_CFG).expect("menu should parse");
        let entries = menu.entries();
        assert_eq!(entries.len(), 5);

        assert_eq!(entries[0].kind, EntryKind::MenuItem);
        assert_eq!(entries[0].title, "Debian GNU/Linux");
        assert_eq!((entries[0].index, entries[0].depth, entries[0].parent), (0, 0, None));

        assert_eq!(entries[1].kind, EntryKind::SubmenuHeader);
        assert_eq!((entries[1].index, entries[1].depth, entries[1].parent), (0, 0, None));

        assert_eq!(entries[2].parent, Some(1));
        assert_eq!((entries[2].index, entries[2].depth), (0, 1));
        assert_eq!((entries[3].index, entries[3].depth), (1, 1));

        assert_eq!(entries[4].title, "Windows Boot Manager (on /dev/sda1)");
        assert_eq!((entries[4].index, entries[4].depth, entries[4].parent), (1, 0, None));
    }

    #[test]
    fn builds_full_and_simple_titles() {
        let menu = Menu::parse(GRUB_CFG).expect("menu should parse");
        assert_eq!(
            menu.entry_titles(),
            vec![
                "Debian GNU/Linux",
                "Advanced options for Debian GNU/Linux>Debian GNU/Linux, with Linux 6.1.0-13-amd64",
                "Advanced options for Debian GNU/Linux>Debian GNU/Linux, with Linux 6.1.0-13-amd64 (recovery mode)",
                "Windows Boot Manager (on /dev/sda1)",
            ]
        );
        assert_eq!(
            menu.simple_entry_titles(),
            vec!["Debian GNU/Linux", "Windows Boot Manager (on /dev/sda1)"]
        );
    }

    #[test]
    fn every_menuentry_produces_one_entry() {
        let input = "menuentry 'a' {\n}\nsubmenu 's' {\nmenuentry 'b' {\n}\nsubmenu 't' {\nmenuentry 'c' {\n}\n}\n}\nmenuentry 'd' {\n}\n";
        let menu = Menu::parse(input).expect("menu should parse");
        let titles = menu
            .entries()
            .iter()
            .filter(|entry| entry.is_menu_item())
            .map(|entry| entry.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["a", "b", "c", "d"]);
        assert_eq!(menu.entry_titles()[2], "s>t>c");
    }

    #[test]
    fn sibling_counter_resets_per_submenu() {
        let input = "submenu 's1' {\nmenuentry 'a' {\n}\nmenuentry 'b' {\n}\n}\nsubmenu 's2' {\nmenuentry 'c' {\n}\n}\nmenuentry 'd' {\n}\n";
        let menu = Menu::parse(input).expect("menu should parse");
        let indices = menu
            .entries()
            .iter()
            .map(|entry| (entry.title.as_str(), entry.index))
            .collect::<Vec<_>>();
        assert_eq!(
            indices,
            vec![("s1", 0), ("a", 0), ("b", 1), ("s2", 1), ("c", 0), ("d", 0)]
        );
    }

    #[test]
    fn nested_menuentry_is_malformed() {
        let input = "menuentry 'a' {\nmenuentry 'b' {\n}\n}\n";
        assert_eq!(
            Menu::parse(input),
            Err(MenuError::NestedEntry {
                directive: MENUENTRY_DIRECTIVE
            })
        );
    }

    #[test]
    fn submenu_inside_menuentry_is_malformed() {
        let input = "menuentry 'a' {\nsubmenu 'b' {\n}\n}\n";
        assert_eq!(
            Menu::parse(input),
            Err(MenuError::NestedEntry {
                directive: SUBMENU_DIRECTIVE
            })
        );
    }

    #[test]
    fn missing_title_reports_line() {
        let input = "menuentry 'ok' {\n}\n  menuentry broken {\n}\n";
        assert_eq!(
            Menu::parse(input),
            Err(MenuError::InvalidTitle {
                line: "menuentry broken {".to_string()
            })
        );
    }

    #[test]
    fn unmatched_closing_braces_are_ignored() {
        let input = "}\n}\nmenuentry 'a' {\n}\n}\nmenuentry 'b' {\n}\n";
        let menu = Menu::parse(input).expect("menu should parse");
        assert_eq!(menu.simple_entry_titles(), vec!["a", "b"]);
        assert_eq!(menu.entries()[1].index, 1);
    }

    #[test]
    fn identical_titles_are_distinct_entries() {
        let input = "menuentry 'same' {\n}\nmenuentry 'same' {\n}\n";
        let menu = Menu::parse(input).expect("menu should parse");
        assert_eq!(menu.entries().len(), 2);
        assert_eq!(menu.entries()[1].index, 1);
    }

    #[test]
    fn empty_input_has_no_items() {
        let menu = Menu::parse("").expect("menu should parse");
        assert!(!menu.has_menu_items());
        assert!(menu.entry_titles().is_empty());
    }
}
