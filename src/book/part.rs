use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entry::GradeBookEntry;

/// A category of the gradebook: entry name → entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBookPart {
    /// Key of the part inside the book.
    name:         String,
    /// Title shown to people.
    #[serde(default)]
    display_name: Option<String>,
    /// Sort position within the book.
    #[serde(default)]
    order:        u32,
    /// Entries here are graded by the instructor only; students never
    /// submit anything for them.
    #[serde(default)]
    no_submit:    bool,
    /// Entries keyed by name.
    #[serde(default)]
    entries:      BTreeMap<String, GradeBookEntry>,
}

impl GradeBookPart {
    /// Creates an empty part.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:         name.into(),
            display_name: None,
            order:        0,
            no_submit:    false,
            entries:      BTreeMap::new(),
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the sort position.
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Marks the part as instructor-graded only.
    pub fn with_no_submit(mut self, no_submit: bool) -> Self {
        self.no_submit = no_submit;
        self
    }

    /// Key of the part.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name, falling back to the key.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Sort position.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Whether the part is instructor-graded only.
    pub fn is_no_submit(&self) -> bool {
        self.no_submit
    }

    /// Adds an entry, returning the one it replaced.
    pub fn insert_entry(&mut self, entry: GradeBookEntry) -> Option<GradeBookEntry> {
        self.entries.insert(entry.name().to_string(), entry)
    }

    /// Looks up an entry by name.
    pub fn entry(&self, name: &str) -> Option<&GradeBookEntry> {
        self.entries.get(name)
    }

    /// Mutable lookup by name.
    pub fn entry_mut(&mut self, name: &str) -> Option<&mut GradeBookEntry> {
        self.entries.get_mut(name)
    }

    /// Removes an entry by name.
    pub fn remove_entry(&mut self, name: &str) -> Option<GradeBookEntry> {
        self.entries.remove(name)
    }

    /// Finds the entry recording `assignment_id`.
    pub fn entry_by_assignment(&self, assignment_id: &str) -> Option<&GradeBookEntry> {
        self.entries
            .values()
            .find(|e| e.assignment_id() == assignment_id)
    }

    /// Mutable variant of [`GradeBookPart::entry_by_assignment`].
    pub fn entry_by_assignment_mut(&mut self, assignment_id: &str) -> Option<&mut GradeBookEntry> {
        self.entries
            .values_mut()
            .find(|e| e.assignment_id() == assignment_id)
    }

    /// Entries sorted by order, then name.
    pub fn entries(&self) -> Vec<&GradeBookEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| a.order().cmp(&b.order()).then_with(|| a.name().cmp(b.name())));
        entries
    }

    /// Mutable access to every entry, in name order.
    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut GradeBookEntry> {
        self.entries.values_mut()
    }

    /// Whether an entry named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the part has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
