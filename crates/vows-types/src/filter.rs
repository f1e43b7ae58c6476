use serde::{Deserialize, Serialize};

use crate::models::{Attending, RsvpEntry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceFilter {
    #[default]
    All,
    Yes,
    No,
}

impl AttendanceFilter {
    fn admits(&self, attending: Attending) -> bool {
        match self {
            Self::All => true,
            Self::Yes => attending == Attending::Yes,
            Self::No => attending == Attending::No,
        }
    }
}

/// Dashboard view filter. Both criteria must hold for an entry to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestFilter {
    #[serde(default)]
    pub attending: AttendanceFilter,
    /// Case-insensitive substring of the guest name. Entries without a
    /// name never match a non-empty search.
    #[serde(default)]
    pub search: Option<String>,
}

impl GuestFilter {
    pub fn matches(&self, entry: &RsvpEntry) -> bool {
        if !self.attending.admits(entry.attending) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(term) => entry
                .name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&term.to_lowercase())),
        }
    }

    pub fn apply<'a>(&self, entries: &'a [RsvpEntry]) -> Vec<&'a RsvpEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn entry(name: Option<&str>, attending: Attending) -> RsvpEntry {
        RsvpEntry {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            attending,
            name: name.map(str::to_string),
            phone: None,
            guests: None,
            relation: None,
            directions: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn attendance_and_search_intersect() {
        let entries = vec![
            entry(Some("Joanna"), Attending::Yes),
            entry(Some("Jonah"), Attending::No),
            entry(Some("Mary"), Attending::No),
            entry(None, Attending::No),
        ];

        let filter = GuestFilter {
            attending: AttendanceFilter::No,
            search: Some("JO".into()),
        };
        let shown = filter.apply(&entries);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].name.as_deref(), Some("Jonah"));
        assert!(shown.iter().all(|e| e.attending == Attending::No));
    }

    #[test]
    fn empty_search_keeps_unnamed_entries() {
        let entries = vec![entry(None, Attending::No), entry(Some("Ade"), Attending::Yes)];
        let filter = GuestFilter {
            attending: AttendanceFilter::All,
            search: Some("  ".into()),
        };
        assert_eq!(filter.apply(&entries).len(), 2);

        let only_no = GuestFilter {
            attending: AttendanceFilter::No,
            search: None,
        };
        assert_eq!(only_no.apply(&entries).len(), 1);
    }
}
