use uuid::Uuid;

use vows_types::api::GuestStats;
use vows_types::events::LiveEvent;
use vows_types::filter::GuestFilter;
use vows_types::models::RsvpEntry;

/// Dashboard guest list kept current from the live feed. Entries stay newest
/// first; the filter only changes what `visible` returns.
#[derive(Debug, Default)]
pub struct GuestListView {
    entries: Vec<RsvpEntry>,
    filter: GuestFilter,
}

impl GuestListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RsvpEntry] {
        &self.entries
    }

    pub fn filter(&self) -> &GuestFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: GuestFilter) {
        self.filter = filter;
    }

    pub fn visible(&self) -> Vec<&RsvpEntry> {
        self.filter.apply(&self.entries)
    }

    /// Totals over every entry, whatever the filter shows.
    pub fn stats(&self) -> GuestStats {
        GuestStats::tally(&self.entries)
    }

    pub fn get(&self, id: Uuid) -> Option<&RsvpEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Applies one event. Returns false for events about other collections.
    pub fn apply(&mut self, event: &LiveEvent) -> bool {
        match event {
            LiveEvent::Snapshot { rsvps } => {
                self.entries = rsvps.clone();
                self.sort();
            }
            LiveEvent::RsvpCreated { entry } | LiveEvent::RsvpUpdated { entry } => {
                self.upsert(entry.clone());
            }
            LiveEvent::RsvpDeleted { id } => {
                if let Some(pos) = self.entries.iter().position(|e| e.id == *id) {
                    self.entries.remove(pos);
                }
            }
            _ => return false,
        }
        true
    }

    fn upsert(&mut self, entry: RsvpEntry) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => {
                self.entries.push(entry);
                self.sort();
            }
        }
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use vows_types::filter::AttendanceFilter;
    use vows_types::models::{Attending, Guests};

    use super::*;

    fn entry(name: &str, attending: Attending, age_minutes: i64) -> RsvpEntry {
        RsvpEntry {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", name.to_lowercase()),
            attending,
            name: Some(name.to_string()),
            phone: None,
            guests: (attending == Attending::Yes).then_some(Guests::Two),
            relation: None,
            directions: None,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn seeded() -> (GuestListView, Vec<RsvpEntry>) {
        let entries = vec![
            entry("Amaka", Attending::Yes, 30),
            entry("Bisi", Attending::No, 20),
            entry("Chidi", Attending::Yes, 10),
        ];
        let mut view = GuestListView::new();
        view.apply(&LiveEvent::Snapshot {
            rsvps: entries.clone(),
        });
        (view, entries)
    }

    #[test]
    fn snapshot_is_shown_newest_first() {
        let (view, _) = seeded();
        let names: Vec<_> = view.entries().iter().filter_map(|e| e.name.as_deref()).collect();
        assert_eq!(names, ["Chidi", "Bisi", "Amaka"]);
    }

    #[test]
    fn delete_removes_exactly_one_entry() {
        let (mut view, entries) = seeded();
        let gone = entries[1].id;

        assert!(view.apply(&LiveEvent::RsvpDeleted { id: gone }));
        assert_eq!(view.entries().len(), 2);
        assert!(view.get(gone).is_none());

        // Deleting again changes nothing.
        view.apply(&LiveEvent::RsvpDeleted { id: gone });
        assert_eq!(view.entries().len(), 2);
    }

    #[test]
    fn updates_replace_in_place() {
        let (mut view, entries) = seeded();
        let mut edited = entries[0].clone();
        edited.attending = Attending::No;
        edited.guests = None;

        view.apply(&LiveEvent::RsvpUpdated { entry: edited.clone() });
        assert_eq!(view.entries().len(), 3);
        assert_eq!(view.get(edited.id).unwrap().attending, Attending::No);
        assert_eq!(view.stats().declined, 2);
        assert_eq!(view.stats().headcount, 2);
    }

    #[test]
    fn filter_narrows_visible_but_not_stats() {
        let (mut view, _) = seeded();
        view.apply(&LiveEvent::RsvpCreated {
            entry: entry("Chioma", Attending::No, 0),
        });

        view.set_filter(GuestFilter {
            attending: AttendanceFilter::Yes,
            search: Some("chi".into()),
        });
        let shown = view.visible();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].name.as_deref(), Some("Chidi"));
        assert_eq!(view.stats().total, 4);
    }

    #[test]
    fn guestbook_events_are_ignored() {
        let (mut view, _) = seeded();
        assert!(!view.apply(&LiveEvent::MemoryLiked {
            id: Uuid::new_v4(),
            likes: 1
        }));
        assert_eq!(view.entries().len(), 3);
    }
}
