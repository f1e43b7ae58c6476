use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Memory, RsvpEntry};

/// Which collection an event belongs to. Subscribers pick the ones they want.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Rsvps,
    Guestbook,
}

/// Events sent over the live feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LiveEvent {
    /// Full guest list, newest first. Sent once when a dashboard subscribes.
    Snapshot { rsvps: Vec<RsvpEntry> },

    /// Full guestbook, newest first. Sent once when a guestbook view subscribes.
    MemorySnapshot { memories: Vec<Memory> },

    RsvpCreated { entry: RsvpEntry },

    RsvpUpdated { entry: RsvpEntry },

    RsvpDeleted { id: Uuid },

    MemoryCreated { memory: Memory },

    /// Like count changed on a memory
    MemoryLiked { id: Uuid, likes: u32 },
}

impl LiveEvent {
    pub fn collection(&self) -> Collection {
        match self {
            Self::Snapshot { .. }
            | Self::RsvpCreated { .. }
            | Self::RsvpUpdated { .. }
            | Self::RsvpDeleted { .. } => Collection::Rsvps,
            Self::MemorySnapshot { .. } | Self::MemoryCreated { .. } | Self::MemoryLiked { .. } => {
                Collection::Guestbook
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_with_type_and_data() {
        let id = Uuid::nil();
        let json = serde_json::to_value(LiveEvent::MemoryLiked { id, likes: 3 }).unwrap();
        assert_eq!(json["type"], "MemoryLiked");
        assert_eq!(json["data"]["likes"], 3);

        let back: LiveEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.collection(), Collection::Guestbook);
        assert_eq!(LiveEvent::RsvpDeleted { id }.collection(), Collection::Rsvps);
    }
}
