use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use vows_types::events::LiveEvent;
use vows_types::models::Memory;

use crate::api::ApiClient;
use crate::error::ClientError;

/// Memories this browser has liked, kept as a JSON array of ids.
#[derive(Debug, Default)]
pub struct LikedSet {
    ids: BTreeSet<Uuid>,
    path: Option<PathBuf>,
}

impl LikedSet {
    /// Reads the set from disk. A missing file is an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let ids = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeSet::new(),
            Ok(raw) => serde_json::from_str::<Vec<Uuid>>(&raw)?.into_iter().collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {} liked memories from {}", ids.len(), path.display());
        Ok(Self {
            ids,
            path: Some(path),
        })
    }

    /// A set that is never written anywhere.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn set(&mut self, id: Uuid, liked: bool) {
        if liked {
            self.ids.insert(id);
        } else {
            self.ids.remove(&id);
        }
    }

    pub fn save(&self) -> Result<(), ClientError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let ids: Vec<&Uuid> = self.ids.iter().collect();
        std::fs::write(path, serde_json::to_vec(&ids)?)?;
        Ok(())
    }
}

/// Server side of a like toggle. Returns the authoritative count.
#[async_trait]
pub trait LikeRemote: Send + Sync {
    async fn set_like(&self, id: Uuid, liked: bool) -> Result<u32, ClientError>;
}

#[async_trait]
impl LikeRemote for ApiClient {
    async fn set_like(&self, id: Uuid, liked: bool) -> Result<u32, ClientError> {
        ApiClient::set_like(self, id, liked).await
    }
}

/// A speculative like or unlike, with what it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LikeChange {
    id: Uuid,
    liked: bool,
    likes_before: u32,
}

/// Guestbook as one browser sees it: the memories plus which of them it liked.
#[derive(Debug)]
pub struct Guestbook {
    memories: Vec<Memory>,
    liked: LikedSet,
}

impl Guestbook {
    pub fn new(memories: Vec<Memory>, liked: LikedSet) -> Self {
        let mut book = Self { memories, liked };
        book.sort();
        book
    }

    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    pub fn get(&self, id: Uuid) -> Option<&Memory> {
        self.memories.iter().find(|m| m.id == id)
    }

    pub fn is_liked(&self, id: Uuid) -> bool {
        self.liked.contains(&id)
    }

    pub fn liked(&self) -> &LikedSet {
        &self.liked
    }

    fn memory_mut(&mut self, id: Uuid) -> Option<&mut Memory> {
        self.memories.iter_mut().find(|m| m.id == id)
    }

    fn sort(&mut self) {
        self.memories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    fn apply(&mut self, change: LikeChange) {
        if let Some(memory) = self.memory_mut(change.id) {
            memory.likes = if change.liked {
                change.likes_before.saturating_add(1)
            } else {
                change.likes_before.saturating_sub(1)
            };
        }
        self.liked.set(change.id, change.liked);
    }

    fn revert(&mut self, change: LikeChange) {
        if let Some(memory) = self.memory_mut(change.id) {
            memory.likes = change.likes_before;
        }
        self.liked.set(change.id, !change.liked);
    }

    /// Likes the memory if this browser has not, unlikes it otherwise.
    ///
    /// The count and the liked set change locally first and are persisted
    /// before the server hears about it. If the server call fails both are
    /// put back exactly as they were and the error is returned.
    pub async fn toggle_like<R>(&mut self, remote: &R, id: Uuid) -> Result<u32, ClientError>
    where
        R: LikeRemote + ?Sized,
    {
        let likes_before = self.get(id).ok_or(ClientError::UnknownMemory(id))?.likes;
        let change = LikeChange {
            id,
            liked: !self.liked.contains(&id),
            likes_before,
        };

        self.apply(change);
        if let Err(e) = self.liked.save() {
            self.revert(change);
            return Err(e);
        }

        match remote.set_like(id, change.liked).await {
            Ok(likes) => {
                if let Some(memory) = self.memory_mut(id) {
                    memory.likes = likes;
                }
                Ok(likes)
            }
            Err(e) => {
                warn!("Like toggle on {} failed, rolling back: {}", id, e);
                self.revert(change);
                if let Err(save_err) = self.liked.save() {
                    warn!("Could not persist rollback for {}: {}", id, save_err);
                }
                Err(e)
            }
        }
    }

    /// Folds a guestbook event from the live feed into the view.
    pub fn apply_event(&mut self, event: &LiveEvent) {
        match event {
            LiveEvent::MemorySnapshot { memories } => {
                self.memories = memories.clone();
                self.sort();
            }
            LiveEvent::MemoryCreated { memory } => {
                if self.get(memory.id).is_none() {
                    self.memories.push(memory.clone());
                    self.sort();
                }
            }
            LiveEvent::MemoryLiked { id, likes } => {
                if let Some(memory) = self.memory_mut(*id) {
                    memory.likes = *likes;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::{Duration, Utc};
    use vows_types::api::ErrorBody;

    use super::*;

    /// Stands in for the server: keeps real counts, can be told to fail.
    struct FakeRemote {
        likes: Mutex<u32>,
        fail: AtomicBool,
    }

    impl FakeRemote {
        fn new(likes: u32) -> Self {
            Self {
                likes: Mutex::new(likes),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl LikeRemote for FakeRemote {
        async fn set_like(&self, _id: Uuid, liked: bool) -> Result<u32, ClientError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::Api {
                    status: 503,
                    body: ErrorBody {
                        title: "Something went wrong".into(),
                        description: "Service Unavailable".into(),
                        fields: None,
                    },
                });
            }
            let mut likes = self.likes.lock().unwrap();
            *likes = if liked { *likes + 1 } else { likes.saturating_sub(1) };
            Ok(*likes)
        }
    }

    fn memory(likes: u32, age_minutes: i64) -> Memory {
        Memory {
            id: Uuid::new_v4(),
            name: "Tolu".into(),
            message: "Congratulations to you both!".into(),
            photo: None,
            likes,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("vows-client-{}", Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn like_then_unlike_restores_count() {
        let m = memory(4, 0);
        let id = m.id;
        let remote = FakeRemote::new(4);
        let mut book = Guestbook::new(vec![m], LikedSet::in_memory());

        assert_eq!(book.toggle_like(&remote, id).await.unwrap(), 5);
        assert!(book.is_liked(id));

        assert_eq!(book.toggle_like(&remote, id).await.unwrap(), 4);
        assert!(!book.is_liked(id));
        assert_eq!(book.get(id).unwrap().likes, 4);
        assert!(book.liked().is_empty());
    }

    #[tokio::test]
    async fn failed_toggle_rolls_back_count_and_set() {
        let path = temp_path("liked.json");
        let m = memory(2, 0);
        let id = m.id;
        let remote = FakeRemote::new(2);
        remote.fail.store(true, Ordering::SeqCst);

        let mut book = Guestbook::new(vec![m], LikedSet::load(&path).unwrap());
        assert!(book.toggle_like(&remote, id).await.is_err());
        assert_eq!(book.get(id).unwrap().likes, 2);
        assert!(!book.is_liked(id));

        // The rollback reached disk too.
        assert!(LikedSet::load(&path).unwrap().is_empty());
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[tokio::test]
    async fn liked_set_survives_reload() {
        let path = temp_path("liked.json");
        let m = memory(0, 0);
        let id = m.id;
        let remote = FakeRemote::new(0);

        let mut book = Guestbook::new(vec![m], LikedSet::load(&path).unwrap());
        book.toggle_like(&remote, id).await.unwrap();

        let reloaded = LikedSet::load(&path).unwrap();
        assert!(reloaded.contains(&id));
        assert_eq!(reloaded.len(), 1);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[tokio::test]
    async fn unknown_memory_is_rejected_without_side_effects() {
        let remote = FakeRemote::new(0);
        let mut book = Guestbook::new(vec![memory(1, 0)], LikedSet::in_memory());
        let err = book.toggle_like(&remote, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ClientError::UnknownMemory(_)));
        assert!(book.liked().is_empty());
        assert_eq!(*remote.likes.lock().unwrap(), 0);
    }

    #[test]
    fn live_events_keep_newest_first() {
        let older = memory(0, 10);
        let mut book = Guestbook::new(vec![older.clone()], LikedSet::in_memory());

        let newer = memory(0, 0);
        book.apply_event(&LiveEvent::MemoryCreated {
            memory: newer.clone(),
        });
        book.apply_event(&LiveEvent::MemoryCreated {
            memory: newer.clone(),
        });
        book.apply_event(&LiveEvent::MemoryLiked {
            id: older.id,
            likes: 7,
        });

        assert_eq!(book.memories().len(), 2);
        assert_eq!(book.memories()[0].id, newer.id);
        assert_eq!(book.get(older.id).unwrap().likes, 7);
    }
}
