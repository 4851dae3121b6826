use std::{collections::BTreeMap, sync::Arc};

use agora_api::{Event, EventId, Org, OrgId, User, UserId};
use tokio::sync::RwLock;

use crate::comments::PostArena;

/// What a conditional update reports: whether a document matched the id at
/// all, and whether the update actually changed it. Callers turn the first
/// into not-found errors and the second into domain errors, never the other
/// way around.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UpdateResult {
    pub matched: bool,
    pub modified: bool,
}

pub struct Collection<K, V>(RwLock<BTreeMap<K, V>>);

impl<K: Copy + Ord, V: Clone> Collection<K, V> {
    pub fn new() -> Collection<K, V> {
        Collection(RwLock::new(BTreeMap::new()))
    }

    pub async fn insert_one(&self, id: K, doc: V) {
        self.0.write().await.insert(id, doc);
    }

    /// Inserts unless an existing document matches `conflict`; the check and
    /// the insert happen under one write lock. Returns false on conflict.
    pub async fn insert_one_unique(
        &self,
        id: K,
        doc: V,
        conflict: impl Fn(&V) -> bool,
    ) -> bool {
        let mut docs = self.0.write().await;
        if docs.values().any(conflict) {
            return false;
        }
        docs.insert(id, doc);
        true
    }

    pub async fn find_one(&self, id: K) -> Option<V> {
        self.0.read().await.get(&id).cloned()
    }

    /// Runs `update` on the matching document. `update` reports whether it
    /// changed anything, which comes back out in `modified`.
    pub async fn update_one(
        &self,
        id: K,
        update: impl FnOnce(&mut V) -> bool,
    ) -> UpdateResult {
        let mut docs = self.0.write().await;
        match docs.get_mut(&id) {
            None => UpdateResult {
                matched: false,
                modified: false,
            },
            Some(doc) => {
                let modified = update(doc);
                UpdateResult {
                    matched: true,
                    modified,
                }
            }
        }
    }

    /// Applies `update` to every listed document under one write lock and
    /// returns the ids that had no document.
    pub async fn update_many(&self, ids: &[K], mut update: impl FnMut(&mut V)) -> Vec<K> {
        let mut docs = self.0.write().await;
        let mut missing = Vec::new();
        for id in ids {
            match docs.get_mut(id) {
                Some(doc) => update(doc),
                None => missing.push(*id),
            }
        }
        missing
    }

    pub async fn delete_one(&self, id: K) -> Option<V> {
        self.0.write().await.remove(&id)
    }

    pub async fn find_all(&self, filter: impl Fn(&V) -> bool) -> Vec<V> {
        self.0
            .read()
            .await
            .values()
            .filter(|v| filter(v))
            .cloned()
            .collect()
    }

    /// One read-locked pass for callers that join or project rather than
    /// clone whole documents.
    pub async fn read_with<R>(&self, f: impl FnOnce(&BTreeMap<K, V>) -> R) -> R {
        f(&*self.0.read().await)
    }
}

/// `$addToSet`: true iff the value was not already present.
pub fn add_to_set<T: PartialEq>(set: &mut Vec<T>, value: T) -> bool {
    if set.contains(&value) {
        return false;
    }
    set.push(value);
    true
}

/// `$pull`: true iff the value was present.
pub fn pull<T: PartialEq>(set: &mut Vec<T>, value: &T) -> bool {
    match set.iter().position(|v| v == value) {
        Some(i) => {
            set.remove(i);
            true
        }
        None => false,
    }
}

pub struct Store {
    pub users: Collection<UserId, User>,
    pub orgs: Collection<OrgId, Org>,
    pub events: Collection<EventId, Event>,
    pub posts: PostArena,
}

impl Store {
    pub fn new() -> Arc<Store> {
        Arc::new(Store {
            users: Collection::new(),
            orgs: Collection::new(),
            events: Collection::new(),
            posts: PostArena::new(),
        })
    }
}
