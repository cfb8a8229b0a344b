//! In-memory store (for testing/development).

use async_trait::async_trait;
use resque_redis::RedisError;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::Store;
use crate::error::{QueueError, QueueResult};

#[derive(Debug, Clone)]
enum Entry {
    Value(String),
    List(VecDeque<String>),
    Set(BTreeSet<String>),
    SortedSet(Vec<(i64, String)>),
}

impl Entry {
    fn is_empty(&self) -> bool {
        match self {
            Entry::Value(_) => false,
            Entry::List(list) => list.is_empty(),
            Entry::Set(set) => set.is_empty(),
            Entry::SortedSet(zset) => zset.is_empty(),
        }
    }
}

fn wrong_type(key: &str) -> QueueError {
    QueueError::Store(RedisError::Command(format!(
        "WRONGTYPE Operation against key '{}' holding the wrong kind of value",
        key
    )))
}

/// Resolve Redis-style inclusive range indexes against a length.
fn range_bounds(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

/// Store keeping every structure in process memory.
///
/// Mirrors the Redis semantics the queue layer depends on: lists, sets and
/// sorted sets disappear once emptied, and commands against a key holding
/// another type fail with `WRONGTYPE`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub async fn key_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether a key exists.
    pub async fn contains_key(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Remove every key.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

fn remove_if_empty(entries: &mut HashMap<String, Entry>, key: &str) {
    if entries.get(key).is_some_and(Entry::is_empty) {
        entries.remove(key);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_push(&self, key: &str, value: &str) -> QueueResult<u64> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(VecDeque::new()));

        match entry {
            Entry::List(list) => {
                list.push_back(value.to_string());
                Ok(list.len() as u64)
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> QueueResult<Vec<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::List(list)) => Ok(match range_bounds(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            }),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn list_length(&self, key: &str) -> QueueResult<usize> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            None => Ok(0),
            Some(Entry::List(list)) => Ok(list.len()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn list_remove(&self, key: &str, count: isize, value: &str) -> QueueResult<usize> {
        let mut entries = self.entries.write().await;
        let removed = match entries.get_mut(key) {
            None => return Ok(0),
            Some(Entry::List(list)) => {
                let limit = if count == 0 {
                    usize::MAX
                } else {
                    count.unsigned_abs()
                };

                let positions: Vec<usize> = if count < 0 {
                    (0..list.len())
                        .rev()
                        .filter(|&i| list[i] == value)
                        .take(limit)
                        .collect()
                } else {
                    (0..list.len())
                        .filter(|&i| list[i] == value)
                        .take(limit)
                        .collect()
                };

                let mut sorted = positions.clone();
                sorted.sort_unstable_by(|a, b| b.cmp(a));
                for index in sorted {
                    list.remove(index);
                }
                positions.len()
            }
            Some(_) => return Err(wrong_type(key)),
        };

        remove_if_empty(&mut entries, key);
        Ok(removed)
    }

    async fn delete(&self, key: &str) -> QueueResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn sorted_set_add(&self, key: &str, score: i64, member: &str) -> QueueResult<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::SortedSet(Vec::new()));

        match entry {
            Entry::SortedSet(zset) => {
                zset.retain(|(_, m)| m != member);
                zset.push((score, member.to_string()));
                zset.sort();
                Ok(())
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn sorted_set_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> QueueResult<Vec<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::SortedSet(zset)) => Ok(match range_bounds(zset.len(), start, stop) {
                Some((from, to)) => zset[from..=to].iter().map(|(_, m)| m.clone()).collect(),
                None => Vec::new(),
            }),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn sorted_set_remove(&self, key: &str, member: &str) -> QueueResult<bool> {
        let mut entries = self.entries.write().await;
        let removed = match entries.get_mut(key) {
            None => return Ok(false),
            Some(Entry::SortedSet(zset)) => {
                let before = zset.len();
                zset.retain(|(_, m)| m != member);
                zset.len() != before
            }
            Some(_) => return Err(wrong_type(key)),
        };

        remove_if_empty(&mut entries, key);
        Ok(removed)
    }

    async fn sorted_set_cardinality(&self, key: &str) -> QueueResult<usize> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            None => Ok(0),
            Some(Entry::SortedSet(zset)) => Ok(zset.len()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_add(&self, key: &str, member: &str) -> QueueResult<bool> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()));

        match entry {
            Entry::Set(set) => Ok(set.insert(member.to_string())),
            _ => Err(wrong_type(key)),
        }
    }

    async fn set_remove(&self, key: &str, member: &str) -> QueueResult<bool> {
        let mut entries = self.entries.write().await;
        let removed = match entries.get_mut(key) {
            None => return Ok(false),
            Some(Entry::Set(set)) => set.remove(member),
            Some(_) => return Err(wrong_type(key)),
        };

        remove_if_empty(&mut entries, key);
        Ok(removed)
    }

    async fn set_members(&self, key: &str) -> QueueResult<Vec<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_is_member(&self, key: &str, member: &str) -> QueueResult<bool> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            None => Ok(false),
            Some(Entry::Set(set)) => Ok(set.contains(member)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_cardinality(&self, key: &str) -> QueueResult<usize> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            None => Ok(0),
            Some(Entry::Set(set)) => Ok(set.len()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn get(&self, key: &str) -> QueueResult<Option<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            None => Ok(None),
            Some(Entry::Value(value)) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> QueueResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry::Value(value.to_string()));
        Ok(())
    }
}
