//! Command Dispatcher
//!
//! Implements get / gets / get_many / set / cas / delete on top of the shared
//! store, and signals the eviction worker after every successful write.

use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{shared, CacheItem, CacheStore, CasOutcome, SharedStore};
use crate::models::{Command, Response};
use crate::tasks::{spawn_eviction_worker, EvictionSignal};

// == Command Dispatcher ==
/// Executes cache commands. Cheap to clone; one clone per connection.
#[derive(Clone, Debug)]
pub struct CommandDispatcher {
    store: SharedStore,
    evictor: EvictionSignal,
}

impl CommandDispatcher {
    /// Creates a dispatcher over an existing store and eviction signal.
    pub fn new(store: SharedStore, evictor: EvictionSignal) -> Self {
        Self { store, evictor }
    }

    /// Shares `store` and starts its eviction worker.
    ///
    /// # Returns
    /// The dispatcher and the worker's JoinHandle, aborted at shutdown.
    pub fn spawn(store: CacheStore) -> (Self, JoinHandle<()>) {
        let store = shared(store);
        let evictor = EvictionSignal::new();
        let worker = spawn_eviction_worker(store.clone(), evictor.clone());
        (Self::new(store, evictor), worker)
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    // == Set ==
    /// Stores a value unconditionally. Returns the new CAS token.
    pub async fn set(&self, key: Bytes, value: Bytes, flags: u32, ttl: u64) -> u64 {
        let cas = self.store.write().await.put(key, value, flags, ttl);
        self.evictor.signal();
        cas
    }

    // == Get ==
    /// Returns the live value for `key`, if any.
    pub async fn get(&self, key: &[u8]) -> Option<CacheItem> {
        self.store.write().await.get(key)
    }

    /// Same as [`CommandDispatcher::get`]; the item carries the CAS token.
    pub async fn gets(&self, key: &[u8]) -> Option<CacheItem> {
        self.get(key).await
    }

    // == Get Many ==
    /// Looks each key up independently; missing and expired keys are skipped.
    ///
    /// The lock is taken per key, so the result is not a snapshot across keys.
    pub async fn get_many(&self, keys: &[Bytes]) -> Vec<CacheItem> {
        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(item) = self.get(key).await {
                items.push(item);
            }
        }
        items
    }

    // == Compare And Swap ==
    /// Stores `value` only if the key is live and still carries `token`.
    pub async fn cas(&self, key: Bytes, value: Bytes, flags: u32, ttl: u64, token: u64) -> CasOutcome {
        let outcome = self.store.write().await.cas(key, value, flags, ttl, token);
        if outcome == CasOutcome::Stored {
            self.evictor.signal();
        }
        outcome
    }

    // == Delete ==
    /// Removes `key`. Returns false if there was nothing to remove.
    pub async fn delete(&self, key: &[u8]) -> bool {
        self.store.write().await.remove(key)
    }

    // == Execute ==
    /// Runs a decoded protocol command.
    pub async fn execute(&self, command: Command) -> Response {
        debug!(command = command.name(), "executing");

        match command {
            Command::Get { keys } => Response::Values {
                items: self.retrieve(&keys).await,
                with_cas: false,
            },
            Command::Gets { keys } => Response::Values {
                items: self.retrieve(&keys).await,
                with_cas: true,
            },
            Command::Set {
                key,
                flags,
                exptime,
                value,
                ..
            } => {
                self.set(key, value, flags, exptime).await;
                Response::Stored
            }
            Command::Cas {
                key,
                flags,
                exptime,
                cas,
                value,
                ..
            } => self.cas(key, value, flags, exptime, cas).await.into(),
            Command::Delete { key, .. } => {
                if self.delete(&key).await {
                    Response::Deleted
                } else {
                    Response::NotFound
                }
            }
        }
    }

    async fn retrieve(&self, keys: &[Bytes]) -> Vec<CacheItem> {
        match keys {
            [key] => self.get(key).await.into_iter().collect(),
            _ => self.get_many(keys).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CapacityPolicy;
    use std::time::Duration;

    fn b(s: &'static str) -> Bytes {
        Bytes::from(s)
    }

    fn unbounded() -> (CommandDispatcher, JoinHandle<()>) {
        CommandDispatcher::spawn(CacheStore::unbounded())
    }

    /// Capacity of 30 bytes recovering 40% per sweep.
    fn small() -> (CommandDispatcher, JoinHandle<()>) {
        CommandDispatcher::spawn(CacheStore::new(CapacityPolicy::new(30, Some(40))))
    }

    async fn value(dispatcher: &CommandDispatcher, key: &str) -> Option<Bytes> {
        dispatcher.get(key.as_bytes()).await.map(|item| item.value)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (dispatcher, worker) = unbounded();

        dispatcher.set(b("first_key"), b("first_value"), 0, 0).await;
        assert_eq!(value(&dispatcher, "first_key").await, Some(b("first_value")));

        worker.abort();
    }

    #[tokio::test]
    async fn test_get_many_returns_present_keys_only() {
        let (dispatcher, worker) = unbounded();

        dispatcher.set(b("first_key"), b("first_value"), 0, 0).await;
        dispatcher.set(b("second_key"), b("second_value"), 0, 0).await;

        let items = dispatcher
            .get_many(&[b("first_key"), b("missing"), b("second_key")])
            .await;

        let pairs: Vec<(Bytes, Bytes)> = items.into_iter().map(|i| (i.key, i.value)).collect();
        assert_eq!(
            pairs,
            vec![
                (b("first_key"), b("first_value")),
                (b("second_key"), b("second_value")),
            ]
        );

        worker.abort();
    }

    #[tokio::test]
    async fn test_get_many_skips_expired_keys() {
        let (dispatcher, worker) = unbounded();

        dispatcher.set(b("short_lived"), b("gone"), 0, 1).await;
        dispatcher.set(b("durable"), b("kept"), 0, 0).await;
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let keys: Vec<Bytes> = dispatcher
            .get_many(&[b("short_lived"), b("durable")])
            .await
            .into_iter()
            .map(|item| item.key)
            .collect();
        assert_eq!(keys, vec![b("durable")]);

        worker.abort();
    }

    #[tokio::test]
    async fn test_get_expired() {
        let (dispatcher, worker) = unbounded();

        dispatcher.set(b("first_key"), b("first_value"), 0, 0).await;
        dispatcher.set(b("first_key"), b("first_value"), 0, 1).await;
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(value(&dispatcher, "first_key").await, None);

        worker.abort();
    }

    #[tokio::test]
    async fn test_get_deleted() {
        let (dispatcher, worker) = unbounded();

        dispatcher.set(b("first_key"), b("first_value"), 0, 0).await;
        assert!(dispatcher.delete(b"first_key").await);
        assert_eq!(value(&dispatcher, "first_key").await, None);
        assert!(!dispatcher.delete(b"first_key").await);

        worker.abort();
    }

    #[tokio::test]
    async fn test_cas_update_ok() {
        let (dispatcher, worker) = unbounded();

        dispatcher.set(b("first_key"), b("first_value"), 0, 0).await;
        let token = dispatcher.gets(b"first_key").await.unwrap().cas;

        let outcome = dispatcher.cas(b("first_key"), b("second_value"), 0, 0, token).await;

        assert_eq!(outcome, CasOutcome::Stored);
        assert_eq!(value(&dispatcher, "first_key").await, Some(b("second_value")));
        assert!(dispatcher.gets(b"first_key").await.unwrap().cas > token);

        worker.abort();
    }

    #[tokio::test]
    async fn test_cas_update_invalid_token() {
        let (dispatcher, worker) = unbounded();

        dispatcher.set(b("first_key"), b("first_value"), 0, 0).await;
        let token = dispatcher.gets(b"first_key").await.unwrap().cas;
        dispatcher.set(b("first_key"), b("second_value"), 0, 0).await;

        let outcome = dispatcher.cas(b("first_key"), b("third_value"), 0, 0, token).await;

        assert_eq!(outcome, CasOutcome::Exists);
        assert_eq!(value(&dispatcher, "first_key").await, Some(b("second_value")));

        worker.abort();
    }

    #[tokio::test]
    async fn test_cas_on_expired_is_missing() {
        let (dispatcher, worker) = unbounded();

        dispatcher.set(b("first_key"), b("first_value"), 0, 1).await;
        let token = dispatcher.gets(b"first_key").await.unwrap().cas;
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let outcome = dispatcher.cas(b("first_key"), b("second_value"), 0, 0, token).await;
        assert_eq!(outcome, CasOutcome::Missing);

        worker.abort();
    }

    #[tokio::test]
    async fn test_cas_on_deleted_is_missing() {
        let (dispatcher, worker) = unbounded();

        dispatcher.set(b("first_key"), b("first_value"), 0, 0).await;
        let token = dispatcher.gets(b"first_key").await.unwrap().cas;
        dispatcher.delete(b"first_key").await;

        let outcome = dispatcher.cas(b("first_key"), b("second_value"), 0, 0, token).await;
        assert_eq!(outcome, CasOutcome::Missing);
        assert_eq!(value(&dispatcher, "first_key").await, None);

        worker.abort();
    }

    #[tokio::test]
    async fn test_no_eviction_below_capacity() {
        let (dispatcher, worker) = small();

        dispatcher.set(b("first_key"), b("121212121212"), 0, 0).await;
        dispatcher.set(b("second_key"), b("88888888"), 0, 0).await;
        dispatcher.set(b("third_key"), b("999999999"), 0, 0).await;
        settle().await;

        assert_eq!(value(&dispatcher, "first_key").await, Some(b("121212121212")));
        assert_eq!(value(&dispatcher, "second_key").await, Some(b("88888888")));
        assert_eq!(value(&dispatcher, "third_key").await, Some(b("999999999")));

        worker.abort();
    }

    #[tokio::test]
    async fn test_evicts_one_entry() {
        let (dispatcher, worker) = small();

        dispatcher.set(b("first_key"), b("121212121212"), 0, 0).await;
        dispatcher.set(b("second_key"), b("88888888"), 0, 0).await;
        dispatcher.set(b("third_key"), b("151515151515151"), 0, 0).await;
        settle().await;

        assert_eq!(value(&dispatcher, "first_key").await, None);
        assert_eq!(value(&dispatcher, "second_key").await, Some(b("88888888")));
        assert_eq!(value(&dispatcher, "third_key").await, Some(b("151515151515151")));

        worker.abort();
    }

    #[tokio::test]
    async fn test_evicts_down_to_recovery_target() {
        let (dispatcher, worker) = small();

        dispatcher.set(b("first_key"), b("88888888"), 0, 0).await;
        dispatcher.set(b("second_key"), b("88888888"), 0, 0).await;
        dispatcher.set(b("third_key"), b("151515151515151"), 0, 0).await;
        settle().await;

        assert_eq!(value(&dispatcher, "first_key").await, None);
        assert_eq!(value(&dispatcher, "second_key").await, None);
        assert_eq!(value(&dispatcher, "third_key").await, Some(b("151515151515151")));

        worker.abort();
    }

    #[tokio::test]
    async fn test_touched_entry_survives_eviction() {
        let (dispatcher, worker) = small();

        dispatcher.set(b("first_key"), b("121212121212"), 0, 0).await;
        dispatcher.set(b("second_key"), b("88888888"), 0, 0).await;
        dispatcher.set(b("third_key"), b("88888888"), 0, 0).await;
        dispatcher.get(b"first_key").await;
        dispatcher.set(b("fourth_key"), b("151515151515151"), 0, 0).await;
        settle().await;

        assert_eq!(value(&dispatcher, "second_key").await, None);
        assert_eq!(value(&dispatcher, "third_key").await, None);
        assert_eq!(value(&dispatcher, "first_key").await, Some(b("121212121212")));
        assert_eq!(value(&dispatcher, "fourth_key").await, Some(b("151515151515151")));

        worker.abort();
    }

    #[tokio::test]
    async fn test_execute_maps_outcomes() {
        let (dispatcher, worker) = unbounded();

        let stored = dispatcher
            .execute(Command::Set {
                key: b("k"),
                flags: 9,
                exptime: 0,
                value: b("v"),
                noreply: false,
            })
            .await;
        assert_eq!(stored, Response::Stored);

        let Response::Values { items, with_cas } = dispatcher
            .execute(Command::Gets {
                keys: vec![b("k"), b("absent")],
            })
            .await
        else {
            panic!("expected values");
        };
        assert!(with_cas);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].flags, 9);

        let stale = dispatcher
            .execute(Command::Cas {
                key: b("k"),
                flags: 0,
                exptime: 0,
                cas: items[0].cas + 100,
                value: b("w"),
                noreply: false,
            })
            .await;
        assert_eq!(stale, Response::Exists);

        let deleted = dispatcher
            .execute(Command::Delete {
                key: b("k"),
                noreply: false,
            })
            .await;
        assert_eq!(deleted, Response::Deleted);

        let missing = dispatcher
            .execute(Command::Delete {
                key: b("k"),
                noreply: false,
            })
            .await;
        assert_eq!(missing, Response::NotFound);

        worker.abort();
    }

    #[tokio::test]
    async fn test_concurrent_writers_converge_under_capacity() {
        let (dispatcher, worker) =
            CommandDispatcher::spawn(CacheStore::new(CapacityPolicy::new(1000, Some(50))));

        let mut tasks = Vec::new();
        for writer in 0..8 {
            let dispatcher = dispatcher.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..50 {
                    let key = Bytes::from(format!("w{writer}-{i}"));
                    dispatcher.set(key, Bytes::from(vec![b'x'; 20]), 0, 0).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        settle().await;

        let store = dispatcher.store().read().await;
        assert!(store.total_bytes() <= 1000);
        store.assert_consistent();
        drop(store);

        worker.abort();
    }
}
