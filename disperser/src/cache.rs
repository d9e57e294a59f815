use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use ark_bn254::G1Affine;
use datalayr_primitives::frame::Frame;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{config::CodedDataCacheConfig, errors::CacheError, store::Store};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // entries stay consistent across a panicking holder
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The most recent encoding, keyed by the Keccak digest of its payload and
/// the code it was encoded with.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedEncoding {
    pub digest: [u8; 32],
    pub num_sys: u64,
    pub num_par: u64,
    pub commitment: G1Affine,
    pub low_degree_proof: G1Affine,
    pub frames: Vec<Frame>,
}

#[derive(Debug, Default)]
pub struct StoreCache {
    last: Mutex<Option<CachedEncoding>>,
}

impl StoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, digest: &[u8; 32], num_sys: u64, num_par: u64) -> Option<CachedEncoding> {
        lock(&self.last)
            .as_ref()
            .filter(|cached| {
                &cached.digest == digest && cached.num_sys == num_sys && cached.num_par == num_par
            })
            .cloned()
    }

    pub fn put(&self, encoding: CachedEncoding) {
        *lock(&self.last) = Some(encoding);
    }
}

#[derive(Debug)]
struct CacheEntry {
    store: Arc<Store>,
    size: u64,
    inserted_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<[u8; 32], CacheEntry>,
    used_bytes: u64,
}

impl CacheState {
    fn remove(&mut self, header_hash: &[u8; 32]) -> Option<Arc<Store>> {
        let entry = self.entries.remove(header_hash)?;
        self.used_bytes -= entry.size;
        Some(entry.store)
    }
}

/// Encoded stores waiting for their dispersal request, keyed by header hash.
/// Bounded by the summed `upper_bound_bytes` of its stores; entries older
/// than `expire_after` are dropped by [CodedDataCache::remove_expired].
#[derive(Debug)]
pub struct CodedDataCache {
    config: CodedDataCacheConfig,
    state: Mutex<CacheState>,
}

impl CodedDataCache {
    pub fn new(config: CodedDataCacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn add(&self, store: Store) -> Result<Arc<Store>, CacheError> {
        let header_hash = store.metadata.header_hash;
        let size = store.upper_bound_bytes();
        let mut state = lock(&self.state);
        let replaced = state
            .entries
            .get(&header_hash)
            .map_or(0, |entry| entry.size);
        let available = self
            .config
            .capacity_bytes
            .saturating_sub(state.used_bytes - replaced);
        if size > available {
            warn!(needed = size, available, "coded data cache overflow");
            return Err(CacheError::CacheFull {
                needed: size,
                available,
            });
        }
        state.remove(&header_hash);

        let store = Arc::new(store);
        state.used_bytes += size;
        state.entries.insert(
            header_hash,
            CacheEntry {
                store: store.clone(),
                size,
                inserted_at: Instant::now(),
            },
        );
        debug!(
            header_hash = hex::encode(header_hash),
            size,
            used = state.used_bytes,
            "store cached"
        );
        Ok(store)
    }

    pub fn get(&self, header_hash: &[u8; 32]) -> Result<Arc<Store>, CacheError> {
        lock(&self.state)
            .entries
            .get(header_hash)
            .map(|entry| entry.store.clone())
            .ok_or_else(|| CacheError::NotFound(hex::encode(header_hash)))
    }

    pub fn delete(&self, header_hash: &[u8; 32]) -> Option<Arc<Store>> {
        lock(&self.state).remove(header_hash)
    }

    /// Drops every entry older than `expire_after`; returns how many.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = lock(&self.state);
        let expired: Vec<[u8; 32]> = state
            .entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.inserted_at) >= self.config.expire_after)
            .map(|(hash, _)| *hash)
            .collect();
        for hash in &expired {
            state.remove(hash);
        }
        if !expired.is_empty() {
            debug!(removed = expired.len(), used = state.used_bytes, "expired stores removed");
        }
        expired.len()
    }

    /// Runs [CodedDataCache::remove_expired] every `clean_period` until the
    /// returned handle is aborted.
    pub fn start_expire_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            // interval panics on a zero period
            let period = cache.config.clean_period.max(Duration::from_millis(1));
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                cache.remove_expired();
            }
        })
    }

    pub fn used_bytes(&self) -> u64 {
        lock(&self.state).used_bytes
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
