use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use datalayr_primitives::{errors::KzgError, params::EncodingParams};
use tracing::debug;

use crate::{
    kzg::KzgEncoder,
    srs::{KzgConfig, SRS},
};

/// Thread-safe get-or-create cache of per-parameter objects.
///
/// Values are built outside the lock; when two callers race on the same key
/// the first insert wins and both receive the same `Arc`.
#[derive(Debug)]
pub struct ParamsCache<T> {
    entries: RwLock<HashMap<EncodingParams, Arc<T>>>,
}

impl<T> Default for ParamsCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> ParamsCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, params: &EncodingParams) -> Option<Arc<T>> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(params).cloned())
    }

    pub fn get_or_try_insert_with<E, F>(&self, params: EncodingParams, build: F) -> Result<Arc<T>, E>
    where
        F: FnOnce(&EncodingParams) -> Result<T, E>,
    {
        if let Some(existing) = self.get(&params) {
            return Ok(existing);
        }
        let built = Arc::new(build(&params)?);
        match self.entries.write() {
            Ok(mut entries) => Ok(entries.entry(params).or_insert(built).clone()),
            // a poisoned lock only loses the memoization
            Err(_) => Ok(built),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shares one SRS across the encoders of every parameter set seen so far.
#[derive(Debug)]
pub struct KzgEncoderGroup {
    pub config: KzgConfig,
    pub srs: Arc<SRS>,
    encoders: ParamsCache<KzgEncoder>,
}

impl KzgEncoderGroup {
    pub fn new(config: KzgConfig) -> Result<Self, KzgError> {
        let srs = SRS::new(&config)?;
        Ok(Self::from_srs(config, Arc::new(srs)))
    }

    pub fn from_srs(config: KzgConfig, srs: Arc<SRS>) -> Self {
        Self {
            config,
            srs,
            encoders: ParamsCache::new(),
        }
    }

    /// Cached encoder for `(numSys, numPar, dataByteLen)`.
    pub fn get_kzg_encoder(
        &self,
        num_sys: u64,
        num_par: u64,
        data_byte_len: u64,
    ) -> Result<Arc<KzgEncoder>, KzgError> {
        let params = EncodingParams::new(num_sys, num_par, data_byte_len)?;
        self.encoders.get_or_try_insert_with(params, |params| {
            debug!(num_sys, num_par, chunk_len = params.chunk_len, "creating kzg encoder");
            KzgEncoder::new(*params, self.srs.clone(), self.config.verbose)
        })
    }

    /// Builds a fresh encoder without touching the cache.
    pub fn new_kzg_encoder(
        &self,
        num_sys: u64,
        num_par: u64,
        data_byte_len: u64,
    ) -> Result<KzgEncoder, KzgError> {
        let params = EncodingParams::new(num_sys, num_par, data_byte_len)?;
        KzgEncoder::new(params, self.srs.clone(), self.config.verbose)
    }

    pub fn cached_encoders(&self) -> usize {
        self.encoders.len()
    }
}
