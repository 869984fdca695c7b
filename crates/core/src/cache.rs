//! TTL cache for expensive remote lookups
//!
//! Reverse-geocoding and routed-distance lookups hit public services with
//! usage policies, and their answers change rarely. This cache keeps them
//! on disk across CLI runs with an optional in-memory layer in front.
//!
//! # Example
//!
//! ```rust,ignore
//! use findixi_core::cache::{Cache, CacheConfig};
//!
//! let cache = Cache::new(CacheConfig::default())?;
//! cache.set("geocode:18.22,-66.59", &"Orocovis".to_string(), None)?;
//!
//! if let Some(town) = cache.get::<String>("geocode:18.22,-66.59")? {
//!     println!("cached: {}", town);
//! }
//! ```

use crate::error::{Error, ErrorCode, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory path
    pub cache_dir: PathBuf,
    /// Default TTL in seconds (0 = no expiry)
    pub default_ttl_secs: u64,
    /// Enable the in-memory layer
    pub memory_cache: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("findixi");

        Self {
            cache_dir,
            default_ttl_secs: 86_400, // geocode/route answers are stable for a day
            memory_cache: true,
        }
    }
}

/// Cache entry metadata stored alongside the payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    created_at: u64,
    /// Expiry timestamp (0 = never)
    expires_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    entry: CacheEntry,
    payload: serde_json::Value,
}

/// File-based cache with an optional in-memory layer
pub struct Cache {
    config: CacheConfig,
    memory: Option<RwLock<HashMap<String, (CacheEntry, Vec<u8>)>>>,
}

impl Cache {
    /// Create a new cache instance, creating the cache directory if needed
    pub fn new(config: CacheConfig) -> Result<Self> {
        fs::create_dir_all(&config.cache_dir)?;

        let memory = if config.memory_cache {
            Some(RwLock::new(HashMap::new()))
        } else {
            None
        };

        Ok(Self { config, memory })
    }

    /// Create with default configuration
    pub fn default_cache() -> Result<Self> {
        Self::new(CacheConfig::default())
    }

    /// Get a cached value if present and not expired
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let cache_key = self.hash_key(key);

        if let Some(ref memory) = self.memory {
            let guard = memory.read().map_err(|_| {
                Error::new(ErrorCode::Internal, "Failed to acquire cache read lock")
            })?;

            if let Some((entry, data)) = guard.get(&cache_key) {
                if !is_expired(entry) {
                    let value: T = serde_json::from_slice(data)?;
                    return Ok(Some(value));
                }
            }
        }

        let path = self.entry_path(&cache_key);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read(&path)?;
        let record: StoredRecord = match serde_json::from_slice(&raw) {
            Ok(record) => record,
            // Corrupt entry: drop it and report a miss
            Err(_) => {
                let _ = fs::remove_file(&path);
                return Ok(None);
            }
        };

        if is_expired(&record.entry) {
            let _ = fs::remove_file(&path);
            return Ok(None);
        }

        let payload = serde_json::to_vec(&record.payload)?;
        if let Some(ref memory) = self.memory {
            if let Ok(mut guard) = memory.write() {
                guard.insert(cache_key, (record.entry.clone(), payload.clone()));
            }
        }

        Ok(Some(serde_json::from_slice(&payload)?))
    }

    /// Store a value with an optional TTL override (seconds)
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> Result<()> {
        let cache_key = self.hash_key(key);
        let ttl = ttl_secs.unwrap_or(self.config.default_ttl_secs);
        let now = unix_now();

        let entry = CacheEntry {
            created_at: now,
            expires_at: if ttl == 0 { 0 } else { now + ttl },
        };

        let payload = serde_json::to_value(value)?;
        let record = StoredRecord {
            entry: entry.clone(),
            payload,
        };

        let path = self.entry_path(&cache_key);
        fs::write(&path, serde_json::to_vec(&record)?)?;

        if let Some(ref memory) = self.memory {
            if let Ok(mut guard) = memory.write() {
                guard.insert(cache_key, (entry, serde_json::to_vec(value)?));
            }
        }

        Ok(())
    }

    /// Remove a single entry
    pub fn invalidate(&self, key: &str) -> Result<()> {
        let cache_key = self.hash_key(key);

        if let Some(ref memory) = self.memory {
            if let Ok(mut guard) = memory.write() {
                guard.remove(&cache_key);
            }
        }

        let path = self.entry_path(&cache_key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<()> {
        if let Some(ref memory) = self.memory {
            if let Ok(mut guard) = memory.write() {
                guard.clear();
            }
        }

        for item in fs::read_dir(&self.config.cache_dir)? {
            let path = item?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn hash_key(&self, key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn entry_path(&self, cache_key: &str) -> PathBuf {
        self.config.cache_dir.join(format!("{}.json", cache_key))
    }
}

fn is_expired(entry: &CacheEntry) -> bool {
    entry.expires_at != 0 && unix_now() >= entry.expires_at
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
