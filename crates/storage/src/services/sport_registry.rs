//! Cached view of the sport configuration table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, StorageError};
use crate::models::SportConfig;

pub const DEFAULT_K_FACTOR: i32 = 32;
pub const DEFAULT_RATING: i32 = 1000;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Backing store the registry reloads from.
#[async_trait]
pub trait SportSource: Send + Sync {
    async fn load_sports(&self) -> Result<Vec<SportConfig>>;
}

#[derive(Debug)]
struct SportSnapshot {
    by_id: HashMap<String, SportConfig>,
    active: Vec<SportConfig>,
    loaded_at: Instant,
}

impl SportSnapshot {
    fn build(sports: Vec<SportConfig>) -> Self {
        let mut active: Vec<SportConfig> = sports.iter().filter(|s| s.is_active).cloned().collect();
        active.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });

        let by_id = sports.into_iter().map(|s| (s.id.clone(), s)).collect();

        Self {
            by_id,
            active,
            loaded_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.loaded_at.elapsed() < ttl
    }
}

pub struct SportRegistry {
    source: Box<dyn SportSource>,
    ttl: Duration,
    default_k_factor: i32,
    cache: RwLock<Option<Arc<SportSnapshot>>>,
}

impl SportRegistry {
    pub fn new(source: impl SportSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            ttl: DEFAULT_CACHE_TTL,
            default_k_factor: DEFAULT_K_FACTOR,
            cache: RwLock::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_default_k_factor(mut self, k_factor: i32) -> Self {
        self.default_k_factor = k_factor;
        self
    }

    /// Active sport by id; `NotFound` when unknown or deactivated.
    pub async fn get_active_sport(&self, id: &str) -> Result<SportConfig> {
        let sport = self.get_sport(id).await?;
        if sport.is_active {
            Ok(sport)
        } else {
            Err(StorageError::NotFound)
        }
    }

    /// Sport by id regardless of its active flag.
    pub async fn get_sport(&self, id: &str) -> Result<SportConfig> {
        let snapshot = self.snapshot().await?;
        snapshot
            .by_id
            .get(id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// K-factor for the sport, or the global default when the lookup fails.
    pub async fn get_k_factor(&self, id: &str) -> i32 {
        match self.get_sport(id).await {
            Ok(sport) if sport.k_factor > 0 => sport.k_factor,
            Ok(sport) => {
                tracing::warn!(sport = id, k_factor = sport.k_factor, "Non-positive K-factor, using default");
                self.default_k_factor
            }
            Err(e) => {
                tracing::warn!(sport = id, error = %e, "K-factor lookup failed, using default");
                self.default_k_factor
            }
        }
    }

    /// Starting rating for the sport, or the global default when the lookup fails.
    pub async fn get_default_rating(&self, id: &str) -> i32 {
        match self.get_sport(id).await {
            Ok(sport) => sport.default_rating,
            Err(e) => {
                tracing::warn!(sport = id, error = %e, "Default rating lookup failed, using default");
                DEFAULT_RATING
            }
        }
    }

    /// Active sports ordered by sort order, then name.
    pub async fn list_active(&self) -> Result<Vec<SportConfig>> {
        Ok(self.snapshot().await?.active.clone())
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
        tracing::debug!("Sport registry invalidated");
    }

    async fn snapshot(&self) -> Result<Arc<SportSnapshot>> {
        let stale = {
            let cached = self.cache.read().await;
            match cached.as_ref() {
                Some(snapshot) if snapshot.is_fresh(self.ttl) => return Ok(Arc::clone(snapshot)),
                other => other.cloned(),
            }
        };

        // A reload holds the write lock, so readers wait for it. Only a task
        // that finds the write lock taken between its read and its upgrade
        // returns the stale snapshot it already saw.
        let mut cached = match stale {
            Some(stale) => match self.cache.try_write() {
                Ok(guard) => guard,
                Err(_) => return Ok(stale),
            },
            None => self.cache.write().await,
        };

        if let Some(snapshot) = cached.as_ref()
            && snapshot.is_fresh(self.ttl)
        {
            return Ok(Arc::clone(snapshot));
        }

        let sports = self.source.load_sports().await?;
        tracing::debug!(count = sports.len(), "Sport registry reloaded");

        let snapshot = Arc::new(SportSnapshot::build(sports));
        *cached = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}
