use std::{collections::HashMap, fmt::Debug, path::Path};

use async_trait::async_trait;
use queue_player_models::TrackRef;
use snafu::prelude::*;
use tracing::{debug, instrument};

use crate::{
    Result,
    error::{CatalogParseSnafu, CatalogReadSnafu, Error},
};

/// Expands album and playlist references into their tracks.
#[async_trait]
pub trait TrackResolver: Send + Sync + Debug {
    /// Returns the tracks of `collection` in playing order.
    async fn resolve(&self, collection: &TrackRef) -> Result<Vec<TrackRef>>;
}

/// Resolver backed by a static catalog mapping collection uris to track
/// uris, e.g. `{ "spotify:album:x": ["spotify:track:a", "spotify:track:b"] }`.
#[derive(Debug, Default, Clone)]
pub struct CatalogResolver {
    collections: HashMap<TrackRef, Vec<TrackRef>>,
}

impl CatalogResolver {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_collection(mut self, collection: TrackRef, tracks: Vec<TrackRef>) -> Self {
        self.collections.insert(collection, tracks);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let collections: HashMap<TrackRef, Vec<TrackRef>> =
            serde_json::from_str(json).context(CatalogParseSnafu)?;

        Ok(Self { collections })
    }

    #[instrument]
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .context(CatalogReadSnafu { path })?;

        let catalog = Self::from_json(&json)?;
        debug!(collections = catalog.len(), "catalog loaded");

        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

#[async_trait]
impl TrackResolver for CatalogResolver {
    async fn resolve(&self, collection: &TrackRef) -> Result<Vec<TrackRef>> {
        let Some(tracks) = self.collections.get(collection) else {
            return Err(Error::Resolve {
                uri: collection.to_string(),
                message: "not in catalog".into(),
            });
        };

        if let Some(not_a_track) = tracks.iter().find(|track| !track.is_track()) {
            return Err(Error::Resolve {
                uri: collection.to_string(),
                message: format!("entry {not_a_track} is not a track"),
            });
        }

        Ok(tracks.clone())
    }
}
