use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::assets::AssetLoader;
use crate::error::AssetError;

/// Load state of one decorative asset
#[derive(Debug, Clone)]
pub enum AssetState {
    /// Requested, not yet decoded
    Pending,
    /// Decoded and ready to draw
    Ready(Arc<RgbaImage>),
    /// Fetch or decode failed
    Failed(AssetError),
}

impl AssetState {
    pub fn is_ready(&self) -> bool {
        matches!(self, AssetState::Ready(_))
    }
}

/// Explicit map from asset reference to its loaded image
///
/// The compositor only ever reads this map; anything not `Ready` is skipped
/// for that render.
pub struct AssetCache {
    loader: AssetLoader,
    entries: HashMap<String, AssetState>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::with_loader(AssetLoader::new())
    }

    pub fn with_loader(loader: AssetLoader) -> Self {
        Self { loader, entries: HashMap::new() }
    }

    /// Register a reference as pending without loading it
    pub fn request(&mut self, reference: &str) {
        self.entries
            .entry(reference.to_string())
            .or_insert(AssetState::Pending);
    }

    /// Store an already-decoded image
    pub fn insert(&mut self, reference: &str, image: RgbaImage) {
        self.entries
            .insert(reference.to_string(), AssetState::Ready(Arc::new(image)));
    }

    pub fn state(&self, reference: &str) -> Option<&AssetState> {
        self.entries.get(reference)
    }

    /// Ready image for `reference`, or why it cannot be drawn yet
    pub fn get(&self, reference: &str) -> Result<&RgbaImage, AssetError> {
        match self.entries.get(reference) {
            Some(AssetState::Ready(image)) => Ok(image.as_ref()),
            Some(AssetState::Failed(e)) => Err(e.clone()),
            Some(AssetState::Pending) | None => Err(AssetError::NotReady { key: reference.to_string() }),
        }
    }

    /// Load every reference that is not ready yet
    ///
    /// Previously failed references are attempted again. Returns how many of
    /// the given references are ready afterwards.
    pub async fn ensure_loaded<'a, I>(&mut self, references: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ready = 0;
        for reference in references {
            if self.entries.get(reference).is_some_and(AssetState::is_ready) {
                ready += 1;
                continue;
            }

            self.request(reference);
            let state = match self.loader.load(reference).await {
                Ok(image) => {
                    debug!("Asset ready: {} ({}x{})", reference, image.width(), image.height());
                    ready += 1;
                    AssetState::Ready(Arc::new(image))
                }
                Err(e) => {
                    warn!("Asset unavailable, it will be skipped: {}", e);
                    AssetState::Failed(e)
                }
            };
            self.entries.insert(reference.to_string(), state);
        }
        ready
    }

    /// Register and load a batch of references
    pub async fn preload(&mut self, references: &[String]) -> usize {
        for reference in references {
            self.request(reference);
        }
        let ready = self.ensure_loaded(references.iter().map(String::as_str)).await;
        info!("🖼️  Preloaded {}/{} decorative assets", ready, references.len());
        ready
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new()
    }
}
