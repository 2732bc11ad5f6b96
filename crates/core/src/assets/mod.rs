use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{render::Visual, CodeFreqError, Result};

/// Textures the scene draws, with their pixel sizes.
pub const MANIFEST: [(&str, f64, f64); 14] = [
    ("background", 1024.0, 600.0),
    ("feedbackgreen", 32.0, 32.0),
    ("feedbackyellow", 32.0, 32.0),
    ("greentrail", 16.0, 16.0),
    ("yellowtrail", 16.0, 16.0),
    ("maintitle", 480.0, 96.0),
    ("github", 128.0, 128.0),
    ("planet", 256.0, 256.0),
    ("plus", 24.0, 24.0),
    ("minus", 24.0, 12.0),
    ("title2", 420.0, 64.0),
    ("githubsmall", 180.0, 32.0),
    ("minusband", 1000.0, 20.0),
    ("plusband", 1000.0, 20.0),
];

/// Descriptor for a loaded texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub name: String,
    pub width: f64,
    pub height: f64,
}

impl Texture {
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    pub fn visual(&self) -> Visual {
        Visual::Texture {
            name: self.name.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Registry for all textures referenced by the scene.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    textures: HashMap<String, Texture>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
        }
    }

    /// Store pre-populated with every texture in [`MANIFEST`].
    pub fn builtin() -> Self {
        let mut store = Self::new();
        for (name, width, height) in MANIFEST {
            store.register(Texture::new(name, width, height));
        }
        store
    }

    pub fn register(&mut self, texture: Texture) {
        self.textures.insert(texture.name.clone(), texture);
    }

    pub fn texture(&self, name: &str) -> Result<&Texture> {
        self.textures
            .get(name)
            .ok_or_else(|| CodeFreqError::UnknownTexture(name.to_string()))
    }

    /// Fails on the first name in `names` that has not been registered.
    pub fn ensure(&self, names: &[String]) -> Result<()> {
        names.iter().try_for_each(|name| self.texture(name).map(|_| ()))
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Names from [`MANIFEST`], in order.
pub fn manifest_names() -> Vec<String> {
    MANIFEST.iter().map(|(name, ..)| name.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_textures() {
        let mut store = AssetStore::new();
        store.register(Texture::new("planet", 256.0, 256.0));

        let texture = store.texture("planet").unwrap();
        assert_eq!(
            texture.visual(),
            Visual::Texture {
                name: "planet".to_string(),
                width: 256.0,
                height: 256.0
            }
        );
    }

    #[test]
    fn errors_on_missing_textures() {
        let store = AssetStore::new();
        let err = store.texture("missing").unwrap_err();
        assert!(format!("{err}").contains("missing"));
    }

    #[test]
    fn builtin_store_covers_the_manifest() {
        let store = AssetStore::builtin();
        assert_eq!(store.len(), MANIFEST.len());
        assert!(store.ensure(&manifest_names()).is_ok());
        assert!(store
            .ensure(&["plus".to_string(), "nope".to_string()])
            .is_err());
    }
}
