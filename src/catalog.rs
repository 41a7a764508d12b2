//! # Option Catalog
//!
//! Read-only lists of frames, backgrounds and stickers. The booth references
//! catalog entries but never constructs or mutates them after loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// RGBA color, straight alpha
pub type Color = [u8; 4];

/// Visual descriptor shared by frames and backgrounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visual {
    /// Flat fill
    Color(Color),
    /// Image reference (file path or http(s) URL)
    Texture {
        source: String,
        /// Tile the texture instead of scaling it to cover
        #[serde(default)]
        repeat: bool,
    },
}

impl Visual {
    /// Asset reference used by this visual, if any
    pub fn asset(&self) -> Option<&str> {
        match self {
            Visual::Color(_) => None,
            Visual::Texture { source, .. } => Some(source),
        }
    }
}

/// Decorative frame / overlay pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOption {
    pub id: String,
    pub name: String,
    pub visual: Visual,
    /// Border color of the exported strip
    #[serde(default = "default_accent")]
    pub accent: Color,
}

/// Backdrop drawn behind the video layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundOption {
    pub id: String,
    pub name: String,
    pub visual: Visual,
}

/// Sticker decal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerOption {
    pub id: String,
    /// Image reference (file path or http(s) URL)
    pub image: String,
    pub name: String,
}

fn default_accent() -> Color {
    [255, 255, 255, 255]
}

/// Complete option catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub frames: Vec<FrameOption>,
    pub backgrounds: Vec<BackgroundOption>,
    pub stickers: Vec<StickerOption>,
}

impl Catalog {
    /// Built-in color-only catalog
    pub fn builtin() -> Self {
        let frame = |id: &str, name: &str, color: Color, accent: Color| FrameOption {
            id: id.to_string(),
            name: name.to_string(),
            visual: Visual::Color(color),
            accent,
        };
        let background = |id: &str, name: &str, color: Color| BackgroundOption {
            id: id.to_string(),
            name: name.to_string(),
            visual: Visual::Color(color),
        };

        Self {
            frames: vec![
                frame("soft-pink", "Sweet Pink", [253, 242, 248, 255], [251, 207, 232, 255]),
                frame("romantic-red", "Passion Red", [254, 242, 242, 255], [254, 202, 202, 255]),
                frame("lavender-love", "Lavender Bliss", [245, 243, 255, 255], [233, 213, 255, 255]),
                frame("classic-white", "Classy White", [255, 255, 255, 255], [243, 244, 246, 255]),
            ],
            backgrounds: vec![
                background("gradient", "Romantic Glow", [255, 154, 158, 255]),
                background("hearts-fall", "Falling Hearts", [255, 133, 161, 255]),
                background("love-pulse", "Love Pulse", [254, 202, 202, 255]),
                background("starlight", "Midnight Love", [26, 11, 46, 255]),
                background("bokeh", "Soft Bokeh", [250, 208, 196, 255]),
            ],
            stickers: Vec::new(),
        }
    }

    /// Load a catalog from a TOML file
    ///
    /// Relative texture and sticker paths are resolved against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let mut catalog: Catalog = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;

        if let Some(base) = path.parent() {
            catalog.resolve_relative(base);
        }
        Ok(catalog)
    }

    fn resolve_relative(&mut self, base: &Path) {
        let resolve = |reference: &mut String| {
            let is_remote = reference.starts_with("http://") || reference.starts_with("https://");
            if !is_remote && Path::new(reference.as_str()).is_relative() {
                *reference = base.join(reference.as_str()).display().to_string();
            }
        };

        for frame in &mut self.frames {
            if let Visual::Texture { source, .. } = &mut frame.visual {
                resolve(source);
            }
        }
        for background in &mut self.backgrounds {
            if let Visual::Texture { source, .. } = &mut background.visual {
                resolve(source);
            }
        }
        for sticker in &mut self.stickers {
            resolve(&mut sticker.image);
        }
    }

    /// Derive a tiled background and a tiled frame from every sticker
    pub fn with_sticker_patterns(mut self) -> Self {
        for sticker in self.stickers.clone() {
            self.backgrounds.push(BackgroundOption {
                id: format!("bg-{}", sticker.id),
                name: format!("{} Pattern", sticker.name),
                visual: Visual::Texture { source: sticker.image.clone(), repeat: true },
            });
            self.frames.push(FrameOption {
                id: format!("frame-{}", sticker.id),
                name: format!("{} Border", sticker.name),
                visual: Visual::Texture { source: sticker.image, repeat: true },
                accent: default_accent(),
            });
        }
        self
    }

    pub fn frame(&self, id: &str) -> Result<&FrameOption> {
        self.frames
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| unknown("frame", id))
    }

    pub fn background(&self, id: &str) -> Result<&BackgroundOption> {
        self.backgrounds
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| unknown("background", id))
    }

    pub fn sticker(&self, id: &str) -> Result<&StickerOption> {
        self.stickers
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| unknown("sticker", id))
    }

    /// Every asset reference in the catalog, for preloading
    pub fn asset_references(&self) -> Vec<String> {
        let mut refs: Vec<String> = self
            .frames
            .iter()
            .filter_map(|f| f.visual.asset())
            .chain(self.backgrounds.iter().filter_map(|b| b.visual.asset()))
            .chain(self.stickers.iter().map(|s| s.image.as_str()))
            .map(str::to_string)
            .collect();
        refs.sort();
        refs.dedup();
        refs
    }
}

fn unknown(kind: &str, id: &str) -> crate::error::BoothError {
    ConfigError::UnknownOption { kind: kind.to_string(), id: id.to_string() }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_lookup() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.frame("soft-pink").unwrap().name, "Sweet Pink");
        assert_eq!(catalog.background("starlight").unwrap().visual, Visual::Color([26, 11, 46, 255]));
        assert!(catalog.sticker("missing").is_err());
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
[[stickers]]
id = "sticker-heart"
image = "stickers/heart.png"
name = "Sticker heart"

[[stickers]]
id = "sticker-remote"
image = "https://cdn.example.com/star.png"
name = "Sticker star"

[[backgrounds]]
id = "paper"
name = "Paper"
visual = { texture = { source = "paper.png", repeat = true } }
"#,
        )
        .unwrap();

        let catalog = Catalog::from_file(&path).unwrap();
        let heart = catalog.sticker("sticker-heart").unwrap();
        assert_eq!(heart.image, dir.path().join("stickers/heart.png").display().to_string());
        assert_eq!(catalog.sticker("sticker-remote").unwrap().image, "https://cdn.example.com/star.png");
        assert!(matches!(
            &catalog.background("paper").unwrap().visual,
            Visual::Texture { repeat: true, .. }
        ));
    }

    #[test]
    fn test_sticker_patterns_and_references() {
        let mut catalog = Catalog::builtin();
        catalog.stickers.push(StickerOption {
            id: "sticker-heart".to_string(),
            image: "/assets/heart.png".to_string(),
            name: "Sticker heart".to_string(),
        });
        let catalog = catalog.with_sticker_patterns();

        assert!(catalog.background("bg-sticker-heart").is_ok());
        assert!(catalog.frame("frame-sticker-heart").is_ok());
        assert_eq!(catalog.asset_references(), vec!["/assets/heart.png".to_string()]);
    }
}
