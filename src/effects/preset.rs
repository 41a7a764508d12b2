use image::RgbaImage;

use crate::effects::{apply_chain, Effect, FilterOp, Overlay};
use crate::error::Result;

/// Effect built from a filter chain and an optional overlay
#[derive(Debug, Clone)]
pub struct FilterEffect {
    id: String,
    name: String,
    description: String,
    ops: Vec<FilterOp>,
    overlay: Option<Overlay>,
}

impl FilterEffect {
    pub fn new(id: &str, name: &str, ops: Vec<FilterOp>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            ops,
            overlay: None,
        }
    }

    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }
}

impl Effect for FilterEffect {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&self, image: &mut RgbaImage) -> Result<()> {
        apply_chain(image, &self.ops);
        if let Some(overlay) = self.overlay {
            overlay.apply(image);
        }
        Ok(())
    }

    fn is_identity(&self) -> bool {
        self.overlay.is_none() && self.ops.iter().all(FilterOp::is_identity)
    }
}

/// The built-in effect list, in picker order
pub fn builtin() -> Vec<FilterEffect> {
    use FilterOp::*;

    vec![
        FilterEffect::new("none", "Original", vec![]).with_description("Untouched photos"),
        FilterEffect::new("glow", "Dreamy", vec![Brightness(1.1), Contrast(1.05), Saturate(1.1), Blur(0.4)])
            .with_description("Soft, bright and slightly hazy"),
        FilterEffect::new("kiss", "Cupid", vec![Sepia(0.3), HueRotate(-20.0), Saturate(1.6), Brightness(1.05)])
            .with_description("Warm pink cast with punchy color"),
        FilterEffect::new("vintage", "Vintage", vec![Sepia(0.6), Contrast(0.9), Brightness(1.1), Saturate(0.8)])
            .with_description("Faded sepia print"),
        FilterEffect::new("noir", "Noir", vec![Grayscale(1.0), Contrast(1.3), Brightness(0.95)])
            .with_description("High-contrast black and white"),
        FilterEffect::new("rose-tint", "Rose Tint", vec![Sepia(0.2), Brightness(1.05), HueRotate(-30.0), Saturate(1.2)])
            .with_overlay(Overlay::Rose)
            .with_description("Pink grade with a rose wash"),
        FilterEffect::new("heart-bokeh", "Hearts", vec![Brightness(1.05)])
            .with_overlay(Overlay::Hearts)
            .with_description("Brightened with floating hearts"),
        FilterEffect::new("golden-hour", "Warm Glow", vec![Brightness(1.1), Saturate(1.4), Sepia(0.3), HueRotate(-10.0)])
            .with_description("Golden sunset warmth"),
        FilterEffect::new(
            "passion",
            "Passion",
            vec![Saturate(2.0), Contrast(1.1), Brightness(0.9), Sepia(0.1), HueRotate(-15.0)],
        )
        .with_description("Deep saturated reds"),
        FilterEffect::new("cupid-sparkle", "Cupid Sparkle", vec![Brightness(1.1), Contrast(1.1)])
            .with_overlay(Overlay::CupidSparkle)
            .with_description("Crisp with pink sparkles"),
        FilterEffect::new("sparkle", "Sparkle", vec![Brightness(1.1), Contrast(1.1)])
            .with_overlay(Overlay::Sparkle)
            .with_description("Crisp with light sparkles"),
    ]
}
