use image::RgbaImage;

use crate::error::Result;

/// Core trait that all photo effects implement
pub trait Effect: Send + Sync {
    /// Unique id used for lookup and captions
    fn id(&self) -> &str;

    /// Human-readable name shown in pickers
    fn name(&self) -> &str;

    /// Short description of the look
    fn description(&self) -> &str {
        ""
    }

    /// Apply the effect to a composed photo in place
    ///
    /// # Arguments
    ///
    /// * `image` - Straight-alpha photo at its native resolution
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` if the effect was applied, or an error if processing failed.
    fn apply(&self, image: &mut RgbaImage) -> Result<()>;

    /// Whether applying this effect leaves every pixel unchanged
    ///
    /// Callers may skip the work for identity effects.
    fn is_identity(&self) -> bool {
        false
    }
}
