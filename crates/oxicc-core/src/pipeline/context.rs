//! CMM configuration
//!
//! Options that shape how profiles become pipeline stages.

use crate::clut::Interpolation;

/// Configuration for building a [`Cmm`](super::Cmm)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmmConfig {
    /// Interpolation for 3-input CLUTs
    pub interpolation: Interpolation,
    /// Substitute index 0 and then matrix/TRC for a missing intent tag
    pub intent_fallback: bool,
    /// Prefer `D2Bx`/`B2Dx` multi-process tags over the integer LUTs
    pub use_float_tags: bool,
    /// Clamp device outputs of the last stage to [0, 1]
    pub clamp_output: bool,
}

impl Default for CmmConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Tetrahedral,
            intent_fallback: true,
            use_float_tags: false,
            clamp_output: true,
        }
    }
}

impl CmmConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set CLUT interpolation
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Enable or disable intent fallback
    pub fn with_intent_fallback(mut self, fallback: bool) -> Self {
        self.intent_fallback = fallback;
        self
    }

    /// Prefer floating point tags
    pub fn with_float_tags(mut self, use_float_tags: bool) -> Self {
        self.use_float_tags = use_float_tags;
        self
    }

    pub fn with_clamp_output(mut self, clamp: bool) -> Self {
        self.clamp_output = clamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CmmConfig::default();
        assert_eq!(config.interpolation, Interpolation::Tetrahedral);
        assert!(config.intent_fallback);
        assert!(!config.use_float_tags);
        assert!(config.clamp_output);
    }

    #[test]
    fn test_config_builder() {
        let config = CmmConfig::new()
            .with_interpolation(Interpolation::Trilinear)
            .with_intent_fallback(false)
            .with_float_tags(true)
            .with_clamp_output(false);

        assert_eq!(config.interpolation, Interpolation::Trilinear);
        assert!(!config.intent_fallback);
        assert!(config.use_float_tags);
        assert!(!config.clamp_output);
    }
}
