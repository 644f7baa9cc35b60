//! Render configuration.

use serde::{Deserialize, Serialize};

/// How linear radiance is squeezed into 8-bit display values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToneMap {
    /// Clamp to [0, 1] and scale; no transfer curve.
    #[default]
    Clamp,
    /// Gamma 2.0 (square root) before clamping.
    Gamma,
}

/// Which G-buffer channel the debug view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GBufferView {
    /// Normals remapped from [-1, 1] to [0, 1].
    #[default]
    Normal,
    /// World position normalized into the scene bounds.
    Position,
    /// Hit distance, near is bright.
    Depth,
}

/// Stochastic path termination settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RussianRoulette {
    /// Bounces taken before roulette may kill a path
    pub min_depth: u32,
    /// Roulette only applies when the largest throughput component is below this
    pub threshold: f32,
    /// Lower bound on the survival probability
    pub min_survival: f32,
}

impl Default for RussianRoulette {
    fn default() -> Self {
        Self {
            min_depth: 3,
            threshold: 0.25,
            min_survival: 0.05,
        }
    }
}

impl RussianRoulette {
    /// `min_survival` clamped into [0, 1]; NaN falls back to the default.
    pub fn survival_floor(&self) -> f32 {
        if self.min_survival.is_nan() {
            Self::default().min_survival
        } else {
            self.min_survival.clamp(0.0, 1.0)
        }
    }

    /// Survival probability for a path whose largest throughput component is `strength`.
    pub fn survival_probability(&self, strength: f32) -> f32 {
        strength.clamp(self.survival_floor(), 1.0)
    }
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Maximum bounces per path per iteration (at least 1 is used)
    pub max_depth: u32,
    /// Optional Russian-roulette termination
    pub russian_roulette: Option<RussianRoulette>,
    /// Tone mapping used by the image views
    pub tone_map: ToneMap,
    /// Channel shown by the G-buffer view
    pub gbuffer_view: GBufferView,
    /// Working-memory budget in bytes for `init`; `None` means unlimited
    pub memory_budget: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            russian_roulette: None,
            tone_map: ToneMap::Clamp,
            gbuffer_view: GBufferView::Normal,
            memory_budget: None,
        }
    }
}

impl RenderConfig {
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_russian_roulette(mut self, roulette: RussianRoulette) -> Self {
        self.russian_roulette = Some(roulette);
        self
    }

    pub fn with_tone_map(mut self, tone_map: ToneMap) -> Self {
        self.tone_map = tone_map;
        self
    }

    pub fn with_gbuffer_view(mut self, view: GBufferView) -> Self {
        self.gbuffer_view = view;
        self
    }

    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    /// Bounce budget handed to each new path.
    pub fn bounce_budget(&self) -> u32 {
        self.max_depth.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert_eq!(config.max_depth, 8);
        assert!(config.russian_roulette.is_none());
        assert_eq!(config.tone_map, ToneMap::Clamp);
    }

    #[test]
    fn test_zero_depth_still_traces_one_bounce() {
        assert_eq!(RenderConfig::default().with_max_depth(0).bounce_budget(), 1);
    }

    #[test]
    fn test_survival_floor_is_clamped() {
        let roulette = |min_survival| RussianRoulette {
            min_survival,
            ..RussianRoulette::default()
        };

        assert_eq!(roulette(0.2).survival_floor(), 0.2);
        assert_eq!(roulette(1.5).survival_floor(), 1.0);
        assert_eq!(roulette(-0.5).survival_floor(), 0.0);
        assert_eq!(roulette(f32::NAN).survival_floor(), 0.05);

        assert_eq!(roulette(1.5).survival_probability(0.1), 1.0);
        assert_eq!(roulette(f32::NAN).survival_probability(0.01), 0.05);
        assert_eq!(roulette(0.05).survival_probability(0.5), 0.5);
    }
}
