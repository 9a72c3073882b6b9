//! Presentation preferences
//!
//! Nothing here reaches the simulation; these only shape what the render
//! step and audio do. Persisted in LocalStorage on the web.

use serde::{Deserialize, Serialize};

/// Render quality tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 50,
            QualityPreset::Medium => 200,
            QualityPreset::High => 600,
        }
    }

    /// Segments used to tessellate circles
    pub fn circle_segments(&self) -> u32 {
        match self {
            QualityPreset::Low => 12,
            QualityPreset::Medium => 24,
            QualityPreset::High => 40,
        }
    }
}

/// Player-facing presentation preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Fading trail behind the player
    pub trails: bool,
    /// Pickup bursts and chase sparks
    pub particles: bool,
    /// "+1" text on pickup
    pub floating_text: bool,
    /// Pulsing glow on chasing hazards
    pub hazard_glow: bool,
    /// Background grid
    pub grid: bool,
    /// Ring showing the safe-zone radius around the player
    pub safe_zone_ring: bool,

    // === Audio ===
    /// 0.0 - 1.0
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion (no glow pulse, no particles)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            trails: true,
            particles: true,
            floating_text: true,
            hazard_glow: true,
            grid: true,
            safe_zone_ring: true,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            reduced_motion: false,
        }
    }
}

impl Settings {
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Switch tier; Low also turns off glow and grid
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        if preset == QualityPreset::Low {
            self.hazard_glow = false;
            self.grid = false;
        }
    }

    /// Effective glow (respects reduced_motion)
    pub fn effective_hazard_glow(&self) -> bool {
        self.hazard_glow && !self.reduced_motion
    }

    /// Live particle cap after the toggles
    pub fn max_particles(&self) -> usize {
        if !self.particles || self.reduced_motion {
            0
        } else {
            self.quality.max_particles()
        }
    }

    const STORAGE_KEY: &'static str = "token_rush_settings";

    /// Restore saved preferences, falling back to defaults
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let saved = local_storage()
            .and_then(|storage| storage.get_item(Self::STORAGE_KEY).ok().flatten())
            .and_then(|json| match serde_json::from_str::<Self>(&json) {
                Ok(settings) => Some(settings),
                Err(err) => {
                    log::warn!("Ignoring unreadable {}: {}", Self::STORAGE_KEY, err);
                    None
                }
            });
        match saved {
            Some(settings) => {
                log::info!("Preferences restored ({} quality)", settings.quality.as_str());
                settings
            }
            None => Self::default(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = local_storage() else {
            return;
        };
        match serde_json::to_string(self) {
            Ok(json) => {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("Could not persist preferences");
                }
            }
            Err(err) => log::warn!("Could not encode preferences: {}", err),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No {} store natively, using defaults", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_disables_particles_and_glow() {
        let settings = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        assert_eq!(settings.max_particles(), 0);
        assert!(!settings.effective_hazard_glow());
        assert_eq!(Settings::default().max_particles(), 200);
    }

    #[test]
    fn test_low_preset_drops_decorations() {
        let settings = Settings::from_preset(QualityPreset::Low);
        assert!(!settings.grid);
        assert!(!settings.hazard_glow);
        assert!(settings.trails);
        assert_eq!(settings.quality.circle_segments(), 12);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"trails": false}"#).unwrap();
        assert!(!settings.trails);
        assert!(settings.particles);
        assert_eq!(settings.quality, QualityPreset::Medium);
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!(QualityPreset::from_str("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }
}
