//! Game settings and preferences
//!
//! Persisted separately from the high score in LocalStorage.

use serde::{Deserialize, Serialize};

/// Player-facing effect settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Particle effects (line clears, celebrations)
    pub particles: bool,
    /// Screen shake on clears and game over
    pub screen_shake: bool,
    /// Haptic feedback
    pub haptics: bool,
    /// Reduced motion (minimize shake and flashes)
    pub reduced_motion: bool,
    /// Live-particle cap when particles are enabled
    pub particle_cap: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particles: true,
            screen_shake: true,
            haptics: true,
            reduced_motion: false,
            particle_cap: 512,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if self.particles { self.particle_cap } else { 0 }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "blockfall_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
