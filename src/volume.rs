//! Playback volume
//!
//! Volume is a percentage (0–100) plus a mute flag. Muting remembers the
//! previous level so that unmuting restores it. With the software backend the
//! drain callback scales each sample by [`VolumeControl::mix_volume`] on a
//! 0–128 scale, so 100% is an exact pass-through.

use crate::config::{SessionConfig, VolumeBackend};

/// Full-scale mixer volume
pub const MIX_MAX_VOLUME: i32 = 128;

/// Volume and mute state for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeControl {
    level: u32,
    muted: bool,
    step: u32,
    backend: VolumeBackend,
}

impl VolumeControl {
    /// Create a control at `level` percent
    pub fn new(level: u32, step: u32, backend: VolumeBackend) -> Self {
        VolumeControl {
            level: level.min(100),
            muted: false,
            step,
            backend,
        }
    }

    /// Create a control from the session's volume settings
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.volume_default,
            config.volume_adjust,
            config.volume_control,
        )
    }

    /// Set the level (clamped to 0–100); unmutes
    pub fn set_level(&mut self, level: i32) {
        self.muted = false;
        self.level = level.clamp(0, 100) as u32;
    }

    /// Raise the level by one step
    pub fn volume_up(&mut self) {
        self.set_level(self.level as i32 + self.step as i32);
    }

    /// Lower the level by one step
    pub fn volume_down(&mut self) {
        self.set_level(self.level as i32 - self.step as i32);
    }

    /// Toggle mute, keeping the unmuted level for later
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Effective level: 0 while muted
    pub fn level(&self) -> u32 {
        if self.muted {
            0
        } else {
            self.level
        }
    }

    /// Level that will be restored on unmute
    pub fn unmuted_level(&self) -> u32 {
        self.level
    }

    /// Whether output is muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Selected backend
    pub fn backend(&self) -> VolumeBackend {
        self.backend
    }

    /// Effective level on the 0–128 mixer scale
    pub fn mix_volume(&self) -> i32 {
        MIX_MAX_VOLUME * self.level() as i32 / 100
    }

    /// Human-readable level: `"Mute"` or e.g. `"80%"`
    pub fn display(&self) -> String {
        if self.muted {
            "Mute".to_string()
        } else {
            format!("{}%", self.level)
        }
    }

    /// Scale interleaved native-endian 16-bit samples from `src` into `dst`
    ///
    /// The system backend copies unscaled.
    pub fn apply(&self, src: &[u8], dst: &mut [u8]) {
        if self.backend == VolumeBackend::System {
            dst.copy_from_slice(src);
            return;
        }

        let volume = self.mix_volume();
        for (out, sample) in dst.chunks_exact_mut(2).zip(src.chunks_exact(2)) {
            let value = i16::from_ne_bytes([sample[0], sample[1]]) as i32;
            let scaled = (value * volume / MIX_MAX_VOLUME)
                .clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            out.copy_from_slice(&scaled.to_ne_bytes());
        }
    }
}

impl Default for VolumeControl {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    #[test]
    fn test_set_level_clamps_and_unmutes() {
        let mut volume = VolumeControl::new(80, 5, VolumeBackend::Software);
        volume.toggle_mute();
        volume.set_level(140);
        assert!(!volume.is_muted());
        assert_eq!(volume.level(), 100);

        volume.set_level(-3);
        assert_eq!(volume.level(), 0);
    }

    #[test]
    fn test_mute_restores_previous_level() {
        let mut volume = VolumeControl::new(65, 5, VolumeBackend::Software);
        volume.toggle_mute();
        assert_eq!(volume.level(), 0);
        assert_eq!(volume.display(), "Mute");

        volume.toggle_mute();
        assert_eq!(volume.level(), 65);
        assert_eq!(volume.display(), "65%");
    }

    #[test]
    fn test_step_up_and_down() {
        let mut volume = VolumeControl::new(98, 5, VolumeBackend::Software);
        volume.volume_up();
        assert_eq!(volume.level(), 100);
        volume.volume_down();
        volume.volume_down();
        assert_eq!(volume.level(), 90);
    }

    #[test]
    fn test_full_volume_is_identity() {
        let volume = VolumeControl::new(100, 5, VolumeBackend::Software);
        let src = samples(&[i16::MIN, -1, 0, 1, 12345, i16::MAX]);
        let mut dst = vec![0u8; src.len()];
        volume.apply(&src, &mut dst);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_half_volume_and_mute() {
        let mut volume = VolumeControl::new(50, 5, VolumeBackend::Software);
        let src = samples(&[1000, -1000]);
        let mut dst = vec![0u8; src.len()];
        volume.apply(&src, &mut dst);
        assert_eq!(dst, samples(&[500, -500]));

        volume.toggle_mute();
        volume.apply(&src, &mut dst);
        assert_eq!(dst, samples(&[0, 0]));
    }

    #[test]
    fn test_system_backend_passes_through() {
        let mut volume = VolumeControl::new(10, 5, VolumeBackend::System);
        volume.toggle_mute();
        let src = samples(&[3000, -3000]);
        let mut dst = vec![0u8; src.len()];
        volume.apply(&src, &mut dst);
        assert_eq!(dst, src);
    }
}
