use serde::{Deserialize, Serialize};

use crate::error::DotsError;

pub const DEFAULT_SECTOR_SIZE: f32 = 100.0;
pub const DEFAULT_FILL_ALPHA: f32 = 0.4;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DotsOptions {
    pub clear_canvas: bool,
    pub show_vector: bool,
    pub show_info: bool,
    pub avoid_each_other: bool,
}

impl Default for DotsOptions {
    fn default() -> Self {
        Self {
            clear_canvas: true,
            show_vector: false,
            show_info: false,
            avoid_each_other: false,
        }
    }
}

/// Inclusive integer ranges the dot generator draws from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpawnRanges {
    pub radius_min: u32,
    pub radius_max: u32,
    pub speed_min: u32,
    pub speed_max: u32,
    pub channel_min: u8,
    pub channel_max: u8,
    pub alpha: f32,
}

impl Default for SpawnRanges {
    fn default() -> Self {
        Self {
            radius_min: 3,
            radius_max: 10,
            speed_min: 10,
            speed_max: 29,
            channel_min: 50,
            channel_max: 249,
            alpha: DEFAULT_FILL_ALPHA,
        }
    }
}

impl SpawnRanges {
    pub fn validate(&self) -> Result<(), DotsError> {
        if self.radius_min == 0 || self.radius_min > self.radius_max {
            return Err(DotsError::InvalidSpawnRange(
                "radius range must be positive and non-empty",
            ));
        }
        if self.speed_min > self.speed_max {
            return Err(DotsError::InvalidSpawnRange("speed range is empty"));
        }
        if self.channel_min > self.channel_max {
            return Err(DotsError::InvalidSpawnRange("colour channel range is empty"));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(DotsError::InvalidSpawnRange("alpha must be within 0..=1"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    pub sector_size: f32,
    pub seed: Option<u64>,
    pub spawn: SpawnRanges,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sector_size: DEFAULT_SECTOR_SIZE,
            seed: None,
            spawn: SpawnRanges::default(),
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DotsError> {
        if !self.sector_size.is_finite() || self.sector_size <= 0.0 {
            return Err(DotsError::InvalidSectorSize(self.sector_size));
        }
        self.spawn.validate()
    }

    pub fn validate_area(&self, width: f32, height: f32) -> Result<(), DotsError> {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(DotsError::InvalidArea { width, height });
        }
        let max_radius = self.spawn.radius_max as f32;
        if width < 2.0 * max_radius || height < 2.0 * max_radius {
            return Err(DotsError::AreaTooSmall {
                width,
                height,
                max_radius,
            });
        }
        Ok(())
    }
}
