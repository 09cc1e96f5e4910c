// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kernel configuration.
//!
//! Every field has a default, so a partial JSON document or an empty
//! environment both yield a usable configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// RGB color stored in the color buffer attributes.
pub type Color = [f32; 3];

/// Tunables shared by every geometric component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Minimum number of floats a buffer grows by when it runs out of room.
    pub buffer_increase: usize,
    /// Point color when unselected.
    pub base_color: Color,
    /// Point color when selected.
    pub select_color: Color,
    /// Line color when unselected.
    pub line_color: Color,
    /// Line color when selected.
    pub line_select_color: Color,
    /// Face color when unselected.
    pub face_color: Color,
    /// Face color when selected.
    pub face_select_color: Color,
    /// Quantization factor used by rounding comparisons (1000 = 3 decimals).
    pub precision: f64,
    /// Length of the default vertical axis walls are lifted along.
    pub wall_height: f64,
    /// Width given to walls when none is specified.
    pub wall_width: f64,
    /// Thickness given to slabs when none is specified.
    pub slab_height: f64,
    /// Maximum distance between a ray and a point for the point to be picked.
    pub point_threshold: f64,
    /// Maximum distance between a ray and a segment for the segment to be picked.
    pub line_threshold: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            buffer_increase: 300,
            base_color: [0.1, 0.1, 0.1],
            select_color: [1.0, 0.0, 0.0],
            line_color: [0.2, 0.2, 0.2],
            line_select_color: [1.0, 0.0, 0.0],
            face_color: [0.8, 0.8, 0.8],
            face_select_color: [1.0, 0.5, 0.3],
            precision: 1000.0,
            wall_height: 3.0,
            wall_width: 0.2,
            slab_height: 0.3,
            point_threshold: 0.1,
            line_threshold: 0.05,
        }
    }
}

impl KernelConfig {
    /// Parses a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            buffer_increase: env_or("BIM_BUFFER_INCREASE", defaults.buffer_increase),
            precision: env_or("BIM_PRECISION", defaults.precision),
            wall_height: env_or("BIM_WALL_HEIGHT", defaults.wall_height),
            wall_width: env_or("BIM_WALL_WIDTH", defaults.wall_width),
            slab_height: env_or("BIM_SLAB_HEIGHT", defaults.slab_height),
            ..defaults
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = KernelConfig::from_json(r#"{ "wall_height": 2.5 }"#).unwrap();
        assert_eq!(config.wall_height, 2.5);
        assert_eq!(config.buffer_increase, 300);
        assert_eq!(config.precision, 1000.0);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = KernelConfig::from_json("{ wall_height: }").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn default_round_trips_through_json() {
        let json = serde_json::to_string(&KernelConfig::default()).unwrap();
        assert_eq!(KernelConfig::from_json(&json).unwrap(), KernelConfig::default());
    }
}
