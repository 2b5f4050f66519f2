//! Optical-flow reduction for the camera dendrite.
//!
//! Turns a dense flow field (one motion vector per pixel) into the scalar
//! excitation pushed onto the axon's queue. Capturing frames and computing the
//! flow field happen outside this crate.

use crate::config::NodeConfig;

/// Summary of one flow field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowReading {
    /// Absolute mean motion vector; whole-frame sway of the sculpture.
    pub mean_motion: [f64; 2],
    /// Magnitude of the average motion left after removing `mean_motion`.
    pub magnitude: f64,
}

impl FlowReading {
    /// Reduce a flow field of `[dx, dy]` vectors.
    pub fn from_field(field: &[[f32; 2]]) -> Self {
        if field.is_empty() {
            return Self::default();
        }
        let n = field.len() as f64;

        let (sx, sy) = field.iter().fold((0.0f64, 0.0f64), |(sx, sy), v| {
            (sx + f64::from(v[0]), sy + f64::from(v[1]))
        });
        let mx = (sx / n).abs();
        let my = (sy / n).abs();

        let (dx, dy) = field.iter().fold((0.0f64, 0.0f64), |(dx, dy), v| {
            (
                dx + (f64::from(v[0]).abs() - mx).max(0.0),
                dy + (f64::from(v[1]).abs() - my).max(0.0),
            )
        });
        let dx = dx / n;
        let dy = dy / n;

        Self {
            mean_motion: [mx, my],
            magnitude: (dx * dx + dy * dy).sqrt(),
        }
    }

    /// Excitation for this frame: zero for still frames, scaled down so busy
    /// frames contribute a small fraction of the fire threshold.
    pub fn delta_energy(&self, config: &NodeConfig) -> f32 {
        let above = (self.magnitude - config.movement_threshold).max(0.0);
        (above / config.optical_flow_scale) as f32
    }
}

/// Convenience wrapper: flow field straight to excitation.
pub fn delta_energy(field: &[[f32; 2]], config: &NodeConfig) -> f32 {
    FlowReading::from_field(field).delta_energy(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: f64, scale: f64) -> NodeConfig {
        NodeConfig {
            movement_threshold: threshold,
            optical_flow_scale: scale,
            ..NodeConfig::default()
        }
    }

    #[test]
    fn test_uniform_sway_is_ignored() {
        // Every pixel moving the same way is the sculpture swaying, not a visitor.
        let field = vec![[3.0, -4.0]; 64];
        let reading = FlowReading::from_field(&field);
        assert_eq!(reading.mean_motion, [3.0, 4.0]);
        assert_eq!(reading.magnitude, 0.0);
        assert_eq!(reading.delta_energy(&config(0.0, 1.0)), 0.0);
    }

    #[test]
    fn test_local_motion_scaled_by_config() {
        // Half the frame moves 3 px right, half 3 px left: mean is zero.
        let mut field = vec![[3.0, 0.0]; 50];
        field.extend(vec![[-3.0, 0.0]; 50]);
        let reading = FlowReading::from_field(&field);
        assert!((reading.magnitude - 3.0).abs() < 1e-9);

        let de = reading.delta_energy(&config(1.0, 100.0));
        assert!((de - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_still_frame_clamps_to_zero() {
        let field = vec![[0.1, 0.0], [-0.1, 0.0]];
        assert_eq!(delta_energy(&field, &NodeConfig::default()), 0.0);
        assert_eq!(delta_energy(&[], &NodeConfig::default()), 0.0);
    }
}
