/*!

  Scalar technology and convergence parameters for a sizing run.

*/

use crate::error::NetlistError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters consumed by the sizer, normally sourced from a preferences store.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SizerConfig {
    /// Target per-stage fan-out (su)
    pub global_step_up: f64,
    /// Wire capacitance per unit length, relative to a unit gate input
    pub wire_to_gate_cap_ratio: f64,
    /// Largest relative size change of a pass that still counts as converged
    pub convergence_epsilon: f64,
    /// Upper bound on the number of passes
    pub max_iterations: usize,
    /// Input capacitance of a unit gate, in fF
    pub gate_capacitance: f64,
    /// Weight of a driver's own diffusion capacitance relative to gate capacitance
    pub diffusion_alpha: f64,
    /// Keeper size as a fraction of the weakest opposing driver
    pub keeper_ratio: f64,
}

impl Default for SizerConfig {
    fn default() -> Self {
        Self {
            global_step_up: 4.7,
            wire_to_gate_cap_ratio: 0.16,
            convergence_epsilon: 0.001,
            max_iterations: 30,
            gate_capacitance: 0.4,
            diffusion_alpha: 0.7,
            keeper_ratio: 0.1,
        }
    }
}

impl SizerConfig {
    /// Checks that every parameter is finite and in range
    pub fn validate(&self) -> Result<(), NetlistError> {
        let positive = [
            ("global_step_up", self.global_step_up),
            ("convergence_epsilon", self.convergence_epsilon),
        ];
        let non_negative = [
            ("wire_to_gate_cap_ratio", self.wire_to_gate_cap_ratio),
            ("gate_capacitance", self.gate_capacitance),
            ("diffusion_alpha", self.diffusion_alpha),
            ("keeper_ratio", self.keeper_ratio),
        ];

        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(NetlistError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(NetlistError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Returns the size of a LOAD instance modelling a wire of `length`
    pub fn wire_load(&self, length: f64) -> f64 {
        length * self.wire_to_gate_cap_ratio
    }

    /// Reads a JSON preferences document. Missing fields keep their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json_reader(reader: impl std::io::Read) -> Result<Self, NetlistError> {
        let config: SizerConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON preferences file
    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, NetlistError> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_iterations, 30);
        assert!((config.wire_load(100.0) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_zero_step_up() {
        let config = SizerConfig {
            global_step_up: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid sizing parameter: global_step_up must be positive, got 0"
        );
    }

    #[test]
    fn rejects_nan_alpha() {
        let config = SizerConfig {
            diffusion_alpha: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(NetlistError::InvalidConfig(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json() {
        let json = r#"{ "global_step_up": 4.0, "max_iterations": 12 }"#;
        let config = SizerConfig::from_json_reader(json.as_bytes()).unwrap();
        assert_eq!(config.global_step_up, 4.0);
        assert_eq!(config.max_iterations, 12);
        assert_eq!(config.keeper_ratio, 0.1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn invalid_json_value() {
        let json = r#"{ "keeper_ratio": -0.5 }"#;
        assert!(matches!(
            SizerConfig::from_json_reader(json.as_bytes()),
            Err(NetlistError::InvalidConfig(_))
        ));
        assert!(matches!(
            SizerConfig::from_json_reader("{".as_bytes()),
            Err(NetlistError::Parse(_))
        ));
    }
}
