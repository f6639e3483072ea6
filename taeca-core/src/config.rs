//! # Configuration
//!
//! Everything the host supplies up front: initial rule parameters, the
//! rule-table capacity ceiling, grid dimensions, and the compute backend.

use serde::{Deserialize, Serialize};

use crate::error::TaecaResult;
use crate::seed::SeedPattern;

/// Master configuration for TAECA
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TaecaConfig {
    /// Rule parameters and limits
    pub rule: RuleConfig,

    /// Grid dimensions and pacing
    pub grid: GridConfig,

    /// Compute backend preference
    pub compute: ComputeConfig,
}

/// Rule parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Neighborhood radius at startup
    pub initial_r: u32,

    /// State count at startup
    pub initial_k: u32,

    /// Rule number at startup, decimal text
    pub initial_rule_number: String,

    /// Largest rule table the host can hold, in bytes
    pub capacity_ceiling: u64,

    /// Number of seed words drawn per random rule
    pub random_kernel_size: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            initial_r: 1,
            initial_k: 2,
            initial_rule_number: "6".to_string(),
            // WebGPU default maxStorageBufferBindingSize
            capacity_ceiling: 134_217_728,
            random_kernel_size: 64,
        }
    }
}

/// Grid dimensions
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridConfig {
    /// Row width in cells (columns wrap)
    pub width: usize,

    /// Number of rows before the stepper is done
    pub max_height: usize,

    /// Rows advanced per frame
    pub rows_per_frame: usize,

    /// Keep every computed row for the renderer
    pub record_history: bool,

    /// How row 0 is filled
    pub seed_pattern: SeedPattern,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 256,
            max_height: 128,
            rows_per_frame: 8,
            record_history: true,
            seed_pattern: SeedPattern::SingleCenter,
        }
    }
}

impl GridConfig {
    /// Cells in a full `width x max_height` grid
    ///
    /// Fails with a config error when the grid could not be addressed.
    pub fn grid_cells(width: usize, max_height: usize) -> TaecaResult<usize> {
        width
            .checked_mul(max_height)
            .filter(|cells| {
                cells
                    .checked_mul(std::mem::size_of::<u32>())
                    .map_or(false, |bytes| bytes <= isize::MAX as usize)
            })
            .ok_or_else(|| {
                crate::TaecaError::config(format!(
                    "a {}x{} grid is too large to address",
                    width, max_height
                ))
            })
    }
}

/// Compute backend settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComputeConfig {
    /// Which backend to use
    pub backend: ComputeBackendType,

    /// Row width from which `Auto` goes parallel
    pub parallel_threshold: usize,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            backend: ComputeBackendType::Auto,
            parallel_threshold: 4096,
        }
    }
}

/// Available compute backends
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeBackendType {
    /// Pick by row width
    Auto,
    /// Rayon, parallel over columns
    Cpu,
    /// Single-threaded reference kernel
    Scalar,
}

impl ComputeBackendType {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "cpu" => Some(Self::Cpu),
            "scalar" => Some(Self::Scalar),
            _ => None,
        }
    }
}

impl TaecaConfig {
    /// Load configuration from file
    pub fn load(path: &str) -> TaecaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> TaecaResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create config from environment variables
    ///
    /// Starts from `TCA_CONFIG` (a JSON file) if set, else the defaults,
    /// then applies:
    /// - TCA_INITIAL_RANGE: radius r
    /// - TCA_INITIAL_STATES: state count k
    /// - TCA_INITIAL_RULE_NUMBER: decimal rule number
    /// - TCA_MAX_RULESET_BYTES: capacity ceiling
    /// - TCA_INIT_KERNEL_SIZE: random seed words per rule
    /// - TCA_TEXTURE_WIDTH / TCA_TEXTURE_HEIGHT: grid size
    /// - TCA_MAX_ITERATIONS_PER_FRAME: rows per frame
    /// - TCA_BACKEND: "auto", "cpu" or "scalar"
    pub fn from_env() -> TaecaResult<Self> {
        let mut config = match std::env::var("TCA_CONFIG") {
            Ok(path) => Self::load(&path)?,
            Err(_) => Self::default(),
        };

        if let Some(v) = env_parse("TCA_INITIAL_RANGE") {
            config.rule.initial_r = v;
        }
        if let Some(v) = env_parse("TCA_INITIAL_STATES") {
            config.rule.initial_k = v;
        }
        if let Ok(v) = std::env::var("TCA_INITIAL_RULE_NUMBER") {
            config.rule.initial_rule_number = v;
        }
        if let Some(v) = env_parse("TCA_MAX_RULESET_BYTES") {
            config.rule.capacity_ceiling = v;
        }
        if let Some(v) = env_parse("TCA_INIT_KERNEL_SIZE") {
            config.rule.random_kernel_size = v;
        }
        if let Some(v) = env_parse("TCA_TEXTURE_WIDTH") {
            config.grid.width = v;
        }
        if let Some(v) = env_parse("TCA_TEXTURE_HEIGHT") {
            config.grid.max_height = v;
        }
        if let Some(v) = env_parse("TCA_MAX_ITERATIONS_PER_FRAME") {
            config.grid.rows_per_frame = v;
        }
        if let Ok(v) = std::env::var("TCA_BACKEND") {
            match ComputeBackendType::parse(&v) {
                Some(backend) => config.compute.backend = backend,
                None => tracing::warn!("Unknown TCA_BACKEND {:?}, keeping {:?}", v, config.compute.backend),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the stepper cannot run
    pub fn validate(&self) -> TaecaResult<()> {
        if self.grid.width == 0 {
            return Err(crate::TaecaError::config("grid.width must be at least 1"));
        }
        GridConfig::grid_cells(self.grid.width, self.grid.max_height)?;
        if self.grid.rows_per_frame == 0 {
            return Err(crate::TaecaError::config("grid.rows_per_frame must be at least 1"));
        }
        if self.rule.random_kernel_size == 0 {
            return Err(crate::TaecaError::config("rule.random_kernel_size must be at least 1"));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TaecaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rule.initial_r, 1);
        assert_eq!(config.rule.initial_k, 2);
    }

    #[test]
    fn test_zero_width_rejected() {
        let mut config = TaecaConfig::default();
        config.grid.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let mut config = TaecaConfig::default();
        config.grid.max_height = usize::MAX / 4;
        assert!(matches!(config.validate(), Err(crate::TaecaError::Config(_))));

        assert_eq!(GridConfig::grid_cells(256, 128).unwrap(), 256 * 128);
        assert!(GridConfig::grid_cells(usize::MAX, 2).is_err());
        // Fits a usize but not as bytes
        assert!(GridConfig::grid_cells(usize::MAX / 4, 2).is_err());
    }

    #[test]
    fn test_json_roundtrip_keeps_backend() {
        let mut config = TaecaConfig::default();
        config.compute.backend = ComputeBackendType::Scalar;
        config.grid.seed_pattern = SeedPattern::Random { seed: 42 };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"scalar\""));
        let back: TaecaConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.compute.backend, ComputeBackendType::Scalar);
        assert_eq!(back.grid.seed_pattern, SeedPattern::Random { seed: 42 });
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(ComputeBackendType::parse("CPU"), Some(ComputeBackendType::Cpu));
        assert_eq!(ComputeBackendType::parse("gpu"), None);
    }
}
