use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

use rackyard_geometry::{Aabb, BoundingVolume, GeometryError, Point, Polygon, Sphere};
use rackyard_layout::{Clearance, RackSpec};
use rackyard_navigation::{GridConfig, NavigationError};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "RACKYARD";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub grid: GridSettings,
    pub navigation: NavigationSettings,
    pub racks: RackSettings,
    pub simulation: SimulationSettings,
    pub scene: SceneSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridSettings {
    pub spacing: f64,
    pub length_units: usize,
    pub width_units: usize,
    #[serde(default)]
    pub ground_y: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigationSettings {
    pub avoidance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RackSettings {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub ceiling_height: f64,
    pub min_obstacle_distance: f64,
    pub min_row_distance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSettings {
    pub tick_ms: u64,
    /// World units per second.
    pub speed: f64,
    #[serde(default = "default_progress_capacity")]
    pub progress_capacity: usize,
    /// Playback running longer than this is cancelled.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_progress_capacity() -> usize {
    64
}

/// Demo scene: one floor outline, a few obstacles and the two route ends.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneSettings {
    #[serde(default)]
    pub floor_y: f64,
    pub floor: Vec<[f64; 2]>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleSettings>,
    pub vehicle: [f64; 2],
    pub target: [f64; 2],
}

/// A box when `size` is given, otherwise a sphere of `radius`.
#[derive(Debug, Clone, Deserialize)]
pub struct ObstacleSettings {
    pub center: [f64; 3],
    pub size: Option<[f64; 3]>,
    pub radius: Option<f64>,
}

impl Settings {
    pub fn grid_config(&self) -> Result<GridConfig, NavigationError> {
        GridConfig::new(self.grid.spacing, self.grid.length_units, self.grid.width_units, self.grid.ground_y)
    }

    pub fn rack_spec(&self) -> RackSpec {
        RackSpec::new(self.racks.width, self.racks.depth, self.racks.height)
    }

    pub fn clearance(&self) -> Clearance {
        Clearance::new(self.racks.min_obstacle_distance, self.racks.min_row_distance)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.simulation.tick_ms.max(1))
    }

    pub fn playback_timeout(&self) -> Option<Duration> {
        self.simulation.timeout_ms.map(Duration::from_millis)
    }
}

impl SceneSettings {
    pub fn floor_outline(&self) -> Result<Polygon, GeometryError> {
        let xz: Vec<(f64, f64)> = self.floor.iter().map(|p| (p[0], p[1])).collect();
        Polygon::from_xz(&xz, self.floor_y)
    }

    pub fn vehicle_position(&self) -> Point {
        Point::new(self.vehicle[0], self.floor_y, self.vehicle[1])
    }

    pub fn target_position(&self) -> Point {
        Point::new(self.target[0], self.floor_y, self.target[1])
    }
}

impl ObstacleSettings {
    pub fn bounds(&self) -> Result<BoundingVolume, GeometryError> {
        let center = Point::new(self.center[0], self.center[1], self.center[2]);
        match (self.size, self.radius) {
            (Some(size), _) => Aabb::try_from_center(center, Point::new(size[0], size[1], size[2])).map(BoundingVolume::Box),
            (None, Some(radius)) => Ok(BoundingVolume::Sphere(Sphere::new(center, radius))),
            (None, None) => Err(GeometryError::InvalidExtent("Obstacle needs either a size or a radius")),
        }
    }
}

/// Loads `config/default.toml` and applies `RACKYARD_*` environment
/// overrides, e.g. `RACKYARD_GRID__SPACING=0.5`.
pub fn load_settings() -> Result<Settings, ConfigError> {
    info!("Attempting to load configuration from {}", DEFAULT_CONFIG_PATH);

    let settings = Config::builder()
        .add_source(File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(true))
        .add_source(environment())
        .build()
        .and_then(|config| config.try_deserialize::<Settings>());

    match settings {
        Ok(settings) => {
            info!("Successfully loaded configuration: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Parses settings from TOML text, without environment overrides.
#[cfg(test)]
pub fn parse_settings(toml: &str) -> Result<Settings, ConfigError> {
    Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_TOML: &str = include_str!("../config/default.toml");

    #[test]
    fn test_default_file_parses() {
        let settings = parse_settings(DEFAULT_TOML).unwrap();
        let grid = settings.grid_config().unwrap();
        assert_eq!(grid.columns(), 80);
        assert_eq!(grid.rows(), 60);
        assert_eq!(settings.rack_spec().levels_under(settings.racks.ceiling_height), Ok(3));
        assert_eq!(settings.tick(), Duration::from_millis(20));
        assert_eq!(settings.playback_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(settings.scene.obstacles.len(), 2);

        let outline = settings.scene.floor_outline().unwrap();
        assert_eq!(outline.area(), 2400.0);
    }

    #[test]
    fn test_obstacle_shapes() {
        let settings = parse_settings(DEFAULT_TOML).unwrap();
        assert!(matches!(settings.scene.obstacles[0].bounds(), Ok(BoundingVolume::Box(_))));
        assert!(matches!(settings.scene.obstacles[1].bounds(), Ok(BoundingVolume::Sphere(_))));

        let neither = ObstacleSettings { center: [0.0; 3], size: None, radius: None };
        assert!(neither.bounds().is_err());
    }

    #[test]
    fn test_missing_section_is_an_error() {
        let err = parse_settings("[grid]\nspacing = 1.0\nlength_units = 4\nwidth_units = 4\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_bad_grid_is_rejected() {
        let toml = DEFAULT_TOML.replace("spacing = 1.0", "spacing = 0.0");
        let settings = parse_settings(&toml).unwrap();
        assert!(settings.grid_config().is_err());
    }
}
