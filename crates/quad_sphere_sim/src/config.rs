//! Scenario file parsing.

use anyhow::{Context, Result};
use quad_sphere::{BuildCompletion, FrameConfig, GlobalPosition, QuadSphereConfig};
use serde::Deserialize;
use std::path::Path;

/// Root scenario configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
	pub planet: PlanetConfig,
	pub frame: FrameSection,
	pub flight: FlightConfig,
	pub workers: WorkerConfig,
}

/// Terrain body, centered on the global origin.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PlanetConfig {
	pub radius: f64,
	pub edge_subdivisions: u32,
	pub hard_limit: u32,
	/// Defaults to one diameter when omitted.
	pub root_subdivision_distance: Option<f64>,
	pub completion: Completion,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Completion {
	#[default]
	Blocking,
	Poll,
}

/// Floating origin settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FrameSection {
	pub initial_origin: [f64; 3],
	pub max_floating_origin_range: f32,
}

/// Tracked object trajectory.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
	/// Global start position.
	pub start: [f64; 3],
	/// Velocity in units per second.
	pub velocity: [f32; 3],
	/// Seconds per step.
	pub dt: f32,
	pub steps: u64,
	/// Stop moving below this altitude.
	pub min_altitude: f64,
	/// Log sphere stats every N steps (0 disables).
	pub report_every: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
	/// Dedicated mesh build threads; 0 uses rayon's global pool.
	pub threads: usize,
}

impl Default for PlanetConfig {
	fn default() -> Self {
		Self {
			radius: 600_000.0,
			edge_subdivisions: 5,
			hard_limit: 12,
			root_subdivision_distance: None,
			completion: Completion::Blocking,
		}
	}
}

impl Default for FrameSection {
	fn default() -> Self {
		Self {
			initial_origin: [0.0; 3],
			max_floating_origin_range: quad_sphere::DEFAULT_MAX_FLOATING_ORIGIN_RANGE,
		}
	}
}

impl Default for FlightConfig {
	fn default() -> Self {
		Self {
			start: [1_800_000.0, 0.0, 0.0],
			velocity: [-4_000.0, 0.0, 0.0],
			dt: 1.0,
			steps: 400,
			min_altitude: 100.0,
			report_every: 50,
		}
	}
}

impl ScenarioConfig {
	/// Load a scenario from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
		let config: ScenarioConfig =
			toml::from_str(&content).with_context(|| "Failed to parse scenario TOML")?;
		config.validate()?;
		Ok(config)
	}

	/// Check the settings the library does not already reject.
	pub fn validate(&self) -> Result<()> {
		if !(self.flight.dt.is_finite() && self.flight.dt > 0.0) {
			anyhow::bail!("flight.dt must be positive, got {}", self.flight.dt);
		}
		if self.flight.steps == 0 {
			anyhow::bail!("flight.steps must be at least 1");
		}
		if self.flight.start.iter().any(|v| !v.is_finite())
			|| self.flight.velocity.iter().any(|v| !v.is_finite())
		{
			anyhow::bail!("flight.start and flight.velocity must be finite");
		}
		self.sphere_config()
			.validate()
			.context("Invalid [planet] section")?;
		self.frame_config()
			.validate()
			.context("Invalid [frame] section")?;
		Ok(())
	}

	pub fn sphere_config(&self) -> QuadSphereConfig {
		let planet = &self.planet;
		let mut config = QuadSphereConfig::new(planet.radius)
			.with_edge_subdivisions(planet.edge_subdivisions)
			.with_hard_limit(planet.hard_limit)
			.with_build_completion(match planet.completion {
				Completion::Blocking => BuildCompletion::Blocking,
				Completion::Poll => BuildCompletion::Poll,
			});
		if let Some(distance) = planet.root_subdivision_distance {
			config = config.with_root_subdivision_distance(distance);
		}
		config
	}

	pub fn frame_config(&self) -> FrameConfig {
		let [x, y, z] = self.frame.initial_origin;
		FrameConfig::default()
			.with_initial_origin(GlobalPosition::new(x, y, z))
			.with_max_floating_origin_range(self.frame.max_floating_origin_range)
	}
}
