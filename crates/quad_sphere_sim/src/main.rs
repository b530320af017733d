//! Headless quad-sphere flight.
//!
//! Flies a tracked object toward a planet, stepping the terrain LOD and the
//! floating origin every tick, and logs what happened:
//! - origin shifts (info)
//! - periodic LOD stats (info)
//! - per step reports (debug)
//!
//! Logging follows `RUST_LOG` (default `info`).

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use quad_sphere::{
	FloatingOriginScene, GlobalPosition, LodQuadSphere, MeshDispatcher, RayonDispatcher,
	TerrainEvent, TrackedObject,
};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};

use config::{Completion, ScenarioConfig};

/// Quad-sphere terrain and floating origin simulation.
#[derive(Parser, Debug)]
#[command(name = "quad_sphere_sim")]
#[command(about = "Flies toward a planet and reports terrain LOD and origin shifts")]
struct Args {
	/// Path to a scenario TOML file (built-in defaults if omitted).
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Override the number of steps.
	#[arg(short, long)]
	steps: Option<u64>,

	/// Override the number of mesh build threads (0 = global pool).
	#[arg(short, long)]
	threads: Option<usize>,

	/// Poll builds instead of joining them every step.
	#[arg(long)]
	poll: bool,
}

fn init_logging() {
	use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info".into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();
}

fn main() -> Result<()> {
	init_logging();
	let args = Args::parse();

	let mut scenario = match &args.config {
		Some(path) => {
			tracing::info!(path = %path.display(), "loading scenario");
			ScenarioConfig::load(path)?
		}
		None => ScenarioConfig::default(),
	};
	if let Some(steps) = args.steps {
		scenario.flight.steps = steps;
	}
	if let Some(threads) = args.threads {
		scenario.workers.threads = threads;
	}
	if args.poll {
		scenario.planet.completion = Completion::Poll;
	}
	scenario.validate()?;

	run(&scenario)
}

fn dispatcher(threads: usize) -> Result<Arc<dyn MeshDispatcher>> {
	let dispatcher = if threads == 0 {
		RayonDispatcher::new()
	} else {
		let pool = rayon::ThreadPoolBuilder::new()
			.num_threads(threads)
			.thread_name(|i| format!("mesh-build-{i}"))
			.build()
			.context("Failed to build mesh worker pool")?;
		RayonDispatcher::with_pool(Arc::new(pool))
	};
	tracing::info!(threads = dispatcher.num_threads(), "mesh dispatcher ready");
	Ok(Arc::new(dispatcher))
}

fn run(scenario: &ScenarioConfig) -> Result<()> {
	let flight = &scenario.flight;
	let frame_config = scenario.frame_config();

	let [sx, sy, sz] = flight.start;
	let start = GlobalPosition::new(sx, sy, sz);
	let tracked = TrackedObject::new(
		(start - frame_config.initial_origin).as_vec3(),
		Vec3::from_array(flight.velocity),
	);
	let mut scene =
		FloatingOriginScene::new(&frame_config, tracked).context("Failed to create scene")?;

	// The planet sits at the global origin.
	let body = scene.frames().active().transform_to_local(GlobalPosition::ZERO);
	let sphere = LodQuadSphere::new(
		scenario.sphere_config(),
		dispatcher(scenario.workers.threads)?,
		body,
	)
	.context("Failed to create planet")?;
	let sphere = scene.add_sphere(sphere);

	let radius = scenario.planet.radius;
	let mut landed = false;
	let mut totals = quad_sphere::StepReport::default();
	let mut mesh_bytes = 0usize;

	for step in 1..=flight.steps {
		let report = scene.step(flight.dt)?;
		let altitude = report.poi.as_dvec3().length() - radius;

		for r in &report.spheres {
			totals.subdivisions += r.subdivisions;
			totals.unsubdivisions += r.unsubdivisions;
			totals.builds_failed += r.builds_failed;
			tracing::debug!(step, ?r, "step");
		}

		// Nothing renders here: count committed meshes and let them go.
		let events = sphere
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.drain_events();
		for event in events {
			if let TerrainEvent::MeshCommitted { mesh, .. } = event {
				mesh_bytes += mesh.memory_bytes();
			}
		}

		if report.shifted {
			let origin = scene.frames().active().transform_to_global(Vec3::ZERO);
			tracing::info!(
				step,
				origin = ?origin.as_dvec3(),
				altitude,
				"origin shifted"
			);
		}

		if !landed && altitude <= flight.min_altitude {
			landed = true;
			scene
				.tracked()
				.lock()
				.unwrap_or_else(PoisonError::into_inner)
				.velocity = Vec3::ZERO;
			tracing::info!(step, altitude, "reached minimum altitude, holding position");
		}

		if flight.report_every > 0 && step % flight.report_every == 0 {
			let sphere = sphere.lock().unwrap_or_else(PoisonError::into_inner);
			let stats = sphere.stats();
			tracing::info!(
				step,
				altitude,
				patches = stats.patches,
				deepest = stats.deepest_level,
				rebuilding = stats.rebuilding,
				per_level = ?stats.leaves_per_level,
				"lod"
			);
		}
	}

	let sphere = sphere.lock().unwrap_or_else(PoisonError::into_inner);
	let metrics = sphere.metrics();
	let (min_us, max_us) = metrics.build_timings.min_max().unwrap_or((0, 0));
	tracing::info!(
		steps = scene.step_count(),
		switches = scene.frames().switch_count(),
		subdivisions = totals.subdivisions,
		unsubdivisions = totals.unsubdivisions,
		builds = metrics.builds_completed,
		failed = metrics.builds_failed,
		avg_build_us = metrics.avg_build_timing_us(),
		min_build_us = min_us,
		max_build_us = max_us,
		live_patches = metrics.live_patches(),
		mesh_mib = mesh_bytes as f64 / (1024.0 * 1024.0),
		"done"
	);
	if totals.builds_failed > 0 {
		tracing::warn!(failed = totals.builds_failed, "some patch builds failed");
	}

	Ok(())
}
