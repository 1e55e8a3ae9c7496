//! Spinning cube demo application
//!
//! Opens the engine with a scene of unit cubes scattered across the
//! viewport, each spinning at its own random rate. Press R to reload the
//! shaders from disk and Escape to quit.
//!
//! Built without the `glfw-window` feature the demo runs a fixed number of
//! headless frames and exits.

use explorer_engine::foundation::logging::{self, LoggingConfig};
use explorer_engine::prelude::*;
use rand::prelude::*;

// Configuration constants
const CONFIG_PATH: &str = "explorer.toml";
const CUBE_COUNT: usize = 6;
const CUBE_SCALE: f32 = 0.2;
const SPREAD: f32 = 0.6; // Keep cubes inside clip space
const MAX_SPIN: f32 = 2.0; // radians per second
#[cfg(not(feature = "glfw-window"))]
const HEADLESS_FRAMES: u64 = 300;

fn build_scene(rng: &mut impl Rng) -> Scene {
    let mut scene = Scene::new("cubes");

    for i in 0..CUBE_COUNT {
        let mut cube = GameObject::new(format!("cube_{i}"))
            .with_component(MeshRenderer::new(format!("cube_{i}")))
            .with_component(Spin::new(Vec3::new(
                rng.gen_range(-MAX_SPIN..MAX_SPIN),
                rng.gen_range(-MAX_SPIN..MAX_SPIN),
                rng.gen_range(-MAX_SPIN..MAX_SPIN),
            )));

        let transform = cube.transform_mut();
        transform.set_position(Vec3::new(
            rng.gen_range(-SPREAD..SPREAD),
            rng.gen_range(-SPREAD..SPREAD),
            0.0,
        ));
        transform.set_scale(Vec3::new(CUBE_SCALE, CUBE_SCALE, CUBE_SCALE));

        scene.add_object(cube);
    }

    scene
}

#[cfg(feature = "glfw-window")]
fn platform() -> impl Platform {
    GlfwPlatform
}

#[cfg(not(feature = "glfw-window"))]
fn platform() -> impl Platform {
    HeadlessPlatform::new().with_frame_limit(HEADLESS_FRAMES)
}

fn run() -> Result<(), EngineError> {
    let config = ApplicationConfig::load_or_default(CONFIG_PATH)?;
    logging::init_with(LoggingConfig::with_filter(config.engine.log_level.clone()));

    log::info!("Starting cube explorer");

    let mut engine = Engine::new(config, platform(), StatsOverlay::default());
    engine.initialize()?;

    let scene = engine.add_scene(build_scene(&mut thread_rng()));
    engine.enter_scene(scene)?;

    engine.run()?;
    log::info!("Ran {} frames", engine.timer().frame_count());
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        // Logging may not be up if the configuration failed to load
        eprintln!("Cube explorer failed: {e}");
        log::error!("Cube explorer failed: {e:?}");
        std::process::exit(1);
    }
}
