//! Wires a [`Config`] into a runnable simulation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use mms_hal::{Integrator, SimMouse};
use mms_kernel::{Clock, SimState, SystemClock};
use mms_maze::MazeBuilder;
use mms_middleware::EventBus;
use mms_runtime::{LockstepClock, MazeOverlay, MouseInterface};
use mms_types::{InterfaceMode, MmsError};

use crate::algorithm::{self, RunSummary};
use crate::config::Config;

/// Everything one run needs, assembled from a [`Config`].
pub struct Simulation {
    pub interface: MouseInterface,
    pub mouse: Arc<SimMouse>,
    pub clock: Arc<dyn Clock>,
    config: Config,
}

impl Simulation {
    /// Build maze, mouse, overlay and clock. Annotations and alerts are
    /// published on `bus`.
    pub fn build(config: &Config, state: Arc<SimState>, bus: &EventBus) -> Result<Self, MmsError> {
        config.validate()?;
        let maze = Arc::new(MazeBuilder::bordered(config.maze.width, config.maze.height).build()?);

        let mut builder = SimMouse::builder(maze.clone(), &config.sim)
            .with_wheel_radius(config.mouse.wheel_radius)
            .with_wheel_base(config.mouse.wheel_base)
            .with_initial_direction(config.mouse.initial_direction);
        for sensor in &config.mouse.sensors {
            builder = builder.with_sensor(sensor.name.clone(), sensor.to_spec());
        }
        let mouse = Arc::new(builder.build()?);

        let clock: Arc<dyn Clock> = if config.run.lockstep {
            Arc::new(LockstepClock::new().with_integrator(mouse.clone()))
        } else {
            Arc::new(SystemClock::new())
        };
        let overlay = Arc::new(MazeOverlay::new().with_bus(bus.clone()));
        let interface = MouseInterface::new(
            maze,
            mouse.clone(),
            overlay,
            state,
            config.sim.clone(),
            clock.clone(),
        )?
        .with_bus(bus.clone());

        debug!(
            width = config.maze.width,
            height = config.maze.height,
            sensors = config.mouse.sensors.len(),
            lockstep = config.run.lockstep,
            "simulation assembled"
        );
        Ok(Self {
            interface,
            mouse,
            clock,
            config: config.clone(),
        })
    }

    /// Run the built-in algorithm for the configured interface.
    ///
    /// In wall-clock mode a background thread integrates the mouse for the
    /// duration of the run.
    pub fn run(&mut self) -> Result<RunSummary, MmsError> {
        let integrator = (!self.config.run.lockstep)
            .then(|| RealTimeIntegrator::spawn(self.mouse.clone(), self.config.sim.min_sleep()));

        info!(interface = %self.config.run.interface, max_steps = self.config.run.max_steps, "run started");
        let result = match self.config.run.interface {
            InterfaceMode::Discrete => {
                algorithm::follow_left_wall(&self.interface, self.config.run.max_steps)
            }
            InterfaceMode::Continuous => {
                algorithm::cruise(&self.interface, self.config.run.max_steps)
            }
        };

        if let Some(integrator) = integrator {
            integrator.stop();
        }
        result
    }

    /// Simulated (or wall-clock) time since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.clock.now()
    }
}

/// Steps the mouse on a background thread using measured wall time.
struct RealTimeIntegrator {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl RealTimeIntegrator {
    fn spawn(mouse: Arc<SimMouse>, tick: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::spawn(move || {
            let mut last = Instant::now();
            while flag.load(Ordering::SeqCst) {
                thread::sleep(tick);
                let now = Instant::now();
                mouse.step(now - last);
                last = now;
            }
        });
        Self { running, handle }
    }

    fn stop(self) {
        self.running.store(false, Ordering::SeqCst);
        if self.handle.join().is_err() {
            warn!("integrator thread panicked");
        }
    }
}
