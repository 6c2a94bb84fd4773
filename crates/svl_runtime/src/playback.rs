//! Playback controller.
//!
//! Drives an [`Engine`] on a timer. At most one loop task exists at a
//! time; every tick takes the engine lock, applies one whole delta, and
//! releases the lock before sleeping. Cancelling the loop therefore never
//! leaves a delta half applied.

use crate::config::PlaybackConfig;
use serde::Serialize;
use std::sync::Arc;
use svl_core::{CoreResult, Trace};
use svl_replay::{Engine, EngineEvent, StepReport};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Loaded or reset, nothing running
    Idle,
    /// Loop task is applying deltas
    Playing,
    /// Stopped before the end
    Paused,
    /// Every delta has been applied
    Ended,
}

struct PlaybackLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Timed playback over a shared engine
pub struct PlaybackController {
    engine: Arc<Mutex<Engine>>,
    config: PlaybackConfig,
    state: Arc<watch::Sender<PlaybackState>>,
    speed: watch::Sender<f64>,
    running: Option<PlaybackLoop>,
}

impl PlaybackController {
    /// Wrap an engine
    ///
    /// # Errors
    ///
    /// Returns error if the config fails validation
    pub fn new(engine: Engine, config: PlaybackConfig) -> CoreResult<Self> {
        config.validate()?;
        let (state, _) = watch::channel(PlaybackState::Idle);
        let (speed, _) = watch::channel(config.clamp_speed(config.speed));
        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            config,
            state: Arc::new(state),
            speed,
            running: None,
        })
    }

    /// Shared handle to the engine, for readers
    #[must_use]
    pub fn engine(&self) -> Arc<Mutex<Engine>> {
        Arc::clone(&self.engine)
    }

    /// Playback config
    #[must_use]
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    /// Whether the loop is running
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Watch state transitions
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    /// Subscribe to engine events
    pub async fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.engine.lock().await.subscribe()
    }

    /// Current speed factor
    #[must_use]
    pub fn speed(&self) -> f64 {
        *self.speed.borrow()
    }

    /// Set the speed factor, clamped into the configured range
    ///
    /// Only delays scheduled after this call are affected. Returns the
    /// speed actually applied.
    pub fn set_speed(&self, factor: f64) -> f64 {
        let speed = self.config.clamp_speed(factor);
        self.speed.send_replace(speed);
        tracing::debug!(speed, "playback speed changed");
        speed
    }

    /// Number of deltas applied
    pub async fn current_frame(&self) -> usize {
        self.engine.lock().await.current_frame()
    }

    /// Start the loop from the current frame
    ///
    /// A running loop is stopped first. Returns `false` without starting
    /// anything when no trace is loaded or playback is at the end.
    pub async fn play(&mut self) -> bool {
        self.stop().await;
        {
            let engine = self.engine.lock().await;
            if !engine.is_loaded() || engine.is_at_end() {
                tracing::debug!("nothing to play");
                return false;
            }
        }

        let cancel = CancellationToken::new();
        self.state.send_replace(PlaybackState::Playing);
        tracing::info!(speed = self.speed(), "playback started");

        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.engine),
            Arc::clone(&self.state),
            self.speed.subscribe(),
            self.config,
            cancel.clone(),
        ));
        self.running = Some(PlaybackLoop { cancel, handle });
        true
    }

    /// Stop the loop after the delta in flight
    pub async fn pause(&mut self) {
        if self.stop().await {
            let paused = self.state.send_if_modified(|state| {
                if *state == PlaybackState::Playing {
                    *state = PlaybackState::Paused;
                    true
                } else {
                    false
                }
            });
            if paused {
                tracing::info!("playback paused");
            }
        }
    }

    /// Apply exactly one delta with playback stopped
    pub async fn step(&mut self) -> Option<StepReport> {
        self.stop().await;
        let mut engine = self.engine.lock().await;
        let report = engine.step();
        if engine.is_at_end() {
            self.state.send_replace(PlaybackState::Ended);
        } else if report.is_some() {
            self.state.send_replace(PlaybackState::Paused);
        }
        report
    }

    /// Stop the loop and restore the initial frame
    pub async fn reset(&mut self) {
        self.stop().await;
        self.engine.lock().await.reset();
        self.state.send_replace(PlaybackState::Idle);
    }

    /// Stop the loop and replace the trace
    pub async fn load_trace(&mut self, trace: Trace) {
        self.stop().await;
        self.engine.lock().await.load_trace(trace);
        self.state.send_replace(PlaybackState::Idle);
    }

    /// Resolve once the loop is no longer playing
    ///
    /// Returns the state it settled in.
    pub async fn wait_until_finished(&self) -> PlaybackState {
        let mut state = self.state.subscribe();
        match state.wait_for(|s| *s != PlaybackState::Playing).await {
            Ok(settled) => *settled,
            Err(_) => self.state(),
        }
    }

    /// Cancel the loop and wait for it to exit
    ///
    /// Returns whether a loop existed.
    async fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            return false;
        };
        running.cancel.cancel();
        if let Err(err) = running.handle.await {
            tracing::warn!(%err, "playback loop ended abnormally");
        }
        true
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("speed", &self.speed())
            .field("running", &self.running.is_some())
            .finish()
    }
}

async fn run_loop(
    engine: Arc<Mutex<Engine>>,
    state: Arc<watch::Sender<PlaybackState>>,
    speed: watch::Receiver<f64>,
    config: PlaybackConfig,
    cancel: CancellationToken,
) {
    loop {
        let finished = {
            let mut engine = engine.lock().await;
            if cancel.is_cancelled() {
                break;
            }
            engine.step().is_none() || engine.is_at_end()
        };
        if finished {
            state.send_replace(PlaybackState::Ended);
            tracing::info!("playback ended");
            break;
        }

        let delay = config.interval(*speed.borrow());
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }
}
