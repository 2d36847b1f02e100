//! Single-threaded control loop.
//!
//! Each [`Controller::step`] drains the command channel, samples the mode
//! input, then runs one acquire → process → render → release cycle. Command
//! handling and the mode toggle only ever run between cycles, so the
//! settings a cycle sees cannot change underneath it.
use super::source::{FrameLease, FrameSource};
use super::{PartsCounter, PipelineParams};
use crate::command::{CommandContext, CommandProcessor, DEFAULT_LINE_CAPACITY};
use crate::error::PipelineError;
use crate::image::GrayFrame;
use crate::render::{render_cycle, render_failure, Renderer};
use crate::settings::{KeyValueStore, SettingsStore};
use crate::types::DisplayMode;
use log::{debug, error, info, warn};
use std::thread;
use std::time::Duration;

/// Byte-oriented, non-blocking line channel (serial port, stdin pipe).
pub trait CommandChannel {
    /// Copy whatever bytes are pending into `buf`; 0 when nothing is waiting.
    fn read_available(&mut self, buf: &mut [u8]) -> usize;
    fn write_line(&mut self, line: &str);
    /// `false` once the peer has gone away for good.
    fn is_open(&self) -> bool {
        true
    }
}

/// Debounced mode-toggle input.
pub trait ModeInput {
    /// `true` once per press.
    fn poll_pressed(&mut self) -> bool;
    /// Current level.
    fn is_pressed(&self) -> bool;
}

/// Presses itself every `every` polls; 0 never presses.
#[derive(Clone, Debug, Default)]
pub struct PeriodicToggle {
    every: u64,
    ticks: u64,
    pressed: bool,
}

impl PeriodicToggle {
    pub fn new(every: u64) -> Self {
        Self {
            every,
            ticks: 0,
            pressed: false,
        }
    }
}

impl ModeInput for PeriodicToggle {
    fn poll_pressed(&mut self) -> bool {
        if self.every == 0 {
            return false;
        }
        self.ticks += 1;
        self.pressed = self.ticks % self.every == 0;
        self.pressed
    }

    fn is_pressed(&self) -> bool {
        self.pressed
    }
}

#[derive(Clone, Debug)]
pub struct ControllerParams {
    pub pipeline: PipelineParams,
    /// Pause between cycles.
    pub cycle_delay: Duration,
    pub line_capacity: usize,
}

impl Default for ControllerParams {
    fn default() -> Self {
        Self {
            pipeline: PipelineParams::default(),
            cycle_delay: Duration::from_millis(20),
            line_capacity: DEFAULT_LINE_CAPACITY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A cycle ran to completion with this count.
    Processed(usize),
    /// The cycle was abandoned; the reason is logged and retried next step.
    Skipped(String),
}

pub struct Controller<F, R, C, I, S>
where
    F: FrameSource,
    R: Renderer,
    C: CommandChannel,
    I: ModeInput,
    S: KeyValueStore,
{
    source: F,
    renderer: R,
    channel: C,
    input: I,
    store: SettingsStore<S>,
    commands: CommandProcessor,
    counter: PartsCounter,
    mode: DisplayMode,
    cycle_delay: Duration,
    cycles: u64,
    skipped: u64,
}

impl<F, R, C, I, S> Controller<F, R, C, I, S>
where
    F: FrameSource,
    R: Renderer,
    C: CommandChannel,
    I: ModeInput,
    S: KeyValueStore,
{
    pub fn new(
        params: ControllerParams,
        source: F,
        renderer: R,
        channel: C,
        input: I,
        store: SettingsStore<S>,
    ) -> Self {
        Self::with_counter(
            source,
            renderer,
            channel,
            input,
            store,
            PartsCounter::new(params.pipeline),
            params.cycle_delay,
            params.line_capacity,
        )
    }

    /// Use a pre-built counter, e.g. one carrying a scheduling hook.
    #[allow(clippy::too_many_arguments)]
    pub fn with_counter(
        source: F,
        renderer: R,
        channel: C,
        input: I,
        store: SettingsStore<S>,
        counter: PartsCounter,
        cycle_delay: Duration,
        line_capacity: usize,
    ) -> Self {
        Self {
            source,
            renderer,
            channel,
            input,
            store,
            commands: CommandProcessor::new(line_capacity),
            counter,
            mode: DisplayMode::default(),
            cycle_delay,
            cycles: 0,
            skipped: 0,
        }
    }

    /// Bring up the frame source. On failure the panel shows the failure
    /// state and the error is returned; the caller must not keep running.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if let Err(msg) = self.source.init() {
            warn!("frame source init failed: {msg}");
            render_failure(&mut self.renderer, &msg);
            return Err(PipelineError::SourceInit(msg));
        }
        info!("controller started in {} mode", self.mode);
        Ok(())
    }

    /// One loop iteration without the trailing sleep.
    pub fn step(&mut self) -> StepOutcome {
        self.drain_commands();
        if self.input.poll_pressed() {
            self.mode = self.mode.next();
            info!("display mode -> {}", self.mode);
        }

        let outcome = self.run_cycle();
        match &outcome {
            Ok(count) => {
                self.cycles += 1;
                StepOutcome::Processed(*count)
            }
            Err(err) => {
                self.skipped += 1;
                if err.is_transient() {
                    warn!("cycle skipped: {err}");
                } else {
                    error!("cycle failed: {err}");
                }
                StepOutcome::Skipped(err.to_string())
            }
        }
    }

    /// Step until `max_cycles` steps have run (forever when `None`) or the
    /// command channel closes.
    pub fn run(&mut self, max_cycles: Option<u64>) {
        let mut steps = 0u64;
        loop {
            if max_cycles.is_some_and(|max| steps >= max) {
                break;
            }
            self.step();
            steps += 1;
            if !self.channel.is_open() {
                info!("command channel closed");
                break;
            }
            if !self.cycle_delay.is_zero() {
                thread::sleep(self.cycle_delay);
            }
        }
        info!(
            "controller stopped after {steps} step(s): processed={} skipped={}",
            self.cycles, self.skipped
        );
    }

    fn drain_commands(&mut self) {
        let ctx = CommandContext {
            mode: self.mode,
            input_pressed: self.input.is_pressed(),
        };
        let mut buf = [0u8; 64];
        loop {
            let n = self.channel.read_available(&mut buf);
            if n == 0 {
                break;
            }
            for reply in self.commands.feed(&buf[..n], &mut self.store, &ctx) {
                self.channel.write_line(&reply);
            }
        }
    }

    fn run_cycle(&mut self) -> Result<usize, PipelineError> {
        let lease = FrameLease::acquire(&mut self.source).ok_or(PipelineError::NoFrame)?;
        let frame = lease.frame().view();
        let output = self
            .counter
            .process(&frame, self.store.settings(), self.mode)?;
        render_cycle(&mut self.renderer, self.mode, &frame, &output);
        self.channel.write_line(&output.report.status_line());
        debug!("cycle {} done", self.cycles + 1);
        Ok(output.report.count())
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn settings_store(&self) -> &SettingsStore<S> {
        &self.store
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Cycles that ran to completion.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
