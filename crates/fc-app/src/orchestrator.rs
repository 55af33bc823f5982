//! Phase sequencing for one production run.
//!
//! The orchestrator owns everything the run needs and is built explicitly from
//! its collaborators. Phases block the calling thread; only the steady-state
//! sampling cycle runs on its own thread, watched by a duration watchdog on
//! the caller's thread.

use crate::config::{ProcessConfig, secs};
use crate::error::{AppError, AppResult};
use crate::logger::DataSink;
use crate::phase::ProcessPhase;
use crate::sampling::{CycleSettings, SamplingCycle};
use crate::wiring::{Actuators, Sensors};
use fc_controls::{FeedbackController, PidGains};
use fc_core::{BoundedWorker, StopSignal, lock_or_recover};
use fc_instruments::{Instrument, Pump};
use fc_reactor::ConcentrationPredictor;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every phase ran to completion.
    Completed,
    /// An interrupt cut the run short; shutdown still ran.
    Interrupted,
}

type SharedController = Arc<Mutex<FeedbackController>>;

/// Flow loops, one per pump, driven by their meter's samples.
struct FlowLoops {
    a: SharedController,
    b: SharedController,
    solvent: SharedController,
    setpoints: [f64; 3],
}

impl FlowLoops {
    fn all(&self) -> [&SharedController; 3] {
        [&self.a, &self.b, &self.solvent]
    }

    fn hold_at_zero(&self) {
        for ctrl in self.all() {
            lock_or_recover(ctrl).set_override(Some(0.0));
        }
    }

    fn release_to_setpoints(&self) {
        for (ctrl, setpoint) in self.all().into_iter().zip(self.setpoints) {
            lock_or_recover(ctrl).set_setpoint(setpoint);
        }
    }
}

fn command_pump(pump: &dyn Pump, percent: f64, ceiling: f64) -> fc_instruments::InstrumentResult<()> {
    pump.set_speed_percent(percent.clamp(0.0, ceiling))
}

fn flow_loop(
    gains: PidGains,
    setpoint: f64,
    ceiling: f64,
    meter: &Arc<dyn Instrument>,
    pump: &Arc<dyn Pump>,
) -> AppResult<SharedController> {
    let target = Arc::clone(pump);
    let mut controller = FeedbackController::new(gains, setpoint)?.with_output(Box::new(move |cv| {
        if let Err(err) = command_pump(target.as_ref(), cv, ceiling) {
            tracing::warn!(pump = target.name(), error = %err, "flow loop command failed");
        }
    }));
    controller.set_override(Some(0.0));
    let shared = Arc::new(Mutex::new(controller));
    let subscriber = Arc::clone(&shared);
    meter.subscribe(Box::new(move |flow| {
        lock_or_recover(&subscriber).update(flow);
    }));
    Ok(shared)
}

pub struct ProcessOrchestrator<P> {
    config: ProcessConfig,
    sensors: Sensors,
    actuators: Actuators,
    cycle: Option<SamplingCycle<P>>,
    flow_loops: Option<FlowLoops>,
    interrupt: StopSignal,
    phase: Option<ProcessPhase>,
}

impl<P: ConcentrationPredictor + 'static> ProcessOrchestrator<P> {
    pub fn new(
        config: ProcessConfig,
        sensors: Sensors,
        actuators: Actuators,
        predictor: P,
        sink: Box<dyn DataSink>,
    ) -> AppResult<Self> {
        config.validate()?;
        let settings = CycleSettings::from_run(&config.run)?;
        let cycle = SamplingCycle::new(predictor, sensors.clone(), actuators.clone(), sink, settings)?;

        let ceiling = config.pumps.ceiling_percent;
        let flow_loops = match &config.flow_control {
            Some(flow) => Some(FlowLoops {
                a: flow_loop(flow.gains, flow.setpoint_a, ceiling, &sensors.flow_a, &actuators.pump_a)?,
                b: flow_loop(flow.gains, flow.setpoint_b, ceiling, &sensors.flow_b, &actuators.pump_b)?,
                solvent: flow_loop(
                    flow.gains,
                    flow.setpoint_solvent,
                    ceiling,
                    &sensors.flow_solvent,
                    &actuators.pump_solvent,
                )?,
                setpoints: [flow.setpoint_a, flow.setpoint_b, flow.setpoint_solvent],
            }),
            None => None,
        };

        Ok(Self {
            config,
            sensors,
            actuators,
            cycle: Some(cycle),
            flow_loops,
            interrupt: StopSignal::new(),
            phase: None,
        })
    }

    /// Signal that, once requested, cuts the run short at the next phase
    /// boundary or poll.
    pub fn interrupt_signal(&self) -> StopSignal {
        self.interrupt.clone()
    }

    /// Phase currently (or most recently) executing.
    pub fn phase(&self) -> Option<ProcessPhase> {
        self.phase
    }

    /// The sampling cycle, available again once the steady-state run
    /// has joined it.
    pub fn cycle(&self) -> Option<&SamplingCycle<P>> {
        self.cycle.as_ref()
    }

    /// Execute every phase in order.
    ///
    /// After an interrupt, or a failure before shutdown, the remaining
    /// production phases are skipped and shutdown still runs. Sensors are
    /// closed before returning.
    pub fn run(&mut self) -> AppResult<RunOutcome> {
        let mut failure = None;
        for phase in ProcessPhase::ALL {
            let cut_short = failure.is_some() || self.interrupt.is_requested();
            if cut_short && phase < ProcessPhase::Shutdown {
                continue;
            }
            self.phase = Some(phase);
            tracing::info!(%phase, "entering phase");
            let result = match phase {
                ProcessPhase::Prime => self.prime(),
                ProcessPhase::Warmup => self.warmup(),
                ProcessPhase::SteadyStateRun => self.steady_state_run(),
                ProcessPhase::Shutdown => self.shutdown(),
                ProcessPhase::Purge => self.purge(),
            };
            if let Err(err) = result {
                tracing::error!(%phase, error = %err, "phase failed");
                if failure.is_none() {
                    failure = Some(err);
                }
            }
        }
        self.sensors.close_all();

        if let Some(err) = failure {
            return Err(err);
        }
        if self.interrupt.is_requested() {
            tracing::info!("run interrupted");
            Ok(RunOutcome::Interrupted)
        } else {
            tracing::info!("run complete");
            Ok(RunOutcome::Completed)
        }
    }

    fn prime(&mut self) -> AppResult<()> {
        if let Some(loops) = &self.flow_loops {
            loops.hold_at_zero();
        }
        self.actuators.valve.set_open(false)?;
        self.await_first_readings();
        Ok(())
    }

    /// Wait (bounded, interruptible) until every required sensor has reported.
    fn await_first_readings(&self) {
        let deadline = Instant::now() + secs(self.config.instruments.first_reading_timeout_s);
        loop {
            let missing: Vec<&str> = self
                .sensors
                .required()
                .into_iter()
                .filter(|s| s.current_value().is_none())
                .map(|s| s.name())
                .collect();
            if missing.is_empty() {
                return;
            }
            if Instant::now() >= deadline {
                tracing::warn!(?missing, "starting without a first reading from every sensor");
                return;
            }
            tracing::info!(?missing, "waiting for data from instruments");
            if self.interrupt.sleep(self.config.warmup.poll_interval()) {
                return;
            }
        }
    }

    fn warmup(&mut self) -> AppResult<()> {
        let band = self.config.warmup.operating_range;
        let probe = &self.sensors.temperature;
        probe.set_operating_range(Some(band));
        while !probe.is_within_range() {
            tracing::info!(
                current = ?probe.current_value(),
                low = band.low,
                high = band.high,
                "waiting for reactor temperature"
            );
            if let Some(Err(err)) = self.cycle.as_mut().map(|cycle| cycle.record_status()) {
                tracing::warn!(error = %err, "warmup status row not logged");
            }
            if self.interrupt.sleep(self.config.warmup.poll_interval()) {
                return Ok(());
            }
        }

        match &self.flow_loops {
            Some(loops) => loops.release_to_setpoints(),
            None => {
                let ceiling = self.config.pumps.ceiling_percent;
                for pump in self.actuators.pumps() {
                    command_pump(pump.as_ref(), self.config.pumps.nominal_percent, ceiling)?;
                }
            }
        }
        Ok(())
    }

    fn steady_state_run(&mut self) -> AppResult<()> {
        let cycle = self.cycle.take().ok_or(AppError::CycleUnavailable)?;
        let worker = BoundedWorker::spawn("sampling-cycle", StopSignal::new(), move |stop| {
            cycle.run(stop)
        })?;

        let duration = self.config.run.duration();
        let poll = self.config.run.watchdog_poll();
        tracing::info!(duration_s = duration.as_secs_f64(), "watchdog armed");
        let start = Instant::now();
        loop {
            let elapsed = start.elapsed();
            if elapsed >= duration {
                break;
            }
            if self.interrupt.sleep(poll.min(duration - elapsed)) {
                break;
            }
        }

        match worker.shutdown(self.config.run.join_timeout()) {
            Some(cycle) => self.cycle = Some(cycle),
            None => tracing::warn!("sampling cycle did not stop in time; continuing without it"),
        }
        Ok(())
    }

    fn shutdown(&mut self) -> AppResult<()> {
        if let Some(loops) = &self.flow_loops {
            loops.hold_at_zero();
        }
        for pump in self.actuators.pumps() {
            if let Err(err) = pump.set_speed_percent(0.0) {
                tracing::error!(pump = pump.name(), error = %err, "failed to stop pump");
            }
        }
        self.actuators.valve.set_open(false)?;
        Ok(())
    }

    fn purge(&mut self) -> AppResult<()> {
        tracing::debug!("purge is not implemented for this process");
        Ok(())
    }
}
