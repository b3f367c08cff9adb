//! Three-stage pipeline: acquire, process+decide, display. Stages hand
//! frames over through capacity-1 watch slots, so a stalled consumer only
//! ever sees the freshest pending frame and older unread frames are dropped.

use crate::config::Configuration;
use crate::control::DecisionEngine;
use crate::detect::{Category, DetectionEngine};
use crate::error::AppError;
use crate::frame::Frame;
use crate::input::Actuator;
use crate::pipeline::{CaptureSource, FrameSink};
use image::RgbImage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Coordinator {
    acquire_task: JoinHandle<()>,
    process_task: JoinHandle<()>,
    display_task: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl Coordinator {
    fn start(
        configuration: Configuration,
        capture: Box<dyn CaptureSource>,
        sink: Box<dyn FrameSink>,
        actuator: Box<dyn Actuator>,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let (frame_tx, frame_rx) = watch::channel(None::<Frame>);
        let (display_tx, display_rx) = watch::channel(None::<Arc<RgbImage>>);

        let acquire_task = Self::start_acquire(capture, frame_tx, cancel_token.clone());
        let process_task = Self::start_process(
            configuration,
            frame_rx,
            display_tx,
            actuator,
            cancel_token.clone(),
        );
        let display_task = Self::start_display(sink, display_rx, cancel_token.clone());

        Self {
            acquire_task,
            process_task,
            display_task,
            cancel_token,
        }
    }

    /// Acquire stage: grab frames as fast as the backend allows and replace
    /// whatever is sitting unread in the hand-off slot.
    fn start_acquire(
        mut capture: Box<dyn CaptureSource>,
        frame_tx: watch::Sender<Option<Frame>>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            while !token.is_cancelled() {
                match capture.grab() {
                    Ok(frame) => {
                        if frame_tx.send(Some(frame)).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        tracing::error!(%error, "capture backend failed, acquire stage exiting");
                        break;
                    }
                }
            }
            tracing::info!("acquire stage stopped");
        })
    }

    /// Process+decide stage: wait for the next frame, run the detection
    /// engine, run the control law, actuate, and hand the annotated frame
    /// to the display stage.
    fn start_process(
        configuration: Configuration,
        mut frame_rx: watch::Receiver<Option<Frame>>,
        display_tx: watch::Sender<Option<Arc<RgbImage>>>,
        mut actuator: Box<dyn Actuator>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let engine = DetectionEngine::new(&configuration);
            let mut decision = DecisionEngine::new(configuration.decision.clone());

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = frame_rx.changed() => {
                        if changed.is_err() {
                            tracing::info!("acquire stage is gone, process stage exiting");
                            break;
                        }
                        let Some(frame) = frame_rx.borrow_and_update().clone() else {
                            continue;
                        };

                        let observations = engine.process(&frame).await;
                        let now = Instant::now();

                        let player = observations
                            .detections
                            .iter()
                            .find(|d| d.category == Category::SelfTank)
                            .map(|d| d.position);
                        let death = observations
                            .detections
                            .iter()
                            .any(|d| d.category == Category::PossibleDeath);
                        let upgrade = observations
                            .detections
                            .iter()
                            .any(|d| d.category == Category::Upgrade);

                        if player.is_none() && death {
                            tracing::info!("death overlay with no self detection, stopping the run");
                            let _ = display_tx.send(Some(Arc::new(observations.annotated)));
                            token.cancel();
                            break;
                        }

                        if let Some(player) = player {
                            let action = decision.decide(&observations.detections, player, now);
                            actuator.apply_movement(action.move_x, action.move_y);
                            actuator.apply_fire(action.fire_target);
                        }

                        if upgrade && decision.should_upgrade(now) {
                            actuator.trigger_upgrade();
                        }

                        let _ = display_tx.send(Some(Arc::new(observations.annotated)));
                    }
                }
            }
            tracing::info!("process stage stopped");
        })
    }

    /// Display stage: present annotated frames and poll for the stop key.
    fn start_display(
        mut sink: Box<dyn FrameSink>,
        mut display_rx: watch::Receiver<Option<Arc<RgbImage>>>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            while !token.is_cancelled() {
                match display_rx.has_changed() {
                    Ok(true) => {
                        let frame = display_rx.borrow_and_update().clone();
                        if let Some(frame) = frame {
                            if let Err(error) = sink.present(&frame) {
                                tracing::error!(%error, "display backend failed, display stage exiting");
                                break;
                            }
                        }
                    }
                    Ok(false) => std::thread::sleep(Duration::from_millis(1)),
                    Err(_) => {
                        tracing::info!("process stage is gone, display stage exiting");
                        break;
                    }
                }
                if sink.stop_requested() {
                    tracing::info!("stop requested from the display");
                    token.cancel();
                    break;
                }
            }
            tracing::info!("display stage stopped");
        })
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Wait for all three stages to exit.
    pub async fn wait(self) {
        let _ = tokio::join!(self.acquire_task, self.process_task, self.display_task);
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    capture: Option<Box<dyn CaptureSource>>,
    sink: Option<Box<dyn FrameSink>>,
    actuator: Option<Box<dyn Actuator>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            capture: None,
            sink: None,
            actuator: None,
        }
    }

    pub fn capture(mut self, capture: Box<dyn CaptureSource>) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn sink(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn actuator(mut self, actuator: Box<dyn Actuator>) -> Self {
        self.actuator = Some(actuator);
        self
    }

    pub fn build(self) -> Result<Coordinator, AppError> {
        self.configuration
            .validate()
            .map_err(AppError::Config)?;
        let capture = self
            .capture
            .ok_or_else(|| AppError::Pipeline("capture source not set".to_string()))?;
        let sink = self
            .sink
            .ok_or_else(|| AppError::Pipeline("frame sink not set".to_string()))?;
        let actuator = self
            .actuator
            .ok_or_else(|| AppError::Pipeline("actuator not set".to_string()))?;
        Ok(Coordinator::start(
            self.configuration,
            capture,
            sink,
            actuator,
        ))
    }
}
