use std::pin::Pin;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior, Sleep};

use crate::{
    error::{AppError, AppResult},
    services::carousel::{
        AutoplayConditions, Carousel, Correction, Direction, Motion, Step, AUTOPLAY_INTERVAL,
        TRANSITION_DURATION,
    },
};

/// Inputs from the view layer
#[derive(Debug, Clone)]
pub enum CarouselCommand<T> {
    Advance(Direction),
    SetActive(usize),
    SetItems(Vec<T>),
    SetPaused(bool),
    SetHovering(bool),
    SetVisibility { is_intersecting: bool, ratio: f64 },
    SetDocumentVisible(bool),
}

/// Published carousel state
#[derive(Debug, Clone, PartialEq)]
pub struct CarouselSnapshot<T> {
    pub position: usize,
    pub motion: Motion,
    pub active_index: Option<usize>,
    pub active_item: Option<T>,
    pub autoplay: bool,
}

/// Handle to a running carousel task
///
/// The task exclusively owns the carousel state, the autoplay interval and the
/// pending wrap correction. Every input is a message; every output is a new
/// snapshot on the watch channel.
pub struct CarouselHandle<T> {
    command_tx: mpsc::UnboundedSender<CarouselCommand<T>>,
    snapshot_rx: watch::Receiver<CarouselSnapshot<T>>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl<T> CarouselHandle<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Spawns the carousel task over `items`.
    ///
    /// Starts at the first real slide without animation and evaluates
    /// autoplay once with default conditions.
    pub fn spawn(items: Vec<T>) -> Self {
        let carousel = Carousel::new(items);
        let initial = CarouselTask::snapshot_of(&carousel, Motion::Instant, false);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            CarouselTask {
                carousel,
                conditions: AutoplayConditions::default(),
                autoplay: None,
                correction: None,
                last_motion: Motion::Instant,
                snapshot_tx,
            }
            .run(command_rx, shutdown_rx)
            .await;
        });

        Self {
            command_tx,
            snapshot_rx,
            shutdown_tx,
            task,
        }
    }

    pub fn send(&self, command: CarouselCommand<T>) -> AppResult<()> {
        self.command_tx
            .send(command)
            .map_err(|_| AppError::Internal("Carousel task has stopped".to_string()))
    }

    pub fn next(&self) -> AppResult<()> {
        self.send(CarouselCommand::Advance(Direction::Next))
    }

    pub fn previous(&self) -> AppResult<()> {
        self.send(CarouselCommand::Advance(Direction::Previous))
    }

    pub fn snapshot(&self) -> CarouselSnapshot<T> {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver for snapshot changes, including active-item changes.
    pub fn subscribe(&self) -> watch::Receiver<CarouselSnapshot<T>> {
        self.snapshot_rx.clone()
    }

    /// Stops the timer and ends the task.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Carousel task join error");
        }
    }
}

type PendingCorrection = (Correction, Pin<Box<Sleep>>);

struct CarouselTask<T> {
    carousel: Carousel<T>,
    conditions: AutoplayConditions,
    autoplay: Option<Interval>,
    correction: Option<PendingCorrection>,
    last_motion: Motion,
    snapshot_tx: watch::Sender<CarouselSnapshot<T>>,
}

impl<T> CarouselTask<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    async fn run(
        mut self,
        mut command_rx: mpsc::UnboundedReceiver<CarouselCommand<T>>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        self.recompute_autoplay();
        self.publish();

        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = Self::tick(&mut self.autoplay) => {
                    tracing::trace!("Carousel autoplay tick");
                    let step = self.carousel.advance(Direction::Next);
                    self.apply(step);
                }
                correction = Self::settle(&mut self.correction) => {
                    let step = self.carousel.apply_correction(correction);
                    self.apply(step);
                }
                _ = shutdown_rx.recv() => break,
            }
        }

        self.autoplay = None;
        tracing::debug!("Carousel task stopped");
    }

    async fn tick(autoplay: &mut Option<Interval>) {
        match autoplay {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }

    async fn settle(pending: &mut Option<PendingCorrection>) -> Correction {
        match pending {
            Some((_, delay)) => {
                delay.as_mut().await;
                match pending.take() {
                    Some((correction, _)) => correction,
                    None => std::future::pending().await,
                }
            }
            None => std::future::pending().await,
        }
    }

    fn handle(&mut self, command: CarouselCommand<T>) {
        match command {
            CarouselCommand::Advance(direction) => {
                let step = self.carousel.advance(direction);
                self.apply(step);
            }
            CarouselCommand::SetActive(index) => {
                let step = self.carousel.set_active(index);
                self.apply(step);
            }
            CarouselCommand::SetItems(items) => {
                if self.carousel.items() == items.as_slice() {
                    return;
                }
                let step = self.carousel.set_items(items);
                self.correction = None;
                self.apply(Some(step));
                // the timer restarts from a full interval for the new slides
                self.autoplay = None;
                self.recompute_autoplay();
                self.publish();
            }
            CarouselCommand::SetPaused(paused) => {
                self.conditions.paused = paused;
                self.recompute_autoplay();
            }
            CarouselCommand::SetHovering(hovering) => {
                self.conditions.hovering = hovering;
                self.recompute_autoplay();
            }
            CarouselCommand::SetVisibility {
                is_intersecting,
                ratio,
            } => {
                self.conditions.observe_intersection(is_intersecting, ratio);
                self.recompute_autoplay();
            }
            CarouselCommand::SetDocumentVisible(visible) => {
                self.conditions.document_visible = visible;
                self.recompute_autoplay();
            }
        }
    }

    /// The single place the autoplay timer is started or stopped.
    fn recompute_autoplay(&mut self) {
        let should_run = self.conditions.should_run();
        match (should_run, self.autoplay.is_some()) {
            (true, false) => {
                let mut interval =
                    interval_at(Instant::now() + AUTOPLAY_INTERVAL, AUTOPLAY_INTERVAL);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.autoplay = Some(interval);
                tracing::debug!("Carousel autoplay started");
                self.publish();
            }
            (false, true) => {
                self.autoplay = None;
                tracing::debug!(conditions = ?self.conditions, "Carousel autoplay stopped");
                self.publish();
            }
            _ => {}
        }
    }

    fn apply(&mut self, step: Option<Step>) {
        let Some(step) = step else {
            return;
        };
        self.last_motion = step.motion;
        // a newer step always supersedes an older scheduled correction
        self.correction = step
            .correction
            .map(|correction| (correction, Box::pin(sleep(TRANSITION_DURATION))));
        self.publish();
    }

    fn snapshot_of(carousel: &Carousel<T>, motion: Motion, autoplay: bool) -> CarouselSnapshot<T> {
        CarouselSnapshot {
            position: carousel.position(),
            motion,
            active_index: carousel.active_index(),
            active_item: carousel.active_item().cloned(),
            autoplay,
        }
    }

    fn publish(&self) {
        let snapshot = Self::snapshot_of(&self.carousel, self.last_motion, self.autoplay.is_some());
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
