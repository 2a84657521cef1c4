use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::select;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::api::CurtainState;
use crate::config::SimConfig;
use crate::curtain::{self, Completer, Completion, Curtain};
use crate::delivery::{self, exited, Publisher, Relay, Subscription};
use crate::{limit, motion};

const MIN_TICK: Duration = Duration::from_millis(1);

/// In-process curtain that moves one unit per tick.
///
/// Handles are cheap to clone and share one device. The worker keeps
/// running until [`shutdown`](Curtain::shutdown) is called, even when every
/// handle has been dropped.
#[derive(Clone)]
pub struct SimulatedCurtain {
    inner: Arc<Inner>,
}

struct Inner {
    config: SimConfig,
    device: Mutex<Device>,
    exit: watch::Sender<bool>,
    completion: Completion,
    position: Subscription<i32>,
    state: Subscription<CurtainState>,
}

struct Relays {
    position: Relay<i32>,
    state: Relay<CurtainState>,
}

struct Device {
    current: i32,
    target: i32,
    movement: CurtainState,
    shutdown: bool,
    // Present until the worker starts or the device shuts down unstarted.
    relays: Option<Relays>,
    position_tx: Option<Publisher<i32>>,
    state_tx: Option<Publisher<CurtainState>>,
    completer: Option<Completer>,
}

impl SimulatedCurtain {
    pub fn new(config: SimConfig) -> Self {
        let (position_tx, position_relay, position) =
            delivery::channel("position", config.backlog);
        let (state_tx, state_relay, state) = delivery::channel("state", config.backlog);
        let (completer, completion) = curtain::completion();
        let (exit, _) = watch::channel(false);

        let at = config.travel.limit(config.initial_position);
        let device = Device {
            current: at,
            target: at,
            movement: CurtainState::Stopped,
            shutdown: false,
            relays: Some(Relays {
                position: position_relay,
                state: state_relay,
            }),
            position_tx: Some(position_tx),
            state_tx: Some(state_tx),
            completer: Some(completer),
        };

        Self {
            inner: Arc::new(Inner {
                config,
                device: Mutex::new(device),
                exit,
                completion,
                position,
                state,
            }),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.inner.config
    }
}

impl Default for SimulatedCurtain {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Curtain for SimulatedCurtain {
    /// # Panics
    /// The first call spawns the worker, so it must happen inside a Tokio
    /// runtime.
    fn init(&self) -> Completion {
        let mut device = self.inner.device();
        if let Some(relays) = device.relays.take() {
            let exit = self.inner.exit.subscribe();
            tokio::spawn(relays.position.run(exit.clone()));
            tokio::spawn(relays.state.run(exit.clone()));
            tokio::spawn(run_worker(self.inner.clone(), exit));
            debug!(tick = ?self.inner.config.tick, position = device.current, "curtain worker started");
        }
        self.inner.completion.clone()
    }

    fn set_target_position(&self, position: i32) {
        let target = self.inner.config.travel.limit(position);
        if !limit::is_within(position) {
            debug!(requested = position, target, "target outside range of travel");
        }

        let mut device = self.inner.device();
        if device.shutdown {
            return;
        }
        device.target = target;
        debug!(
            target,
            current = device.current,
            steps = motion::steps_needed(device.current, target),
            "target position set"
        );
    }

    fn query(&self) {
        let device = self.inner.device();
        device.inform_state(device.movement);
        device.inform_position(device.current);
    }

    fn position(&self) -> Subscription<i32> {
        self.inner.position.clone()
    }

    fn state(&self) -> Subscription<CurtainState> {
        self.inner.state.clone()
    }

    fn shutdown(&self) {
        {
            let mut device = self.inner.device();
            if device.relays.is_some() {
                // never started, no worker to hand this to
                device.terminate();
            }
        }
        self.inner.exit.send_replace(true);
    }
}

impl Inner {
    fn device(&self) -> MutexGuard<'_, Device> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tick(&self) {
        self.device().tick();
    }

    fn terminate(&self) {
        self.device().terminate();
    }
}

async fn run_worker(inner: Arc<Inner>, mut exit: watch::Receiver<bool>) {
    let period = inner.config.tick.max(MIN_TICK);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        select! {
            _ = ticker.tick() => inner.tick(),
            _ = exited(&mut exit) => break,
        }
    }

    drop(ticker);
    inner.terminate();
}

impl Device {
    fn tick(&mut self) {
        if self.shutdown {
            return;
        }
        let next = motion::step(self.current, self.target);
        self.update_state(next.state);
        self.update_position(next.position);
    }

    fn update_state(&mut self, v: CurtainState) {
        if self.movement == v {
            return;
        }
        debug!(from = %self.movement, to = %v, position = self.current, "movement changed");
        self.movement = v;
        self.inform_state(v);
    }

    fn update_position(&mut self, v: i32) {
        if self.current == v {
            return;
        }
        trace!(position = v, target = self.target, "tick");
        self.current = v;
        self.inform_position(v);
    }

    fn inform_state(&self, v: CurtainState) {
        if let Some(tx) = &self.state_tx {
            tx.publish(v);
        }
    }

    fn inform_position(&self, v: i32) {
        if let Some(tx) = &self.position_tx {
            tx.publish(v);
        }
    }

    /// Closes both subscriptions and resolves the completion as graceful.
    fn terminate(&mut self) {
        if self.shutdown {
            return;
        }
        self.shutdown = true;
        self.relays = None;
        self.position_tx = None;
        self.state_tx = None;
        if let Some(completer) = self.completer.take() {
            completer.finish();
        }
        info!(position = self.current, target = self.target, "curtain shut down");
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_pending, assert_ready_eq, task};

    use super::*;
    use crate::limit::Travel;

    fn fast() -> SimConfig {
        SimConfig::default().with_tick(Duration::from_millis(1))
    }

    #[test]
    fn starts_dormant_at_initial_position() {
        let curtain = SimulatedCurtain::new(fast().with_initial_position(30));
        let device = curtain.inner.device();
        assert_eq!(device.current, 30);
        assert_eq!(device.target, 30);
        assert_eq!(device.movement, CurtainState::Stopped);
        assert!(device.relays.is_some());
    }

    #[test]
    fn initial_position_is_limited() {
        let curtain = SimulatedCurtain::new(fast().with_initial_position(250));
        assert_eq!(curtain.inner.device().current, 100);
    }

    #[test]
    fn target_is_clamped_by_default() {
        let curtain = SimulatedCurtain::new(fast());
        curtain.set_target_position(-40);
        assert_eq!(curtain.inner.device().target, 0);
        curtain.set_target_position(400);
        assert_eq!(curtain.inner.device().target, 100);
    }

    #[test]
    fn unbounded_travel_keeps_target() {
        let curtain = SimulatedCurtain::new(fast().with_travel(Travel::Unbounded));
        curtain.set_target_position(400);
        assert_eq!(curtain.inner.device().target, 400);
    }

    #[test]
    fn tick_moves_one_unit_and_suppresses_repeats() {
        let curtain = SimulatedCurtain::new(fast());
        curtain.set_target_position(2);

        for _ in 0..5 {
            curtain.inner.tick();
        }
        let device = curtain.inner.device();
        assert_eq!(device.current, 2);
        assert_eq!(device.movement, CurtainState::Stopped);
    }

    #[test]
    fn shutdown_before_init_completes_inline() {
        let curtain = SimulatedCurtain::new(fast());
        curtain.shutdown();

        let mut done = task::spawn(curtain.inner.completion.clone());
        assert_ready_eq!(done.poll(), Ok(()));
        assert!(curtain.inner.device().shutdown);

        // no runtime here: a terminated curtain must not try to spawn
        let again = curtain.init();
        assert_eq!(again.peek(), Some(Ok(())));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_pending_while_running() {
        let curtain = SimulatedCurtain::new(fast());
        let mut done = task::spawn(curtain.init());
        time::sleep(Duration::from_millis(20)).await;
        assert_pending!(done.poll());

        curtain.shutdown();
        assert_eq!(done.await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn commands_after_shutdown_are_ignored() {
        let curtain = SimulatedCurtain::new(fast());
        let done = curtain.init();
        curtain.shutdown();
        done.await.unwrap();

        curtain.set_target_position(80);
        curtain.query();
        curtain.inner.tick();

        let device = curtain.inner.device();
        assert_eq!(device.target, 0);
        assert_eq!(device.current, 0);
    }
}
