//! Background scheduler loops.
//!
//! Each loop runs one use case per period and exits once the shutdown flag
//! flips to `true` (or its sender is dropped).

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::usecase::{CleanupRoomsUseCase, TickRoomTimersUseCase};

pub fn spawn_timer_loop(
    usecase: Arc<TickRoomTimersUseCase>,
    period: Duration,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run_every("room timer", period, shutdown, move || {
        usecase.execute();
    }))
}

pub fn spawn_cleanup_loop(
    usecase: Arc<CleanupRoomsUseCase>,
    period: Duration,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run_every("room cleanup", period, shutdown, move || {
        usecase.execute();
    }))
}

async fn run_every<F>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut job: F,
) where
    F: FnMut() + Send,
{
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::debug!("Scheduler '{}' started (every {:?})", name, period);

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        tokio::select! {
            _ = interval.tick() => job(),
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("Scheduler '{}' stopped", name);
}
