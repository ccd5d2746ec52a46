use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::jobs::cancellation::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    /// Dispatched to the worker pool, but not yet executing
    WaitingToRun,
    Running,
}

struct TaskSlot {
    state: TaskState,
    // Bumped on every start, so a superseded run can't touch the state of its successor
    generation: u64,
    token: CancellationToken,
}

type Work<A> = dyn Fn(&CancellationToken, A) + Send + Sync;

/// Limits a unit of work to at most one live instance at any time.
///
/// All state transitions and token (re)issues happen under a single lock, so two
/// callers can never both believe they own the slot. The work itself runs on the
/// global rayon pool and must poll its token at safe points.
pub struct RecurringTask<A: Send + 'static> {
    name: &'static str,
    work: Arc<Work<A>>,
    slot: Arc<Mutex<TaskSlot>>,
}

impl<A: Send + 'static> RecurringTask<A> {
    pub fn new(
        name: &'static str,
        work: impl Fn(&CancellationToken, A) + Send + Sync + 'static,
    ) -> Self {
        RecurringTask {
            name,
            work: Arc::new(work),
            slot: Arc::new(Mutex::new(TaskSlot {
                state: TaskState::Idle,
                generation: 0,
                token: CancellationToken::new(),
            })),
        }
    }

    pub fn state(&self) -> TaskState {
        lock_slot(&self.slot).state
    }

    /// Cancels the previous instance (if any) and unconditionally starts a new one.
    pub fn start_cancel_previous(&self, arg: A) {
        let (generation, token) = {
            let mut slot = lock_slot(&self.slot);
            if slot.state != TaskState::Idle {
                log::trace!("{}: superseding previous run", self.name);
            }
            // Also cancels a finished run, so anything it queued for later is dropped
            slot.token.cancel();
            Self::issue(&mut slot)
        };

        self.dispatch(generation, token, arg);
    }

    /// Starts a new instance only if nothing is waiting or running.
    /// Returns false if the start was skipped.
    pub fn start_if_previous_completed(&self, arg: A) -> bool {
        let (generation, token) = {
            let mut slot = lock_slot(&self.slot);
            if slot.state != TaskState::Idle {
                return false;
            }
            Self::issue(&mut slot)
        };

        self.dispatch(generation, token, arg);
        true
    }

    /// Signals cancellation and forces the slot back to idle, even if the running
    /// work hasn't observed its token yet.
    pub fn cancel_running(&self) {
        let mut slot = lock_slot(&self.slot);
        slot.token.cancel();
        slot.state = TaskState::Idle;
    }

    fn issue(slot: &mut TaskSlot) -> (u64, CancellationToken) {
        slot.generation = slot.generation.wrapping_add(1);
        slot.token = CancellationToken::new();
        slot.state = TaskState::WaitingToRun;
        (slot.generation, slot.token.clone())
    }

    fn dispatch(&self, generation: u64, token: CancellationToken, arg: A) {
        let slot = self.slot.clone();
        let work = self.work.clone();
        let name = self.name;

        rayon::spawn(move || {
            {
                let mut slot = lock_slot(&slot);
                if slot.generation != generation || token.is_cancelled() {
                    log::trace!("{}: cancelled before it started", name);
                    return;
                }
                slot.state = TaskState::Running;
            }

            work(&token, arg);

            let mut slot = lock_slot(&slot);
            if slot.generation == generation {
                slot.state = TaskState::Idle;
            }
        });
    }
}

impl<A: Send + 'static> Drop for RecurringTask<A> {
    fn drop(&mut self) {
        self.cancel_running();
    }
}

fn lock_slot(slot: &Mutex<TaskSlot>) -> MutexGuard<'_, TaskSlot> {
    // The slot is only ever assigned whole values, a panic can't leave it half-updated
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };

    use crossbeam_channel::{Receiver, Sender};

    use super::*;
    use crate::testing::{TIMEOUT, wait_until};

    enum Probe {
        Started(u32),
        ObservedCancel(u32),
        Finished(u32),
    }

    // Work that reports its progress and spins until cancelled or released
    fn probe_task(events: Sender<Probe>, release: Receiver<()>) -> RecurringTask<u32> {
        RecurringTask::new("probe", move |token, id| {
            events.send(Probe::Started(id)).unwrap();
            loop {
                if token.is_cancelled() {
                    events.send(Probe::ObservedCancel(id)).unwrap();
                    return;
                }
                if release.try_recv().is_ok() {
                    events.send(Probe::Finished(id)).unwrap();
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }
        })
    }

    #[test]
    fn test_start_if_previous_completed_skips_while_running() {
        let (event_sender, events) = crossbeam_channel::unbounded();
        let (release_sender, release) = crossbeam_channel::unbounded();
        let task = probe_task(event_sender, release);

        assert!(task.start_if_previous_completed(1));
        assert!(matches!(events.recv_timeout(TIMEOUT), Ok(Probe::Started(1))));
        assert_eq!(task.state(), TaskState::Running);

        assert!(
            !task.start_if_previous_completed(2),
            "A second start must be skipped while the first one runs"
        );

        release_sender.send(()).unwrap();
        assert!(matches!(events.recv_timeout(TIMEOUT), Ok(Probe::Finished(1))));
        assert!(wait_until(|| task.state() == TaskState::Idle));

        assert!(task.start_if_previous_completed(3));
        assert!(matches!(events.recv_timeout(TIMEOUT), Ok(Probe::Started(3))));
        release_sender.send(()).unwrap();
    }

    #[test]
    fn test_start_cancel_previous_supersedes_running_instance() {
        let (event_sender, events) = crossbeam_channel::unbounded();
        let (release_sender, release) = crossbeam_channel::unbounded();
        let task = probe_task(event_sender, release);

        task.start_cancel_previous(1);
        assert!(matches!(events.recv_timeout(TIMEOUT), Ok(Probe::Started(1))));

        task.start_cancel_previous(2);

        let mut observed_cancel = false;
        let mut second_started = false;
        while !(observed_cancel && second_started) {
            match events.recv_timeout(TIMEOUT) {
                Ok(Probe::ObservedCancel(1)) => observed_cancel = true,
                Ok(Probe::Started(2)) => second_started = true,
                Ok(_) => panic!("Unexpected probe event"),
                Err(_) => panic!("Timed out waiting for the restart"),
            }
        }

        release_sender.send(()).unwrap();
        assert!(matches!(events.recv_timeout(TIMEOUT), Ok(Probe::Finished(2))));
        assert!(wait_until(|| task.state() == TaskState::Idle));
    }

    #[test]
    fn test_cancel_running_forces_idle_immediately() {
        let (event_sender, events) = crossbeam_channel::unbounded();
        let (_release_sender, release) = crossbeam_channel::unbounded();
        let task = probe_task(event_sender, release);

        task.start_cancel_previous(1);
        assert!(matches!(events.recv_timeout(TIMEOUT), Ok(Probe::Started(1))));

        task.cancel_running();
        // No waiting here: the state flips before the work notices anything
        assert_eq!(task.state(), TaskState::Idle);

        assert!(matches!(
            events.recv_timeout(TIMEOUT),
            Ok(Probe::ObservedCancel(1))
        ));

        // The old run finishing must not disturb a newer one
        assert!(task.start_if_previous_completed(2));
        assert!(matches!(events.recv_timeout(TIMEOUT), Ok(Probe::Started(2))));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(task.state(), TaskState::Running);
        task.cancel_running();
    }

    #[test]
    fn test_concurrent_starts_never_overlap() {
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        let task = {
            let active = active.clone();
            let max_active = max_active.clone();
            let runs = runs.clone();
            Arc::new(RecurringTask::new("overlap", move |_token, _: ()| {
                let now_active = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now_active, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(2));
                active.fetch_sub(1, Ordering::SeqCst);
                runs.fetch_add(1, Ordering::SeqCst);
            }))
        };

        let callers = (0..8)
            .map(|_| {
                let task = task.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        task.start_if_previous_completed(());
                        thread::sleep(Duration::from_micros(200));
                    }
                })
            })
            .collect::<Vec<_>>();

        for caller in callers {
            caller.join().unwrap();
        }

        assert!(wait_until(|| task.state() == TaskState::Idle));
        assert!(runs.load(Ordering::SeqCst) > 0);
        assert_eq!(
            max_active.load(Ordering::SeqCst),
            1,
            "Two instances of the same task ran at once"
        );
    }
}
