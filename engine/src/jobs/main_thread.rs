use crossbeam::queue::SegQueue;

const PRIORITY_COUNT: usize = 4;

/// Callback priorities, highest first.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallbackPriority {
    SyncChunkBuild,
    UploadMesh,
    DeleteMesh,
    Common,
}

impl CallbackPriority {
    pub const ALL: [CallbackPriority; PRIORITY_COUNT] = [
        CallbackPriority::SyncChunkBuild,
        CallbackPriority::UploadMesh,
        CallbackPriority::DeleteMesh,
        CallbackPriority::Common,
    ];

    fn index(self) -> usize {
        match self {
            CallbackPriority::SyncChunkBuild => 0,
            CallbackPriority::UploadMesh => 1,
            CallbackPriority::DeleteMesh => 2,
            CallbackPriority::Common => 3,
        }
    }
}

pub type MainThreadCallback<C> = Box<dyn FnOnce(&mut C) + Send>;

struct ScheduledCallback<C> {
    cost: f32,
    callback: MainThreadCallback<C>,
}

/// Hands work to the thread that owns `C` (usually the render context).
///
/// Any thread may schedule. `execute` runs queued callbacks in strict priority order,
/// FIFO within a priority, until the frame budget of 1.0 is used up.
pub struct MainThreadScheduler<C> {
    queues: [SegQueue<ScheduledCallback<C>>; PRIORITY_COUNT],
    #[cfg(debug_assertions)]
    owner: std::sync::OnceLock<std::thread::ThreadId>,
}

impl<C> Default for MainThreadScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> MainThreadScheduler<C> {
    pub fn new() -> Self {
        MainThreadScheduler {
            queues: [
                SegQueue::new(),
                SegQueue::new(),
                SegQueue::new(),
                SegQueue::new(),
            ],
            #[cfg(debug_assertions)]
            owner: std::sync::OnceLock::new(),
        }
    }

    /// Queues a callback. `cost` is clamped to [0, 1], NaN counts as free.
    pub fn schedule(
        &self,
        priority: CallbackPriority,
        cost: f32,
        callback: impl FnOnce(&mut C) + Send + 'static,
    ) {
        let cost = if cost.is_nan() {
            0.0
        } else {
            cost.clamp(0.0, 1.0)
        };

        self.queues[priority.index()].push(ScheduledCallback {
            cost,
            callback: Box::new(callback),
        });
    }

    /// Runs callbacks until the accumulated cost reaches 1.0 or every queue is empty.
    /// Returns the number of callbacks that ran.
    #[profiling::function]
    pub fn execute(&self, context: &mut C) -> usize {
        #[cfg(debug_assertions)]
        {
            let current = std::thread::current().id();
            let owner = *self.owner.get_or_init(|| current);
            debug_assert_eq!(
                owner, current,
                "MainThreadScheduler::execute called from more than one thread"
            );
        }

        let mut budget_used = 0.0f32;
        let mut executed = 0usize;

        while budget_used < 1.0 {
            let Some(scheduled) = self.pop() else {
                break;
            };

            (scheduled.callback)(context);
            budget_used += scheduled.cost;
            executed += 1;
        }

        executed
    }

    pub fn pending(&self) -> usize {
        self.queues.iter().map(SegQueue::len).sum()
    }

    pub fn pending_for(&self, priority: CallbackPriority) -> usize {
        self.queues[priority.index()].len()
    }

    /// Drops every queued callback without running it and returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut removed = 0usize;

        for queue in self.queues.iter() {
            while let Some(_callback) = queue.pop() {
                removed += 1;
            }
        }

        removed
    }

    fn pop(&self) -> Option<ScheduledCallback<C>> {
        self.queues.iter().find_map(SegQueue::pop)
    }
}
