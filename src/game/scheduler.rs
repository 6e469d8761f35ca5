//! Cancellable delayed tasks on the game clock.
//!
//! Nothing fires on its own: the owner drains due tasks from its frame handler,
//! so the countdown and toast timers live on the same clock as movement.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct ScheduledTask<T> {
    id: TaskId,
    due_at: f64,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    tasks: Vec<ScheduledTask<T>>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            tasks: Vec::new(),
        }
    }

    pub fn schedule(&mut self, due_at: f64, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask { id, due_at, task });
        id
    }

    /// Returns false when the task already fired or was never scheduled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|entry| entry.id != id);
        self.tasks.len() != before
    }

    /// Removes and returns every task due at `now`, earliest first; ties keep
    /// scheduling order.
    pub fn drain_due(&mut self, now: f64) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|entry| entry.due_at <= now);
        self.tasks = pending;
        due.sort_by(|a, b| a.due_at.total_cmp(&b.due_at).then(a.id.0.cmp(&b.id.0)));
        due.into_iter().map(|entry| entry.task).collect()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
