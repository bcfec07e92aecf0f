//! Fire-and-forget task seam.

use std::cell::RefCell;

use futures::future::LocalBoxFuture;

/// Runs detached work on the current execution context.
///
/// The response path never awaits spawned work.
pub trait Spawner {
    /// Detach a task.
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

/// A spawner that holds tasks until drained.
///
/// Hosts without an executor of their own (the CLI, tests) use it to decide
/// when detached writes land.
#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

impl TaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Run every queued task to completion, including tasks queued meanwhile.
    /// Returns how many ran.
    pub async fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            let batch: Vec<_> = self.tasks.borrow_mut().drain(..).collect();
            if batch.is_empty() {
                return ran;
            }
            for task in batch {
                task.await;
                ran += 1;
            }
        }
    }
}

impl Spawner for TaskQueue {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[tokio::test]
    async fn test_tasks_wait_for_drain() {
        let queue = TaskQueue::new();
        let hits = Rc::new(Cell::new(0));

        for _ in 0..2 {
            let hits = hits.clone();
            queue.spawn_local(Box::pin(async move { hits.set(hits.get() + 1) }));
        }
        assert_eq!(queue.pending(), 2);
        assert_eq!(hits.get(), 0);

        assert_eq!(queue.drain().await, 2);
        assert_eq!(hits.get(), 2);
        assert_eq!(queue.pending(), 0);
    }
}
