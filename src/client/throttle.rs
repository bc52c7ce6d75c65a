//! I define the [`Throttle`], which bounds the number of queries running at once
//! against one endpoint, and queues the others by priority.

use std::collections::VecDeque;

/// A dispatch waiting for capacity; running it starts the HTTP request.
pub(crate) type Job = Box<dyn FnOnce() + Send>;

struct Queued {
    priority: i32,
    job: Job,
}

/// Admission state of one endpoint.
///
/// Not synchronized by itself: the owning service keeps it behind a mutex,
/// and never runs a [`Job`] while holding that mutex.
#[derive(Default)]
pub(crate) struct Throttle {
    max_concurrent: usize,
    active: usize,
    pending: VecDeque<Queued>,
}

impl Throttle {
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn set_max_concurrent(&mut self, max: usize) {
        self.max_concurrent = max;
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn can_run(&self) -> bool {
        self.max_concurrent == 0 || self.active < self.max_concurrent
    }

    /// Either admit `job` (counting it as active, and handing it back to be run),
    /// or queue it behind every job of greater or equal priority.
    pub fn admit(&mut self, priority: i32, job: Job) -> Option<Job> {
        if self.can_run() {
            self.active += 1;
            Some(job)
        } else {
            let pos = self
                .pending
                .iter()
                .position(|q| q.priority < priority)
                .unwrap_or(self.pending.len());
            self.pending.insert(pos, Queued { priority, job });
            None
        }
    }

    /// Count one running job as finished.
    pub fn done(&mut self) {
        debug_assert!(self.active > 0);
        self.active = self.active.saturating_sub(1);
    }

    /// Pop every queued job that fits in the available capacity, counting them as active.
    pub fn next_admitted(&mut self) -> Vec<Job> {
        let mut ret = vec![];
        while self.can_run() {
            let Some(queued) = self.pending.pop_front() else {
                break;
            };
            self.active += 1;
            ret.push(queued.job);
        }
        ret
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Job {
        let log = log.clone();
        Box::new(move || log.lock().push(name))
    }

    fn run_all(jobs: Vec<Job>) {
        for job in jobs {
            job()
        }
    }

    #[test]
    fn unlimited_admits_everything() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut t = Throttle::default();
        for _ in 0..10 {
            assert!(t.admit(0, recording(&log, "x")).is_some());
        }
        assert_eq!(t.active(), 10);
        assert_eq!(t.pending(), 0);
    }

    #[test]
    fn limit_queues_the_rest() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut t = Throttle::default();
        t.set_max_concurrent(2);
        assert!(t.admit(0, recording(&log, "a")).is_some());
        assert!(t.admit(0, recording(&log, "b")).is_some());
        assert!(t.admit(0, recording(&log, "c")).is_none());
        assert!(t.admit(0, recording(&log, "d")).is_none());
        assert_eq!((t.active(), t.pending()), (2, 2));

        t.done();
        run_all(t.next_admitted());
        assert_eq!((t.active(), t.pending()), (2, 1));
        assert_eq!(*log.lock(), ["c"]);
    }

    #[test]
    fn priority_then_fifo() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut t = Throttle::default();
        t.set_max_concurrent(1);
        assert!(t.admit(0, recording(&log, "running")).is_some());
        assert!(t.admit(0, recording(&log, "zero-1")).is_none());
        assert!(t.admit(-1, recording(&log, "negative")).is_none());
        assert!(t.admit(5, recording(&log, "five-1")).is_none());
        assert!(t.admit(0, recording(&log, "zero-2")).is_none());
        assert!(t.admit(5, recording(&log, "five-2")).is_none());
        assert!(t.admit(2, recording(&log, "two")).is_none());

        while t.pending() > 0 {
            t.done();
            run_all(t.next_admitted());
        }
        assert_eq!(
            *log.lock(),
            ["five-1", "five-2", "two", "zero-1", "zero-2", "negative"]
        );
    }

    #[test]
    fn raising_the_limit_admits_several() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut t = Throttle::default();
        t.set_max_concurrent(1);
        assert!(t.admit(0, recording(&log, "a")).is_some());
        assert!(t.admit(0, recording(&log, "b")).is_none());
        assert!(t.admit(0, recording(&log, "c")).is_none());
        t.set_max_concurrent(3);
        run_all(t.next_admitted());
        assert_eq!((t.active(), t.pending()), (3, 0));
        assert_eq!(*log.lock(), ["b", "c"]);
    }
}
