// primus/src/semaphore.rs
//
//! A counting semaphore.
//!
//! The frame pipeline is strictly turn-taking (application → readback →
//! display → application), so a pair of counting semaphores per worker is
//! all the synchronization it needs. Built on a mutex and condvar; the
//! state machine is identical to a POSIX semaphore initialized to zero.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

pub struct Semaphore {
    count: Mutex<u32>,
    condvar: Condvar,
}

impl Semaphore {
    pub fn new() -> Semaphore {
        Semaphore {
            count: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }

    pub fn post(&self) {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        self.condvar.notify_one();
    }

    pub fn wait(&self) {
        let mut count = self.count.lock().unwrap();
        while *count == 0 {
            count = self.condvar.wait(count).unwrap();
        }
        *count -= 1;
    }

    /// Waits up to `timeout`; returns false if no token arrived in time.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock().unwrap();
        while *count == 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self.condvar.wait_timeout(count, deadline - now).unwrap();
            count = guard;
        }
        *count -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::Semaphore;

    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn tokens_accumulate() {
        let sem = Semaphore::new();
        sem.post();
        sem.post();
        sem.wait();
        sem.wait();
        assert!(!sem.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn timed_wait_expires() {
        let sem = Semaphore::new();
        let start = Instant::now();
        assert!(!sem.wait_timeout(Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn timed_wait_sees_late_post() {
        let sem = Arc::new(Semaphore::new());
        let poster = Arc::clone(&sem);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            poster.post();
        });
        assert!(sem.wait_timeout(Duration::from_secs(5)));
        handle.join().unwrap();
    }

    #[test]
    fn wait_blocks_until_post() {
        let sem = Arc::new(Semaphore::new());
        let waiter = Arc::clone(&sem);
        let handle = thread::spawn(move || {
            waiter.wait();
            true
        });
        sem.post();
        assert!(handle.join().unwrap());
    }
}
