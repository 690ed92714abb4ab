use std::collections::VecDeque;

/// An event pinned to an absolute sample frame of the audio clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent<E> {
    pub frame: u64,
    pub event: E,
}

/// Sample-frame ordered event queue.
///
/// Events come out in frame order; events on the same frame come out in the
/// order they were enqueued. Capacity is fixed up front so the audio thread
/// never reallocates: a full queue rejects new events.
pub struct Scheduler<E> {
    events: VecDeque<ScheduledEvent<E>>,
    capacity: usize,
}

impl<E: Copy> Scheduler<E> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns false (and drops the event) when the queue is full.
    pub fn enqueue(&mut self, frame: u64, event: E) -> bool {
        if self.events.len() >= self.capacity {
            return false;
        }

        let idx = self.events.partition_point(|e| e.frame <= frame);
        self.events.insert(idx, ScheduledEvent { frame, event });
        true
    }

    /// Free slots left.
    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.events.len())
    }

    pub fn next_frame(&self) -> Option<u64> {
        self.events.front().map(|e| e.frame)
    }

    /// Pop the earliest event if it is due at or before `frame`.
    pub fn pop_due(&mut self, frame: u64) -> Option<ScheduledEvent<E>> {
        match self.events.front() {
            Some(e) if e.frame <= frame => self.events.pop_front(),
            _ => None,
        }
    }

    pub fn retain(&mut self, keep: impl FnMut(&ScheduledEvent<E>) -> bool) {
        self.events.retain(keep);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
