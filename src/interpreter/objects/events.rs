//! Pending timed events
//!
//! The queue is kept sorted so that the next event to fire sits at the end
//! of the vector: popping the due entry is O(1) and insertion bubbles the
//! new entry down from the end.
use crate::interpreter::core::instruction::Aword;
use log::debug;

/// A scheduled occurrence of an event block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub event: Aword,
    /// Location (or entity whose location) the event runs at
    pub target: Aword,
    /// Absolute tick the event fires on
    pub time: Aword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQueue {
    entries: Vec<ScheduledEvent>,
    capacity: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        EventQueue {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schedule `event` at absolute `time`, replacing any pending entry for it.
    /// Entries due at the same time fire in the order they were scheduled.
    pub fn schedule(&mut self, event: Aword, target: Aword, time: Aword) -> Result<(), String> {
        self.cancel(event);
        if self.entries.len() >= self.capacity {
            return Err(format!(
                "Event queue overflow: more than {} pending events",
                self.capacity
            ));
        }
        let mut i = self.entries.len();
        while i > 0 && self.entries[i - 1].time <= time {
            i -= 1;
        }
        debug!("schedule event {event} at time {time} (slot {i})");
        self.entries.insert(
            i,
            ScheduledEvent {
                event,
                target,
                time,
            },
        );
        Ok(())
    }

    /// Remove the pending entry for `event`, if any
    pub fn cancel(&mut self, event: Aword) {
        if let Some(pos) = self.entries.iter().position(|e| e.event == event) {
            debug!("cancel event {event}");
            self.entries.remove(pos);
        }
    }

    /// Pop the next entry if it is due exactly at `tick`
    pub fn pop_due(&mut self, tick: Aword) -> Option<ScheduledEvent> {
        match self.entries.last() {
            Some(e) if e.time == tick => self.entries.pop(),
            _ => None,
        }
    }

    /// Entries in stored order (latest first, next due last)
    pub fn entries(&self) -> &[ScheduledEvent] {
        &self.entries
    }

    /// Replace the queue contents with previously saved entries
    pub fn replace(&mut self, entries: Vec<ScheduledEvent>) -> Result<(), String> {
        if entries.len() > self.capacity {
            return Err(format!(
                "{} saved events exceed the queue capacity of {}",
                entries.len(),
                self.capacity
            ));
        }
        self.entries = entries;
        Ok(())
    }
}
