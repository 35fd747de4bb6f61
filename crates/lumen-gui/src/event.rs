//! Bounded queue of raw input events
//!
//! Hosts push events whenever they arrive; the render driver drains the queue
//! exactly once per tick, before the tree is rebuilt, so one tick sees every
//! event accumulated since the previous one.

use std::collections::VecDeque;

use crate::error::QueueError;

/// Backend-agnostic mouse button representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Additional mouse buttons (back, forward, etc.)
    Other(u16),
}

impl MouseButton {
    /// Map a DOM-style button number (0 = left, 1 = middle, 2 = right)
    pub fn from_index(index: u16) -> Self {
        match index {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            other => Self::Other(other),
        }
    }
}

/// Raw input event as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Cursor moved to `(x, y)` in window coordinates
    MouseMove { x: f32, y: f32 },
    MouseDown { button: MouseButton },
    MouseUp { button: MouseButton },
}

/// What to drop when an event arrives at a full queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Keep the buffered events and discard the incoming one
    #[default]
    DropNewest,
    /// Evict the oldest buffered event to make room
    DropOldest,
}

/// Fixed-capacity FIFO of [`Event`]s
#[derive(Debug, Clone)]
pub struct EventQueue {
    events: VecDeque<Event>,
    capacity: usize,
    policy: OverflowPolicy,
    dropped: u64,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, OverflowPolicy::default())
    }

    pub fn with_policy(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            policy,
            dropped: 0,
        }
    }

    /// Buffer `event`.
    ///
    /// On overflow one event is dropped according to the queue's
    /// [`OverflowPolicy`] and `QueueError::Full` is returned; the queue itself
    /// stays usable.
    pub fn push(&mut self, event: Event) -> Result<(), QueueError> {
        if self.events.len() < self.capacity {
            self.events.push_back(event);
            return Ok(());
        }

        self.dropped += 1;
        match self.policy {
            OverflowPolicy::DropNewest => {
                log::warn!("event queue full, dropping {event:?}");
            }
            OverflowPolicy::DropOldest => {
                let evicted = self.events.pop_front();
                log::warn!("event queue full, dropping {evicted:?}");
                if self.capacity > 0 {
                    self.events.push_back(event);
                }
            }
        }
        Err(QueueError::Full {
            capacity: self.capacity,
        })
    }

    pub fn mouse_move(&mut self, x: f32, y: f32) -> Result<(), QueueError> {
        self.push(Event::MouseMove { x, y })
    }

    pub fn mouse_down(&mut self, button: MouseButton) -> Result<(), QueueError> {
        self.push(Event::MouseDown { button })
    }

    pub fn mouse_up(&mut self, button: MouseButton) -> Result<(), QueueError> {
        self.push(Event::MouseUp { button })
    }

    /// Remove and yield every buffered event in arrival order.
    pub fn drain(&mut self) -> std::collections::vec_deque::Drain<'_, Event> {
        self.events.drain(..)
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

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Number of events lost to overflow since creation
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(x: f32) -> Event {
        Event::MouseMove { x, y: 0.0 }
    }

    #[test]
    fn test_drain_in_arrival_order() {
        let mut queue = EventQueue::new(8);
        queue.mouse_move(1.0, 2.0).unwrap();
        queue.mouse_down(MouseButton::Left).unwrap();
        queue.mouse_up(MouseButton::Left).unwrap();

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(
            drained,
            vec![
                Event::MouseMove { x: 1.0, y: 2.0 },
                Event::MouseDown { button: MouseButton::Left },
                Event::MouseUp { button: MouseButton::Left },
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_overflow_drops_newest() {
        let mut queue = EventQueue::new(2);
        queue.push(mv(1.0)).unwrap();
        queue.push(mv(2.0)).unwrap();

        assert_eq!(queue.push(mv(3.0)), Err(QueueError::Full { capacity: 2 }));
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.drain().collect::<Vec<_>>(), vec![mv(1.0), mv(2.0)]);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut queue = EventQueue::with_policy(2, OverflowPolicy::DropOldest);
        queue.push(mv(1.0)).unwrap();
        queue.push(mv(2.0)).unwrap();

        assert!(queue.push(mv(3.0)).is_err());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.drain().collect::<Vec<_>>(), vec![mv(2.0), mv(3.0)]);
    }

    #[test]
    fn test_zero_capacity_never_buffers() {
        let mut queue = EventQueue::with_policy(0, OverflowPolicy::DropOldest);
        assert!(queue.push(mv(1.0)).is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_twice_is_noop() {
        let mut queue = EventQueue::new(4);
        queue.clear();
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 4);
    }

    #[test]
    fn test_button_index_mapping() {
        assert_eq!(MouseButton::from_index(0), MouseButton::Left);
        assert_eq!(MouseButton::from_index(1), MouseButton::Middle);
        assert_eq!(MouseButton::from_index(2), MouseButton::Right);
        assert_eq!(MouseButton::from_index(4), MouseButton::Other(4));
    }
}
