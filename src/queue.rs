// src/queue.rs

//! Outbound payload queue.
//!
//! Ordered, in-memory sequence of not-yet-attempted payloads. Insertion
//! order is delivery order. A payload is removed from the head exactly once,
//! immediately before its transmit attempt begins; removal does not depend
//! on whether the attempt succeeds.

use std::collections::VecDeque;

use bytes::Bytes;

/// FIFO queue of pre-serialized sample payloads.
#[derive(Debug, Default)]
pub(crate) struct OutboundQueue {
    payloads: VecDeque<Bytes>,
}

impl OutboundQueue {
    pub(crate) fn new() -> Self {
        Self {
            payloads: VecDeque::new(),
        }
    }

    /// Append a payload at the tail.
    pub(crate) fn push_back(&mut self, payload: Bytes) {
        self.payloads.push_back(payload);
    }

    /// Remove and return the head payload, if any.
    pub(crate) fn pop_front(&mut self) -> Option<Bytes> {
        self.payloads.pop_front()
    }

    /// Drop all queued payloads.
    pub(crate) fn clear(&mut self) {
        self.payloads.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.payloads.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        // ---
        let mut queue = OutboundQueue::new();

        queue.push_back(Bytes::from_static(b"one"));
        queue.push_back(Bytes::from_static(b"two"));
        queue.push_back(Bytes::from_static(b"three"));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop_front(), Some(Bytes::from_static(b"one")));
        assert_eq!(queue.pop_front(), Some(Bytes::from_static(b"two")));
        assert_eq!(queue.pop_front(), Some(Bytes::from_static(b"three")));
        assert_eq!(queue.pop_front(), None);
    }

    #[test]
    fn clear_abandons_everything() {
        // ---
        let mut queue = OutboundQueue::new();

        queue.push_back(Bytes::from_static(b"pending"));
        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.pop_front(), None);
    }
}
