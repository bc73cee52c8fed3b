// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame handoff between the thread producing snapshots and the one painting them.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::entities::ScreenEntities;

#[derive(Debug, Default)]
struct Slots {
    pending: Option<Arc<ScreenEntities>>,
    live: Arc<ScreenEntities>,
}

/// Two-slot snapshot buffer.
///
/// The producer [`publish`](Self::publish)es complete snapshots into the
/// pending slot, overwriting any not yet picked up. The painter calls
/// [`take_latest`](Self::take_latest) at the start of each frame, which moves
/// the pending snapshot (if any) into the live slot and returns the live one.
/// Neither side ever sees a partially built snapshot, and the lock is only
/// held for a pointer swap.
#[derive(Debug, Default)]
pub struct SnapshotExchange {
    slots: Mutex<Slots>,
}

impl SnapshotExchange {
    /// Create an exchange whose live slot holds an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `snapshot` for the next frame.
    pub fn publish(&self, snapshot: Arc<ScreenEntities>) {
        self.slots.lock().pending = Some(snapshot);
    }

    /// Promote the pending snapshot, if any, and return the live one.
    pub fn take_latest(&self) -> Arc<ScreenEntities> {
        let mut slots = self.slots.lock();
        if let Some(pending) = slots.pending.take() {
            slots.live = pending;
        }
        slots.live.clone()
    }

    /// Returns true if a snapshot was published since the last [`take_latest`](Self::take_latest).
    pub fn has_pending(&self) -> bool {
        self.slots.lock().pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use kurbo::{Rect, Vec2};

    use super::*;
    use crate::transform::ScreenTransform;

    fn snapshot(width: u32) -> Arc<ScreenEntities> {
        let t = ScreenTransform::new(Rect::new(0.0, 0.0, 1.0, 1.0), width, 10);
        Arc::new(ScreenEntities::with_transform(t, Vec2::ZERO))
    }

    #[test]
    fn latest_publish_wins() {
        let ex = SnapshotExchange::new();
        assert!(!ex.has_pending());
        assert!(ex.take_latest().is_empty());
        ex.publish(snapshot(10));
        ex.publish(snapshot(20));
        assert!(ex.has_pending());
        assert_eq!(ex.take_latest().transform().width(), 20);
        assert!(!ex.has_pending());
        // Live slot is kept until replaced.
        assert_eq!(ex.take_latest().transform().width(), 20);
    }

    #[test]
    fn painter_only_sees_complete_snapshots() {
        let ex = Arc::new(SnapshotExchange::new());
        ex.publish(snapshot(0));
        let producer = {
            let ex = ex.clone();
            thread::spawn(move || {
                for w in 1..=500 {
                    ex.publish(snapshot(w));
                }
            })
        };
        let mut last = 0;
        for _ in 0..500 {
            let w = ex.take_latest().transform().width();
            // Frames only move forward.
            assert!(w >= last);
            last = w;
        }
        producer.join().unwrap();
        assert_eq!(ex.take_latest().transform().width(), 500);
    }
}
