//! Frame capabilities consumed by the target aggregation.
//!
//! Frames come from an external capture thread. The aggregation only needs
//! to know whether a frame carries data, which intrinsics its stream was
//! captured with, and how to turn it into target edge lengths. The detector
//! that does the latter is opaque and lives behind [`CalibFrame`].

use crate::{DetectionError, FocalLengths, RectSides};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// A captured frame carrying a view of the calibration target.
pub trait CalibFrame {
    /// Whether the frame carries a pixel payload.
    fn has_data(&self) -> bool;
    /// Focal lengths of the stream the frame was captured on.
    fn intrinsics(&self) -> FocalLengths;
    /// Run the target detector and return the four edge lengths.
    fn extract_target_edges(&self) -> Result<RectSides, DetectionError>;
}

/// Non-blocking FIFO of captured frames.
pub trait FrameSource {
    type Frame: CalibFrame;

    /// Number of queued frames at the time of the call.
    fn size(&self) -> usize;
    /// Pop the oldest frame, `None` when the queue is empty.
    fn try_pop(&self) -> Option<Self::Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for &S {
    type Frame = S::Frame;

    fn size(&self) -> usize {
        (**self).size()
    }

    fn try_pop(&self) -> Option<Self::Frame> {
        (**self).try_pop()
    }
}

/// Thread-safe frame queue shared between a capture thread and the calibration.
///
/// With a capacity set, pushing into a full queue drops the oldest frame.
#[derive(Debug)]
pub struct FrameQueue<F> {
    frames: Mutex<VecDeque<F>>,
    capacity: Option<usize>,
}

impl<F> Default for FrameQueue<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> FrameQueue<F> {
    /// Unbounded queue.
    pub fn new() -> Self {
        Self {
            frames: Mutex::new(VecDeque::new()),
            capacity: None,
        }
    }

    /// Queue holding at most `capacity` frames (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: Some(capacity),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Enqueue a frame, returning the frame evicted to make room, if any.
    pub fn push(&self, frame: F) -> Option<F> {
        let mut frames = self.lock();
        let evicted = match self.capacity {
            Some(cap) if frames.len() >= cap => frames.pop_front(),
            _ => None,
        };
        frames.push_back(frame);
        evicted
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn pop(&self) -> Option<F> {
        self.lock().pop_front()
    }

    // A panic while holding the lock cannot leave the deque half-updated.
    fn lock(&self) -> MutexGuard<'_, VecDeque<F>> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<F> FromIterator<F> for FrameQueue<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        Self {
            frames: Mutex::new(iter.into_iter().collect()),
            capacity: None,
        }
    }
}

impl<F: CalibFrame> FrameSource for FrameQueue<F> {
    type Frame = F;

    fn size(&self) -> usize {
        self.len()
    }

    fn try_pop(&self) -> Option<F> {
        self.pop()
    }
}

/// A frame whose detection result was captured ahead of time.
///
/// `edges == None` models a frame without payload; `detection_error`
/// replays a detector failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub intrinsics: FocalLengths,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<RectSides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_error: Option<String>,
}

impl RecordedFrame {
    pub fn new(intrinsics: FocalLengths, edges: RectSides) -> Self {
        Self {
            intrinsics,
            edges: Some(edges),
            detection_error: None,
        }
    }

    /// Frame without payload.
    pub fn empty(intrinsics: FocalLengths) -> Self {
        Self {
            intrinsics,
            edges: None,
            detection_error: None,
        }
    }

    /// Frame with payload on which detection fails.
    pub fn failing(intrinsics: FocalLengths, reason: impl Into<String>) -> Self {
        Self {
            intrinsics,
            edges: Some(RectSides::default()),
            detection_error: Some(reason.into()),
        }
    }
}

impl CalibFrame for RecordedFrame {
    fn has_data(&self) -> bool {
        self.edges.is_some()
    }

    fn intrinsics(&self) -> FocalLengths {
        self.intrinsics
    }

    fn extract_target_edges(&self) -> Result<RectSides, DetectionError> {
        if let Some(reason) = &self.detection_error {
            return Err(DetectionError::new(reason.clone()));
        }
        self.edges.ok_or_else(|| DetectionError::new("frame carries no data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const K: FocalLengths = FocalLengths::new(600.0, 600.0);

    #[test]
    fn queue_is_fifo() {
        let q = FrameQueue::new();
        q.push(RecordedFrame::new(K, RectSides::new(1.0, 1.0, 1.0, 1.0)));
        q.push(RecordedFrame::new(K, RectSides::new(2.0, 2.0, 2.0, 2.0)));
        assert_eq!(q.size(), 2);
        assert_eq!(q.try_pop().unwrap().edges.unwrap()[0], 1.0);
        assert_eq!(q.try_pop().unwrap().edges.unwrap()[0], 2.0);
        assert!(q.try_pop().is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn bounded_queue_evicts_oldest() {
        let q = FrameQueue::with_capacity(2);
        assert!(q.push(1).is_none());
        assert!(q.push(2).is_none());
        assert_eq!(q.push(3), Some(1));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
    }

    #[test]
    fn zero_capacity_still_holds_one_frame() {
        let q = FrameQueue::with_capacity(0);
        assert_eq!(q.capacity(), Some(1));
        q.push(1);
        assert_eq!(q.push(2), Some(1));
    }

    #[test]
    fn recorded_frame_capabilities() {
        let empty = RecordedFrame::empty(K);
        assert!(!empty.has_data());

        let failing = RecordedFrame::failing(K, "no dots found");
        assert!(failing.has_data());
        assert_eq!(
            failing.extract_target_edges(),
            Err(DetectionError::new("no dots found"))
        );

        let ok = RecordedFrame::new(K, RectSides::new(100.0, 100.0, 80.0, 80.0));
        assert_eq!(ok.intrinsics(), K);
        assert_eq!(
            ok.extract_target_edges(),
            Ok(RectSides::new(100.0, 100.0, 80.0, 80.0))
        );
    }

    #[test]
    fn recorded_frame_json_omits_missing_fields() {
        let json = serde_json::to_string(&RecordedFrame::empty(K)).unwrap();
        assert_eq!(json, r#"{"intrinsics":{"fx":600.0,"fy":600.0}}"#);
        let back: RecordedFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RecordedFrame::empty(K));
    }
}
