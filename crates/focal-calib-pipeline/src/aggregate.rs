//! Averaging of per-frame target measurements.
//!
//! Drains a snapshot of the frame queue, runs the target detector on every
//! frame that carries data and averages the resulting edge lengths. The
//! stream intrinsics are taken from the first frame with data.

use focal_calib_core::{
    CalibFrame, FocalCalibError, FocalLengths, FrameSource, Real, RectSides, TargetRectInfo,
};
use log::{debug, info};

/// Progress counter threaded through consecutive aggregation passes.
///
/// The counter advances once per frame that carried data, and the callback
/// (if any) receives the new value. Reusing one `Progress` for the left and
/// right passes keeps the reported values monotonic.
#[derive(Default)]
pub struct Progress<'a> {
    value: usize,
    callback: Option<Box<dyn FnMut(Real) + 'a>>,
}

impl<'a> Progress<'a> {
    /// Counter starting at `start`, without callback.
    pub fn new(start: usize) -> Self {
        Self {
            value: start,
            callback: None,
        }
    }

    /// Counter starting at `start` that reports every increment to `callback`.
    pub fn with_callback(start: usize, callback: impl FnMut(Real) + 'a) -> Self {
        Self {
            value: start,
            callback: Some(Box::new(callback)),
        }
    }

    pub fn value(&self) -> usize {
        self.value
    }

    fn advance(&mut self) {
        self.value += 1;
        if let Some(cb) = self.callback.as_mut() {
            cb(self.value as Real);
        }
    }
}

impl std::fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("value", &self.value)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Average the target edge lengths over the frames queued at call time.
///
/// The queue size read on entry bounds the number of pop attempts; frames
/// pushed while the call runs may or may not be consumed. Every popped frame
/// is dropped before progress is reported.
///
/// # Errors
///
/// - [`FocalCalibError::EmptyInput`] if the queue is empty on entry,
/// - [`FocalCalibError::DetectionFailure`] on the first detector error
///   (remaining frames stay queued),
/// - [`FocalCalibError::NoValidMeasurements`] if no popped frame had data.
pub fn get_target_rect_info<Q: FrameSource>(
    queue: &Q,
    progress: &mut Progress<'_>,
) -> Result<TargetRectInfo, FocalCalibError> {
    let queue_size = queue.size();
    if queue_size == 0 {
        return Err(FocalCalibError::EmptyInput);
    }

    let mut intrinsics: Option<FocalLengths> = None;
    let mut samples = Vec::with_capacity(queue_size);

    for frame_idx in 0..queue_size {
        let Some(frame) = queue.try_pop() else {
            continue;
        };
        if !frame.has_data() {
            continue;
        }

        let k = *intrinsics.get_or_insert_with(|| frame.intrinsics());
        let sides = frame
            .extract_target_edges()
            .map_err(|e| FocalCalibError::DetectionFailure {
                frame: frame_idx,
                reason: e.to_string(),
            })?;
        drop(frame);

        debug!(
            "frame {frame_idx}: sides [{:.3}, {:.3}, {:.3}, {:.3}] (fx {:.3}, fy {:.3})",
            sides[0], sides[1], sides[2], sides[3], k.fx, k.fy
        );
        samples.push(sides);
        progress.advance();
    }

    let (Some(sides), Some(intrinsics)) = (RectSides::mean(&samples), intrinsics) else {
        return Err(FocalCalibError::NoValidMeasurements);
    };

    info!(
        "target rect averaged over {}/{} frames: [{:.3}, {:.3}, {:.3}, {:.3}]",
        samples.len(),
        queue_size,
        sides[0],
        sides[1],
        sides[2],
        sides[3]
    );

    Ok(TargetRectInfo {
        sides,
        intrinsics,
        frames_used: samples.len(),
    })
}
