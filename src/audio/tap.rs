//! Sample hand-off between audio callbacks and the analyser.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Bounded mono sample queue shared with audio callbacks.
///
/// Only the newest `capacity` samples are retained; older samples are
/// dropped as new ones arrive.
#[derive(Clone)]
pub struct SampleTap {
    samples: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl SampleTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append interleaved frames, downmixing to mono
    pub fn push_interleaved(&self, data: &[f32], channels: usize) {
        let channels = channels.max(1);
        let mut samples = self.samples.lock();
        for frame in data.chunks_exact(channels) {
            let mono = frame.iter().sum::<f32>() / channels as f32;
            if samples.len() == self.capacity {
                samples.pop_front();
            }
            samples.push_back(mono);
        }
    }

    /// Copy the newest samples into `out`, right-aligned and zero-padded
    /// at the front when fewer are available.
    pub fn snapshot(&self, out: &mut [f32]) {
        let samples = self.samples.lock();
        let available = samples.len().min(out.len());
        let pad = out.len() - available;
        out[..pad].fill(0.0);
        let skip = samples.len() - available;
        for (dst, src) in out[pad..].iter_mut().zip(samples.iter().skip(skip)) {
            *dst = *src;
        }
    }

    /// Drop all buffered samples (source disconnected)
    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_and_capacity() {
        let tap = SampleTap::new(4);
        tap.push_interleaved(&[1.0, 0.0, 0.5, 0.5, 0.2, 0.0], 2);
        assert_eq!(tap.len(), 3);

        tap.push_interleaved(&[0.0, 0.0, 1.0, 1.0], 2);
        assert_eq!(tap.len(), 4);

        let mut out = [0.0; 4];
        tap.snapshot(&mut out);
        assert_eq!(out, [0.5, 0.1, 0.0, 1.0]);
    }

    #[test]
    fn test_snapshot_pads_front() {
        let tap = SampleTap::new(8);
        tap.push_interleaved(&[0.25, 0.75], 1);

        let mut out = [9.0; 4];
        tap.snapshot(&mut out);
        assert_eq!(out, [0.0, 0.0, 0.25, 0.75]);
    }

    #[test]
    fn test_clear() {
        let tap = SampleTap::new(8);
        tap.push_interleaved(&[0.25, 0.75], 1);
        tap.clear();
        assert!(tap.is_empty());
    }
}
