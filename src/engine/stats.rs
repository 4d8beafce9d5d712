// Frame statistics for the optional performance counter.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

struct StatsSample {
    at: Instant,
    frames: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    /// Frames processed per second since the previous snapshot.
    pub fps: f64,
    pub frames_total: u64,
    pub pose_updates: u64,
    /// Targets whose latest pose update carried a transform.
    pub tracked_targets: usize,
}

pub struct StatsCollector {
    frames_total: AtomicU64,
    pose_updates: AtomicU64,
    tracked: Mutex<BTreeSet<usize>>,
    last_sample: Mutex<StatsSample>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            frames_total: AtomicU64::new(0),
            pose_updates: AtomicU64::new(0),
            tracked: Mutex::new(BTreeSet::new()),
            last_sample: Mutex::new(StatsSample {
                at: Instant::now(),
                frames: 0,
            }),
        }
    }

    pub fn record_frame(&self) {
        self.frames_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a pose update; `found` is false when tracking was lost.
    pub fn record_pose(&self, target_index: usize, found: bool) {
        self.pose_updates.fetch_add(1, Ordering::Relaxed);
        let mut tracked = self.tracked.lock();
        if found {
            tracked.insert(target_index);
        } else {
            tracked.remove(&target_index);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let now = Instant::now();
        let frames_total = self.frames_total.load(Ordering::Relaxed);

        let fps = {
            let mut sample = self.last_sample.lock();
            let elapsed = now.duration_since(sample.at).as_secs_f64();
            let fps = if elapsed > 0.1 {
                (frames_total - sample.frames) as f64 / elapsed
            } else {
                0.0
            };
            sample.at = now;
            sample.frames = frames_total;
            fps
        };

        StatsSnapshot {
            fps,
            frames_total,
            pose_updates: self.pose_updates.load(Ordering::Relaxed),
            tracked_targets: self.tracked.lock().len(),
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.frames_total.load(Ordering::Relaxed)
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
