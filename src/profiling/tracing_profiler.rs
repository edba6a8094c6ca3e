//! Regions as `tracing` spans
//!
//! Each region enters an info-level span named `profile_region`, so log lines
//! emitted during the forward pass carry the region name. The elapsed wall
//! time is logged at debug level when the region closes.

use std::cell::RefCell;
use std::time::Instant;

use tracing::span::EnteredSpan;
use tracing::{debug, info_span};

use super::{Region, RegionProfiler};

struct OpenRegion {
    name: String,
    started: Instant,
    _span: EnteredSpan,
}

/// Profiler backed by tracing spans
#[derive(Default)]
pub struct TracingProfiler {
    open: RefCell<Vec<OpenRegion>>,
}

impl TracingProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of regions currently open
    pub fn depth(&self) -> usize {
        self.open.borrow().len()
    }
}

impl RegionProfiler for TracingProfiler {
    fn push_range(&self, region: &Region) {
        let span = info_span!("profile_region", name = %region.name, color = %region.color);
        self.open.borrow_mut().push(OpenRegion {
            name: region.name.clone(),
            started: Instant::now(),
            _span: span.entered(),
        });
    }

    fn pop_range(&self) {
        // Dropping the entry exits the span
        if let Some(region) = self.open.borrow_mut().pop() {
            debug!(
                "Region '{}' closed after {:.3} ms",
                region.name,
                region.started.elapsed().as_secs_f64() * 1000.0
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::RegionColor;

    #[test]
    fn test_depth_follows_guards() {
        let profiler = TracingProfiler::new();
        let outer = Region::new("outer", RegionColor::Blue);
        let inner = Region::new("inner", RegionColor::Green);

        let outer_range = profiler.range(&outer);
        {
            let _inner_range = profiler.range(&inner);
            assert_eq!(profiler.depth(), 2);
        }
        assert_eq!(profiler.depth(), 1);
        drop(outer_range);
        assert_eq!(profiler.depth(), 0);
    }

    #[test]
    fn test_pop_without_push_is_ignored() {
        let profiler = TracingProfiler::new();
        profiler.pop_range();
        assert_eq!(profiler.depth(), 0);
    }
}
