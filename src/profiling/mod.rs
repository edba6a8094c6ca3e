//! Profiling annotation regions
//!
//! A region is a named, coloured span in the trace timeline. Profilers push
//! and pop regions; `RegionProfiler::range` returns a guard that pops the
//! region when dropped, so a region is closed on every exit path, including
//! early returns through `?` and unwinding.
//!
//! ```rust,ignore
//! let profiler = TracingProfiler::new();
//! let region = Region::new("VGGT_Aggregator", RegionColor::Blue);
//! {
//!     let _range = profiler.range(&region);
//!     // ... forward pass ...
//! }
//! ```

pub mod tracing_profiler;

#[cfg(feature = "nvtx")]
pub mod nvtx;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use tracing_profiler::TracingProfiler;

#[cfg(feature = "nvtx")]
pub use self::nvtx::NvtxProfiler;

/// Display colour of a region in the timeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegionColor {
    Blue,
    Green,
    Red,
    Yellow,
    Cyan,
    Magenta,
    White,
}

impl RegionColor {
    /// 0xAARRGGBB value as used by NVTX event attributes
    pub fn argb(&self) -> u32 {
        match self {
            RegionColor::Blue => 0xFF00_00FF,
            RegionColor::Green => 0xFF00_FF00,
            RegionColor::Red => 0xFFFF_0000,
            RegionColor::Yellow => 0xFFFF_FF00,
            RegionColor::Cyan => 0xFF00_FFFF,
            RegionColor::Magenta => 0xFFFF_00FF,
            RegionColor::White => 0xFFFF_FFFF,
        }
    }
}

impl fmt::Display for RegionColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionColor::Blue => "blue",
            RegionColor::Green => "green",
            RegionColor::Red => "red",
            RegionColor::Yellow => "yellow",
            RegionColor::Cyan => "cyan",
            RegionColor::Magenta => "magenta",
            RegionColor::White => "white",
        };
        f.write_str(name)
    }
}

/// A named annotation region
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub color: RegionColor,
}

impl Region {
    pub fn new(name: impl Into<String>, color: RegionColor) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// Something that records nested annotation regions
pub trait RegionProfiler {
    /// Open `region`, nested inside any region already open
    fn push_range(&self, region: &Region);

    /// Close the innermost open region
    fn pop_range(&self);

    /// Open `region` for the lifetime of the returned guard
    fn range(&self, region: &Region) -> RangeGuard<'_, Self> {
        self.push_range(region);
        RangeGuard { profiler: self }
    }
}

/// Closes its region on drop
#[must_use = "the region closes as soon as the guard is dropped"]
pub struct RangeGuard<'a, P: RegionProfiler + ?Sized> {
    profiler: &'a P,
}

impl<P: RegionProfiler + ?Sized> Drop for RangeGuard<'_, P> {
    fn drop(&mut self) {
        self.profiler.pop_range();
    }
}

impl<P: RegionProfiler + ?Sized> RegionProfiler for &P {
    fn push_range(&self, region: &Region) {
        (**self).push_range(region);
    }

    fn pop_range(&self) {
        (**self).pop_range();
    }
}

/// Both profilers record every region; the second nests inside the first
impl<A: RegionProfiler, B: RegionProfiler> RegionProfiler for (A, B) {
    fn push_range(&self, region: &Region) {
        self.0.push_range(region);
        self.1.push_range(region);
    }

    fn pop_range(&self) {
        self.1.pop_range();
        self.0.pop_range();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        label: &'static str,
        events: RefCell<Vec<String>>,
    }

    impl RegionProfiler for Recorder {
        fn push_range(&self, region: &Region) {
            self.events
                .borrow_mut()
                .push(format!("{}:push:{}", self.label, region.name));
        }

        fn pop_range(&self) {
            self.events.borrow_mut().push(format!("{}:pop", self.label));
        }
    }

    fn forward() -> Result<(), String> {
        Err("forward failed".to_string())
    }

    fn failing_step(profiler: &Recorder, region: &Region) -> Result<(), String> {
        let _range = profiler.range(region);
        forward()?;
        Ok(())
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let profiler = Recorder::default();
        let region = Region::new("VGGT_Aggregator", RegionColor::Blue);
        {
            let _range = profiler.range(&region);
            assert_eq!(profiler.events.borrow().len(), 1);
        }
        assert_eq!(
            *profiler.events.borrow(),
            vec![":push:VGGT_Aggregator", ":pop"]
        );
    }

    #[test]
    fn test_guard_pops_on_error_path() {
        let profiler = Recorder::default();
        let region = Region::new("step", RegionColor::Green);

        assert!(failing_step(&profiler, &region).is_err());
        assert_eq!(*profiler.events.borrow(), vec![":push:step", ":pop"]);
    }

    #[test]
    fn test_pair_nests_second_inside_first() {
        let pair = (
            Recorder {
                label: "outer",
                ..Default::default()
            },
            Recorder {
                label: "inner",
                ..Default::default()
            },
        );
        let region = Region::new("r", RegionColor::Red);
        drop(pair.range(&region));

        assert_eq!(*pair.0.events.borrow(), vec!["outer:push:r", "outer:pop"]);
        assert_eq!(*pair.1.events.borrow(), vec!["inner:push:r", "inner:pop"]);
    }

    #[test]
    fn test_color_values() {
        assert_eq!(RegionColor::Blue.argb(), 0xFF0000FF);
        assert_eq!(RegionColor::Blue.to_string(), "blue");
    }
}
