//! NVTX ranges for Nsight Systems
//!
//! Ranges are pushed with `nvtxRangePushEx` so the region colour reaches the
//! timeline. Links against `libnvToolsExt` from the CUDA toolkit.

use std::ffi::CString;
use std::os::raw::{c_char, c_int};

use super::{Region, RegionProfiler};

const NVTX_VERSION: u16 = 2;
const NVTX_COLOR_ARGB: i32 = 1;
const NVTX_MESSAGE_TYPE_ASCII: i32 = 1;

/// `nvtxEventAttributes_t` (version 2 layout)
#[repr(C)]
#[derive(Debug)]
#[allow(dead_code)]
struct EventAttributes {
    version: u16,
    size: u16,
    category: u32,
    color_type: i32,
    color: u32,
    payload_type: i32,
    reserved0: i32,
    payload: u64,
    message_type: i32,
    message: *const c_char,
}

impl EventAttributes {
    /// Attributes for `region`; `message` must outlive the push call
    fn for_region(region: &Region, message: &CString) -> Self {
        Self {
            version: NVTX_VERSION,
            size: std::mem::size_of::<Self>() as u16,
            category: 0,
            color_type: NVTX_COLOR_ARGB,
            color: region.color.argb(),
            payload_type: 0,
            reserved0: 0,
            payload: 0,
            message_type: NVTX_MESSAGE_TYPE_ASCII,
            message: message.as_ptr(),
        }
    }
}

#[link(name = "nvToolsExt")]
extern "C" {
    fn nvtxRangePushEx(attributes: *const EventAttributes) -> c_int;
    fn nvtxRangePop() -> c_int;
}

/// Interior NULs cannot cross the C boundary, so they are dropped
fn range_message(name: &str) -> CString {
    CString::new(name.replace('\0', "")).unwrap_or_default()
}

/// Profiler emitting coloured NVTX push/pop ranges on the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct NvtxProfiler;

impl NvtxProfiler {
    pub fn new() -> Self {
        Self
    }
}

impl RegionProfiler for NvtxProfiler {
    fn push_range(&self, region: &Region) {
        let message = range_message(&region.name);
        let attributes = EventAttributes::for_region(region, &message);
        // SAFETY: `attributes` and the string it points to live across the
        // call; NVTX copies the message before returning.
        unsafe {
            nvtxRangePushEx(&attributes);
        }
    }

    fn pop_range(&self) {
        // SAFETY: no arguments; an unmatched pop is ignored by NVTX.
        unsafe {
            nvtxRangePop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::RegionColor;

    #[test]
    fn test_attribute_layout_matches_nvtx() {
        assert_eq!(std::mem::size_of::<EventAttributes>(), 48);
    }

    #[test]
    fn test_region_colour_reaches_attributes() {
        let region = Region::new("VGGT_Aggregator", RegionColor::Blue);
        let message = range_message(&region.name);
        let attributes = EventAttributes::for_region(&region, &message);

        assert_eq!(attributes.color_type, NVTX_COLOR_ARGB);
        assert_eq!(attributes.color, 0xFF00_00FF);
        assert_eq!(attributes.size, 48);
        assert_eq!(attributes.message, message.as_ptr());
        assert_eq!(message.to_str().unwrap(), "VGGT_Aggregator");
    }

    #[test]
    fn test_interior_nul_is_dropped() {
        assert_eq!(range_message("a\0b").to_str().unwrap(), "ab");
    }
}
