//! Heap allocation counters for asserting that hot evaluation loops stay allocation-free.
//!
//! With the `alloc-track` feature the crate installs an instrumented global allocator. Without
//! it every region reports zero, so callers must gate assertions on the feature.

#![allow(dead_code)]
/// Allocation deltas observed inside an [`AllocRegion`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AllocStats {
    pub(crate) allocations: usize,
    pub(crate) reallocations: usize,
    pub(crate) bytes_allocated: usize,
}

impl AllocStats {
    pub(crate) fn is_quiet(&self) -> bool {
        self.allocations == 0 && self.reallocations == 0
    }
}

#[cfg(feature = "alloc-track")]
mod imp {
    use super::AllocStats;
    use stats_alloc::{INSTRUMENTED_SYSTEM, Region, StatsAlloc};
    use std::alloc::System;

    #[global_allocator]
    static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

    impl From<stats_alloc::Stats> for AllocStats {
        fn from(s: stats_alloc::Stats) -> Self {
            Self {
                allocations: s.allocations,
                reallocations: s.reallocations,
                bytes_allocated: s.bytes_allocated,
            }
        }
    }

    pub(crate) struct AllocRegion {
        region: Region<'static, System>,
    }

    impl AllocRegion {
        pub(crate) fn new() -> Self {
            Self {
                region: Region::new(GLOBAL),
            }
        }

        pub(crate) fn change(&self) -> AllocStats {
            self.region.change().into()
        }
    }
}

#[cfg(not(feature = "alloc-track"))]
mod imp {
    use super::AllocStats;

    pub(crate) struct AllocRegion;

    impl AllocRegion {
        pub(crate) fn new() -> Self {
            Self
        }

        pub(crate) fn change(&self) -> AllocStats {
            AllocStats::default()
        }
    }
}

#[allow(unused_imports)]
pub(crate) use imp::AllocRegion;
