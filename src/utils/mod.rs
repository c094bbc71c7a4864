/// Clock sources for latency instrumentation.
pub mod clock {
    use std::sync::OnceLock;
    use std::time::Instant;

    static CLOCK_EPOCH: OnceLock<Instant> = OnceLock::new();

    /// Nanoseconds from a process-local monotonic epoch. Successive calls
    /// on the same thread never go backwards.
    #[inline(always)]
    pub fn monotonic_nanos() -> u64 {
        let epoch = *CLOCK_EPOCH.get_or_init(Instant::now);
        epoch.elapsed().as_nanos() as u64
    }
}

/// CPU utilities for cycle-accurate measurement
pub mod cpu {
    /// Measures CPU cycles using rdtsc
    #[cfg(target_arch = "x86_64")]
    #[inline(always)]
    pub unsafe fn rdtsc_serialized() -> u64 {
        std::arch::x86_64::_mm_mfence();
        std::arch::x86_64::_mm_lfence();
        let tsc = std::arch::x86_64::_rdtsc();
        std::arch::x86_64::_mm_lfence();
        tsc
    }

    /// Measures CPU cycles (fallback for non-x86_64)
    #[cfg(not(target_arch = "x86_64"))]
    #[inline(always)]
    pub unsafe fn rdtsc_serialized() -> u64 {
        super::clock::monotonic_nanos()
    }
}
