//! Process resource counters reported by the `runtime` command.
//!
//! Allocation counts come from [`CountingAlloc`], which a host installs as its
//! `#[global_allocator]`. Thread and memory figures are read from
//! `/proc/self/status` where it exists.

use std::alloc::{GlobalAlloc, Layout, System};
use std::io::Write;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use prompt_types::error::Result;

static ALLOCS: AtomicU64 = AtomicU64::new(0);
static FREES: AtomicU64 = AtomicU64::new(0);
static LIVE_BYTES: AtomicUsize = AtomicUsize::new(0);

/// System allocator wrapper that counts allocations and frees.
///
/// ```ignore
/// #[global_allocator]
/// static GLOBAL: prompt_terminal::CountingAlloc = prompt_terminal::CountingAlloc;
/// ```
pub struct CountingAlloc;

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            ALLOCS.fetch_add(1, Ordering::Relaxed);
            LIVE_BYTES.fetch_add(layout.size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            ALLOCS.fetch_add(1, Ordering::Relaxed);
            LIVE_BYTES.fetch_add(layout.size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        FREES.fetch_add(1, Ordering::Relaxed);
        LIVE_BYTES.fetch_sub(layout.size(), Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            // Counted as one free of the old block and one allocation of the new.
            ALLOCS.fetch_add(1, Ordering::Relaxed);
            FREES.fetch_add(1, Ordering::Relaxed);
            LIVE_BYTES.fetch_add(new_size, Ordering::Relaxed);
            LIVE_BYTES.fetch_sub(layout.size(), Ordering::Relaxed);
        }
        new_ptr
    }
}

/// Snapshot of the [`CountingAlloc`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocCounters {
    pub allocs: u64,
    pub frees: u64,
    pub live_bytes: usize,
}

impl AllocCounters {
    /// Read the current counters.
    pub fn read() -> Self {
        Self {
            allocs: ALLOCS.load(Ordering::Relaxed),
            frees: FREES.load(Ordering::Relaxed),
            live_bytes: LIVE_BYTES.load(Ordering::Relaxed),
        }
    }

    /// Whether a [`CountingAlloc`] appears to be installed.
    pub fn is_tracking(&self) -> bool {
        self.allocs > 0
    }
}

/// Fields of interest from `/proc/self/status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcStatus {
    pub threads: Option<u64>,
    pub resident_kb: Option<u64>,
    pub virtual_kb: Option<u64>,
}

/// Parse the text of `/proc/<pid>/status`.
pub fn parse_proc_status(text: &str) -> ProcStatus {
    let mut status = ProcStatus::default();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let number = value
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok());
        match key.trim() {
            "Threads" => status.threads = number,
            "VmRSS" => status.resident_kb = number,
            "VmSize" => status.virtual_kb = number,
            _ => {},
        }
    }
    status
}

fn read_proc_status() -> ProcStatus {
    match std::fs::read_to_string("/proc/self/status") {
        Ok(text) => parse_proc_status(&text),
        Err(e) => {
            log::debug!("/proc/self/status unavailable: {e}");
            ProcStatus::default()
        },
    }
}

/// Everything the `runtime` command prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSnapshot {
    pub cpus: usize,
    pub process: ProcStatus,
    pub alloc: AllocCounters,
}

impl RuntimeSnapshot {
    /// Sample the current process.
    pub fn capture() -> Self {
        Self {
            cpus: std::thread::available_parallelism().map_or(1, |n| n.get()),
            process: read_proc_status(),
            alloc: AllocCounters::read(),
        }
    }

    /// Write the human-readable report.
    pub fn write_report(&self, out: &mut dyn Write) -> Result<()> {
        fn opt(v: Option<u64>, unit: &str) -> String {
            v.map_or_else(|| "unavailable".to_string(), |n| format!("{n}{unit}"))
        }

        writeln!(out)?;
        writeln!(out, " Logical CPUs: {}", self.cpus)?;
        writeln!(out, " Threads     : {}", opt(self.process.threads, ""))?;
        writeln!(out, " Memory")?;
        writeln!(out, "  * Process")?;
        writeln!(out, "   - resident: {}", opt(self.process.resident_kb, " kB"))?;
        writeln!(out, "   - virtual : {}", opt(self.process.virtual_kb, " kB"))?;
        if self.alloc.is_tracking() {
            writeln!(out, "  * Heap (bytes)")?;
            writeln!(out, "   - live   : {}", self.alloc.live_bytes)?;
            writeln!(out, "  * Number of")?;
            writeln!(out, "   - allocs : {}", self.alloc.allocs)?;
            writeln!(out, "   - frees  : {}", self.alloc.frees)?;
        } else {
            writeln!(out, "  * Heap: allocation counting not installed")?;
        }
        writeln!(out)?;
        Ok(())
    }
}
