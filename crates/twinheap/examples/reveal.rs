//! Allocate and release a handful of lettered blocks, printing the arena
//! after each step.
//!
//! ```text
//! cargo run -p twinheap --example reveal -- [arena_size] [--plain]
//! ```
//!
//! Set `TWINHEAP_LOG=trace` to see every split and merge.

use std::error::Error;

use log::{Level, LevelFilter, Metadata, Record};
use twinheap::prelude::*;

/// Prints `[LEVEL] message` to stderr.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Trace
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging() {
    let level = std::env::var("TWINHEAP_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LevelFilter::Warn);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn show(heap: &Heap, labels: &Labels, style: RevealStyle, title: &str) -> Result<(), HeapError> {
    println!("== {title}");
    println!("{}", reveal(heap, labels, style)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let mut arena_size = 1024;
    let mut style = RevealStyle::Ansi;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--plain" => style = RevealStyle::Plain,
            size => arena_size = size.parse()?,
        }
    }

    let mut heap = Heap::new(HeapConfig::new().with_fatal_policy(FatalPolicy::Report))?;
    heap.init(arena_size)?;
    let mut labels = Labels::new();
    show(&heap, &labels, style, &format!("init({arena_size})"))?;

    for (label, n) in [('a', 100), ('b', 10), ('c', 200), ('d', 30)] {
        match heap.allocate(n)? {
            Some(ptr) => {
                labels.insert(label, ptr)?;
                show(&heap, &labels, style, &format!("{label} = allocate({n})"))?;
            }
            None => println!("== allocate({n}): no space"),
        }
    }

    for label in ['b', 'a'] {
        if let Some(ptr) = labels.remove(label) {
            heap.release(ptr)?;
            show(&heap, &labels, style, &format!("release({label})"))?;
        }
    }

    println!("{}", FreeListReport::capture(&heap)?);

    heap.validate()?;
    heap.shutdown();
    Ok(())
}
