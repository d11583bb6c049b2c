//! fluxtime demo binary
//!
//! Registers a handful of snippets and hands control to the fluxtime CLI.
//!
//! ```sh
//! cargo run -p fluxtime-demos --release -- --list
//! cargo run -p fluxtime-demos --release -- sort_small
//! cargo run -p fluxtime-demos --release -- -s fill_scratch -r 5 scan_scratch
//! cargo run -p fluxtime-demos --release -- --in-process -v hash_words
//! ```

use fluxtime::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static SCRATCH: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Sort five integers
#[snippet]
fn sort_small() {
    let mut v = black_box(vec![5, 3, 1, 4, 2]);
    v.sort_unstable();
    black_box(v);
}

/// Format an integer into a fresh string
#[snippet]
fn format_int() {
    black_box(black_box(123_456_789u64).to_string());
}

/// Count words with a hash map
#[snippet]
fn hash_words() {
    let text = black_box("the quick brown fox jumps over the lazy dog the end");
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in text.split_whitespace() {
        *counts.entry(word).or_default() += 1;
    }
    black_box(counts);
}

/// Setup for `scan_scratch`: fill the scratch buffer
#[snippet]
fn fill_scratch() {
    SCRATCH.with(|scratch| {
        let mut scratch = scratch.borrow_mut();
        scratch.clear();
        scratch.extend(0..4096);
    });
}

/// Sum the scratch buffer
#[snippet]
fn scan_scratch() {
    SCRATCH.with(|scratch| black_box(scratch.borrow().iter().sum::<u64>()));
}

/// Sleep for a millisecond; useful to see calibration settle on few loops
#[snippet(name = "sleep-1ms")]
fn sleep_one_ms() {
    std::thread::sleep(std::time::Duration::from_millis(1));
}

fn main() {
    if let Err(e) = fluxtime::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
