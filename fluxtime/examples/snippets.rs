//! Timing snippets without the command line
//!
//! Builds statements from registered snippets and drives the orchestrator
//! directly with in-process workers.
//!
//! ```sh
//! cargo run --example snippets -p fluxtime --release
//! ```

use fluxtime::prelude::*;
use fluxtime::{InProcessWorker, Orchestrator, RunSettings};

#[snippet]
fn vec_push() {
    let mut v = Vec::with_capacity(64);
    for i in 0..64u32 {
        v.push(black_box(i));
    }
    black_box(v);
}

#[snippet]
fn string_concat() {
    let mut s = String::new();
    for part in ["alpha", "beta", "gamma"] {
        s.push_str(black_box(part));
    }
    black_box(s);
}

fn main() -> anyhow::Result<()> {
    for name in ["pass", "vec_push", "string_concat"] {
        let timer = Timer::new(Statement::resolve(name)?, Statement::pass());
        let settings = RunSettings {
            processes: 3,
            repeat: 3,
            name: Some(name.to_string()),
            ..RunSettings::default()
        };

        let mut worker = InProcessWorker::new(&timer);
        let outcome = Orchestrator::new(settings).run(&timer, &mut worker, &mut std::io::stdout())?;
        println!("{}", outcome.summary_line());
    }
    Ok(())
}
