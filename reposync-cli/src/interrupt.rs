//! Ctrl-C handling.
//!
//! A dedicated thread waits for the signal and ends the process with
//! [`EXIT_INTERRUPTED`], whatever step the run is in. Child git processes
//! share the terminal's process group and receive the signal themselves.

use std::thread;

/// Conventional exit status for SIGINT (128 + 2).
pub const EXIT_INTERRUPTED: i32 = 130;

pub fn install() {
    let spawned = thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(|| {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    eprintln!("warning: ctrl-c handler unavailable: {err}");
                    return;
                }
            };
            match runtime.block_on(tokio::signal::ctrl_c()) {
                Ok(()) => {
                    eprintln!("operation cancelled by user");
                    std::process::exit(EXIT_INTERRUPTED);
                }
                Err(err) => eprintln!("warning: ctrl-c handler failed: {err}"),
            }
        });
    if let Err(err) = spawned {
        eprintln!("warning: could not start ctrl-c handler: {err}");
    }
}
