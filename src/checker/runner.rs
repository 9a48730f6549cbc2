//! Parallel check aggregator.
//!
//! Runs a batch of independent checks on a dedicated rayon pool and collects
//! one result per check in completion order. A check that returns an error or
//! panics is reported as a `Script Error` FAIL; its siblings are unaffected.
//! Panic messages from pool workers go to the debug log, not stderr.

use super::{Check, CheckContext, CheckResult};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Once, mpsc};
use std::thread;

/// Name of the synthetic result produced for a faulting check.
pub const SCRIPT_ERROR: &str = "Script Error";

const WORKER_PREFIX: &str = "commitgate-check-";

fn is_check_worker(thread_name: Option<&str>) -> bool {
    thread_name.is_some_and(|n| n.starts_with(WORKER_PREFIX))
}

/// Send panic messages raised on check workers to the debug log. Other
/// threads keep the previously installed hook.
pub fn install_panic_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if is_check_worker(thread::current().name()) {
                tracing::debug!("check worker {}", info);
            } else {
                previous(info);
            }
        }));
    });
}

/// Worker count when none is configured.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

pub struct Aggregator {
    pool: ThreadPool,
}

impl Aggregator {
    /// Build a pool of `jobs` workers, or one per available core.
    pub fn new(jobs: Option<usize>) -> Result<Self> {
        let threads = jobs.filter(|&n| n > 0).unwrap_or_else(default_jobs);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("{}{}", WORKER_PREFIX, i))
            .build()
            .context("Failed to start the check worker pool")?;
        install_panic_hook();
        tracing::debug!("check pool started with {} workers", threads);
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run every check to completion and return their results.
    ///
    /// The output order is the order in which checks finished; only the set
    /// of results is meaningful.
    pub fn run(&self, checks: &[&dyn Check], ctx: &CheckContext<'_>) -> Vec<CheckResult> {
        self.run_inner(checks, ctx, None)
    }

    /// Same as [`Aggregator::run`], advancing `progress` as checks finish.
    pub fn run_with_progress(
        &self,
        checks: &[&dyn Check],
        ctx: &CheckContext<'_>,
        progress: &ProgressBar,
    ) -> Vec<CheckResult> {
        self.run_inner(checks, ctx, Some(progress))
    }

    fn run_inner(
        &self,
        checks: &[&dyn Check],
        ctx: &CheckContext<'_>,
        progress: Option<&ProgressBar>,
    ) -> Vec<CheckResult> {
        let (tx, rx) = mpsc::channel();

        self.pool.scope(|s| {
            for &check in checks {
                let tx = tx.clone();
                s.spawn(move |_| {
                    let result = run_isolated(check, ctx);
                    if let Some(pb) = progress {
                        pb.set_message(format!("{} {}", result.name, result.status));
                        pb.inc(1);
                    }
                    // The receiver outlives the scope, so this cannot fail.
                    let _ = tx.send(result);
                });
            }
        });
        drop(tx);

        rx.into_iter().collect()
    }
}

/// Run one check, converting errors and panics into a `Script Error` result.
pub fn run_isolated(check: &dyn Check, ctx: &CheckContext<'_>) -> CheckResult {
    let name = check.name().to_string();
    tracing::debug!("running {}", name);

    match panic::catch_unwind(AssertUnwindSafe(|| check.run(ctx))) {
        Ok(Ok(result)) => {
            tracing::debug!("{} finished: {}", name, result.status);
            result
        }
        Ok(Err(e)) => {
            tracing::warn!("{} failed unexpectedly: {:#}", name, e);
            script_error(&name, &format!("{:#}", e))
        }
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            tracing::warn!("{} panicked: {}", name, msg);
            script_error(&name, &msg)
        }
    }
}

fn script_error(check: &str, fault: &str) -> CheckResult {
    CheckResult::fail(SCRIPT_ERROR, format!("{}: {}", check, fault))
        .with_fix("This is a bug in the check itself; rerun with --verbose for details")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "check panicked".to_string()
    }
}
