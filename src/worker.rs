//! Background query execution.
//!
//! A [`QueryWorker`] owns the [`QueryEngine`] on its own thread so the
//! requesting side (a UI event loop or the CLI) is never blocked by query
//! execution. Jobs go in over one mpsc channel, results come back over
//! another. The revisor runs inside the worker: a rejection becomes an
//! [`WorkerEvent::Error`], a rewrite is logged and executed in place of the
//! original text.

use polars::prelude::DataFrame;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Sender};
use std::thread::JoinHandle;

use crate::engine::{QueryEngine, TableInfo};
use crate::revisor::{Revisor, Verdict};

/// Work items accepted by the worker thread
pub enum WorkerJob {
    /// Optionally execute a query and sort the result, then fetch a page
    Fetch {
        query: Option<String>,
        sort: Option<(String, bool)>,
        page: usize,
    },
    /// Sort the current result, then fetch a page
    Sort {
        column: String,
        ascending: bool,
        page: usize,
    },
    /// Export the full current result to a file
    Export(PathBuf),
    /// Drop the active query, then fetch a page of the plain file
    Reset { page: usize },
    Shutdown,
}

/// Results emitted back to the requesting thread
#[derive(Debug)]
pub enum WorkerEvent {
    /// One page of the current result, with pagination bookkeeping
    Page {
        df: DataFrame,
        page: usize,
        info: TableInfo,
    },
    Exported(PathBuf),
    Error(String),
}

/// Handle to the worker thread
pub struct QueryWorker {
    jobs: Sender<WorkerJob>,
    handle: Option<JoinHandle<()>>,
}

impl QueryWorker {
    /// Move the engine onto a new thread and start accepting jobs.
    ///
    /// `max_rows` feeds the revisor's LIMIT clamp; `revise` disables the
    /// revisor entirely when false.
    pub fn spawn(
        engine: QueryEngine,
        events: Sender<WorkerEvent>,
        max_rows: usize,
        revise: bool,
    ) -> Self {
        let (jobs, job_rx) = channel::<WorkerJob>();

        let handle = std::thread::spawn(move || {
            let mut engine = engine;
            for job in job_rx {
                let outcome = match job {
                    WorkerJob::Fetch { query, sort, page } => {
                        run_fetch(&mut engine, query, sort, page, max_rows, revise)
                    }
                    WorkerJob::Sort {
                        column,
                        ascending,
                        page,
                    } => engine
                        .sort_by_column(&column, ascending)
                        .and_then(|_| page_event(&engine, page)),
                    WorkerJob::Export(path) => engine
                        .export(&path)
                        .map(|_| WorkerEvent::Exported(path)),
                    WorkerJob::Reset { page } => engine
                        .reset()
                        .and_then(|_| page_event(&engine, page)),
                    WorkerJob::Shutdown => break,
                };

                let event = outcome.unwrap_or_else(|e| WorkerEvent::Error(e.to_string()));
                if events.send(event).is_err() {
                    // Receiver is gone; nothing left to work for.
                    break;
                }
            }
        });

        Self {
            jobs,
            handle: Some(handle),
        }
    }

    /// Execute a query (if given), apply an optional `(column, ascending)`
    /// sort, and fetch one page of the result. Only that page is collected.
    pub fn fetch(
        &self,
        query: Option<String>,
        sort: Option<(String, bool)>,
        page: usize,
    ) -> bool {
        self.jobs.send(WorkerJob::Fetch { query, sort, page }).is_ok()
    }

    pub fn sort(&self, column: String, ascending: bool, page: usize) -> bool {
        self.jobs
            .send(WorkerJob::Sort {
                column,
                ascending,
                page,
            })
            .is_ok()
    }

    pub fn export(&self, path: PathBuf) -> bool {
        self.jobs.send(WorkerJob::Export(path)).is_ok()
    }

    pub fn reset(&self, page: usize) -> bool {
        self.jobs.send(WorkerJob::Reset { page }).is_ok()
    }

    /// Stop the worker and wait for the thread to finish.
    pub fn shutdown(mut self) {
        let _ = self.jobs.send(WorkerJob::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for QueryWorker {
    fn drop(&mut self) {
        let _ = self.jobs.send(WorkerJob::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_fetch(
    engine: &mut QueryEngine,
    query: Option<String>,
    sort: Option<(String, bool)>,
    page: usize,
    max_rows: usize,
    revise: bool,
) -> color_eyre::Result<WorkerEvent> {
    let sql = match query {
        Some(q) if revise => match Revisor::new(&q, max_rows).run() {
            Verdict::Pass => Some(q),
            Verdict::Rewritten {
                rule,
                message,
                query,
            } => {
                log::warn!("query rewritten by rule {}: {}", rule, message);
                Some(query)
            }
            Verdict::Rejected { rule, message } => {
                return Ok(WorkerEvent::Error(format!("{}: {}", rule, message)));
            }
        },
        other => other,
    };

    if let Some(sql) = sql {
        engine.execute_query(&sql)?;
    }
    if let Some((column, ascending)) = sort {
        engine.sort_by_column(&column, ascending)?;
    }
    page_event(engine, page)
}

fn page_event(engine: &QueryEngine, page: usize) -> color_eyre::Result<WorkerEvent> {
    let df = engine.page(page)?;
    Ok(WorkerEvent::Page {
        df,
        page,
        info: engine.table_info(),
    })
}

/// Convenience for one-shot callers: a worker plus its event receiver
pub fn spawn_with_channel(
    engine: QueryEngine,
    max_rows: usize,
    revise: bool,
) -> (QueryWorker, std::sync::mpsc::Receiver<WorkerEvent>) {
    let (tx, rx) = channel();
    (QueryWorker::spawn(engine, tx, max_rows, revise), rx)
}
