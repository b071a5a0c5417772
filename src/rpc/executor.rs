//! The serialized execution context.
//!
//! The metadata model is live, externally-mutable state with no internal
//! synchronization for structural queries, so every query body must run to
//! completion before the next one starts - regardless of how many transport
//! connections are open. A single dedicated worker thread owns the dispatcher;
//! transport code submits requests through a channel and blocks for the reply.
//! Queries never yield mid-traversal and nothing is cached between them.

use std::sync::mpsc;
use std::thread::JoinHandle;

use serde_json::Value;

use crate::rpc::dispatch::Dispatcher;

enum Job {
    Request(Value, mpsc::Sender<Option<Value>>),
    Shutdown,
}

/// Funnels all query execution through one worker thread.
pub struct QueryExecutor {
    sender: mpsc::Sender<Job>,
    worker: Option<JoinHandle<()>>,
}

impl QueryExecutor {
    /// Spawns the worker thread around a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = std::thread::Builder::new()
            .name("cilquery-exec".to_string())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    match job {
                        Job::Request(request, reply) => {
                            let response = dispatcher.handle_value(request);
                            // The submitter may have given up; a dead reply
                            // channel must not take the worker down.
                            let _ = reply.send(response);
                        }
                        Job::Shutdown => break,
                    }
                }
            })
            .expect("failed to spawn query executor thread");
        QueryExecutor {
            sender,
            worker: Some(worker),
        }
    }

    /// Executes one request on the worker thread, blocking for the response.
    ///
    /// Returns `None` for notifications, and also when the executor has
    /// already shut down.
    #[must_use]
    pub fn execute(&self, request: Value) -> Option<Value> {
        let (reply_tx, reply_rx) = mpsc::channel();
        if self.sender.send(Job::Request(request, reply_tx)).is_err() {
            return None;
        }
        reply_rx.recv().unwrap_or(None)
    }

    /// Shuts the executor down.
    ///
    /// An in-flight query runs to completion first; only the idle wait for the
    /// next request is interrupted. Queued-but-unstarted requests are dropped,
    /// which their submitters observe as a `None` reply.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.sender.send(Job::Shutdown);
            let _ = worker.join();
        }
    }
}

impl Drop for QueryExecutor {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::workspace::Workspace;
    use serde_json::json;
    use std::sync::Arc;

    fn executor() -> QueryExecutor {
        QueryExecutor::new(Dispatcher::new(Arc::new(Workspace::new())))
    }

    #[test]
    fn test_executes_and_replies() {
        let executor = executor();
        let response = executor
            .execute(json!({"id": 1, "method": "listAssemblies"}))
            .unwrap();
        assert_eq!(response["id"], json!(1));
        assert_eq!(response["result"], json!([]));
    }

    #[test]
    fn test_notification_yields_no_reply() {
        let executor = executor();
        assert!(executor
            .execute(json!({"method": "listAssemblies"}))
            .is_none());
    }

    #[test]
    fn test_shutdown_joins_worker() {
        let executor = executor();
        let _ = executor.execute(json!({"id": 1, "method": "listAssemblies"}));
        executor.shutdown();
    }
}
