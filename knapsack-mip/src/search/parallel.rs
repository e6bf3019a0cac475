//! Multi-threaded branch-and-cut.
//!
//! Workers share one [`BranchAndCut`] controller behind a mutex: the open
//! nodes, the incumbent and the counters. Each worker owns a clone of the
//! master backend and processes nodes outside the lock. A worker that finds
//! the queue empty while other nodes are in flight sleeps on a condition
//! variable until one of them finishes.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use parking_lot::{Condvar, Mutex};

use super::{BranchAndCut, NodeIds, NodeProcessor, NodeReport, SearchNode};
use crate::cuts::CutRegistry;
use crate::error::{MipError, MipResult};
use crate::master::MasterBackend;
use crate::model::{KnapsackProblem, KnapsackSolution, MipStatus};
use crate::settings::MipSettings;

/// State guarded by the mutex.
struct Critical {
    /// Queue, incumbent and counters.
    tree: BranchAndCut,
    /// Nodes currently being processed.
    ongoing: usize,
    /// Budget that stopped the search, if any.
    stop: Option<MipStatus>,
    /// First error raised by a worker.
    error: Option<MipError>,
}

/// State shared by every worker.
struct Shared<'a> {
    prob: &'a KnapsackProblem,
    registry: &'a CutRegistry,
    settings: &'a MipSettings,
    ids: NodeIds,

    critical: Mutex<Critical>,
    monitor: Condvar,
}

/// What a worker should do next.
enum WorkLoad {
    /// The tree is exhausted.
    Complete,
    /// A budget was hit or a worker failed.
    Aborted,
    /// Nothing to do right now, ask again.
    Starvation,
    /// A node to process, with the incumbent objective at the time of the pop.
    WorkItem { node: SearchNode, incumbent: f64 },
}

/// Branch-and-cut over several worker threads.
pub struct ParallelBranchAndCut<'a> {
    shared: Shared<'a>,
    nb_threads: usize,
}

impl<'a> ParallelBranchAndCut<'a> {
    /// Create a solver using `settings.threads` workers.
    pub fn new(prob: &'a KnapsackProblem, registry: &'a CutRegistry, settings: &'a MipSettings) -> Self {
        Self {
            shared: Shared {
                prob,
                registry,
                settings,
                ids: NodeIds::new(),
                critical: Mutex::new(Critical {
                    tree: BranchAndCut::new(settings.clone()),
                    ongoing: 0,
                    stop: None,
                    error: None,
                }),
                monitor: Condvar::new(),
            },
            nb_threads: settings.threads.max(1),
        }
    }

    /// Override the number of workers.
    pub fn with_nb_threads(mut self, nb_threads: usize) -> Self {
        self.nb_threads = nb_threads.max(1);
        self
    }

    /// Run the search. Every worker starts from its own clone of `backend`.
    pub fn solve<B: MasterBackend + Clone + Send>(&mut self, backend: B) -> MipResult<KnapsackSolution> {
        {
            let mut critical = self.shared.critical.lock();
            critical.tree.initialize();
            critical.ongoing = 0;
            critical.stop = None;
            critical.error = None;
        }

        if self.shared.settings.verbose {
            log::info!(
                "Parallel branch-and-cut: {} items, {} workers",
                self.shared.prob.num_vars(),
                self.nb_threads
            );
        }

        std::thread::scope(|s| {
            for thread_id in 0..self.nb_threads {
                let shared = &self.shared;
                let backend = backend.clone();
                s.spawn(move || Self::work(shared, thread_id, backend));
            }
        });

        let mut critical = self.shared.critical.lock();
        if let Some(err) = critical.error.take() {
            return Err(err);
        }
        let status = match critical.stop {
            Some(status) => status,
            None => critical.tree.exhausted_status(),
        };
        Ok(critical.tree.finalize(self.shared.prob, status))
    }

    fn work<B: MasterBackend>(shared: &Shared<'_>, thread_id: usize, backend: B) {
        let mut processor =
            match NodeProcessor::new(shared.prob, shared.registry, shared.settings, &shared.ids, backend) {
                Ok(processor) => processor,
                Err(err) => {
                    Self::abort_search(shared, err);
                    return;
                }
            };

        let mut processed = 0u64;
        loop {
            match Self::get_workload(shared) {
                WorkLoad::Complete | WorkLoad::Aborted => break,
                WorkLoad::Starvation => continue,
                WorkLoad::WorkItem { node, incumbent } => {
                    // A panic must still release the node, or idle workers wait forever
                    let result =
                        catch_unwind(AssertUnwindSafe(|| processor.process(&node, incumbent)))
                            .unwrap_or_else(|payload| {
                                Err(Self::panic_error(thread_id, node.id, payload))
                            });
                    processed += 1;
                    Self::notify_node_finished(shared, result);
                }
            }
        }
        log::debug!("worker {} done after {} nodes", thread_id, processed);
    }

    fn get_workload(shared: &Shared<'_>) -> WorkLoad {
        let mut critical = shared.critical.lock();

        if critical.error.is_some() || critical.stop.is_some() {
            return WorkLoad::Aborted;
        }

        if critical.ongoing == 0 && critical.tree.open_nodes() == 0 {
            return WorkLoad::Complete;
        }

        if let Some(status) = critical.tree.limit_reached(critical.ongoing) {
            critical.stop = Some(status);
            shared.monitor.notify_all();
            return WorkLoad::Aborted;
        }

        let Some(node) = critical.tree.next_node() else {
            shared.monitor.wait(&mut critical);
            return WorkLoad::Starvation;
        };

        let incumbent = critical.tree.incumbent.obj_val;
        if node.can_prune(incumbent, shared.settings.bound_tol) {
            critical.tree.node_pruned();
            return WorkLoad::Starvation;
        }

        critical.ongoing += 1;
        WorkLoad::WorkItem { node, incumbent }
    }

    fn notify_node_finished(shared: &Shared<'_>, result: MipResult<NodeReport>) {
        let mut critical = shared.critical.lock();
        critical.ongoing -= 1;
        match result {
            Ok(report) => {
                critical.tree.record(report);
                critical.tree.log_progress();
            }
            Err(err) => {
                if critical.error.is_none() {
                    critical.error = Some(err);
                }
            }
        }
        shared.monitor.notify_all();
    }

    fn panic_error(thread_id: usize, node_id: u64, payload: Box<dyn Any + Send>) -> MipError {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        log::error!("worker {} panicked on node {}: {}", thread_id, node_id, message);
        MipError::InternalError(format!("worker panicked on node {}: {}", node_id, message))
    }

    fn abort_search(shared: &Shared<'_>, err: MipError) {
        let mut critical = shared.critical.lock();
        if critical.error.is_none() {
            critical.error = Some(err);
        }
        shared.monitor.notify_all();
    }
}
