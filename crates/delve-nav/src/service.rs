//! Pathfinding service: searches answered out of band through per-agent channels.
//!
//! Callers never run a search directly. They submit a [`PathQuery`] on their [`PlanChannel`]
//! and poll it on later ticks. The service answers each request exactly once, either from a
//! budgeted per-tick slice ([`PathfindingService::pump`]) or from worker threads.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::{
    search, MovementGraph, NavError, PathQuery, PlanRequest, PlanResponse, PlanResultCode,
    RequestId,
};

const WORKER_POLL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// Searches run on the caller's thread inside [`PathfindingService::pump`].
    Inline { searches_per_pump: usize },
    /// Searches run on worker threads sharing the latest published graph snapshot.
    Threaded { workers: usize },
}

struct Job {
    request: PlanRequest,
    reply: Sender<PlanResponse>,
}

type JobQueue = Arc<Mutex<Receiver<Job>>>;

type Snapshot = Arc<dyn MovementGraph + Send + Sync>;

type SnapshotSlot = Arc<RwLock<Snapshot>>;

fn lock(queue: &JobQueue) -> MutexGuard<'_, Receiver<Job>> {
    // A panicking search cannot leave the receiver half-updated.
    match queue.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn current(slot: &SnapshotSlot) -> Snapshot {
    match slot.read() {
        Ok(guard) => Arc::clone(&guard),
        Err(poisoned) => Arc::clone(&poisoned.into_inner()),
    }
}

fn run_job<G: MovementGraph + ?Sized>(graph: &G, job: Job) {
    let outcome = search(graph, &job.request.query);
    tracing::debug!(
        agent = job.request.agent,
        request_id = job.request.id.0,
        result = ?outcome.result,
        expansions = outcome.expansions,
        steps = outcome.path.len(),
        "plan request answered"
    );
    let response = PlanResponse {
        request_id: job.request.id,
        result: outcome.result,
        path: outcome.path,
        expansions: outcome.expansions,
    };
    // The planner that asked may be gone; its answer is simply dropped.
    let _ = job.reply.send(response);
}

fn cancel(job: Job) {
    let _ = job.reply.send(PlanResponse {
        request_id: job.request.id,
        result: PlanResultCode::Cancelled,
        path: Vec::new(),
        expansions: 0,
    });
}

pub struct PathfindingService {
    mode: ServiceMode,
    jobs: Sender<Job>,
    queue: JobQueue,
    next_id: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    snapshot: Option<SnapshotSlot>,
    workers: Vec<JoinHandle<()>>,
}

impl PathfindingService {
    /// Service answering up to `searches_per_pump` requests per [`Self::pump`] call.
    pub fn inline(searches_per_pump: usize) -> Self {
        Self::with_mode(ServiceMode::Inline {
            searches_per_pump: searches_per_pump.max(1),
        })
    }

    /// Service answering requests on `workers` threads against `graph`.
    pub fn threaded<G>(graph: Arc<G>, workers: usize) -> Self
    where
        G: MovementGraph + Send + Sync + 'static,
    {
        let workers = workers.max(1);
        let mut service = Self::with_mode(ServiceMode::Threaded { workers });
        let graph: Snapshot = graph;
        let slot: SnapshotSlot = Arc::new(RwLock::new(graph));
        service.snapshot = Some(Arc::clone(&slot));
        for index in 0..workers {
            let graph = Arc::clone(&slot);
            let queue = Arc::clone(&service.queue);
            let shutdown = Arc::clone(&service.shutdown);
            service.workers.push(thread::spawn(move || {
                worker_main(index, graph, queue, shutdown)
            }));
        }
        service
    }

    fn with_mode(mode: ServiceMode) -> Self {
        let (jobs, queue) = mpsc::channel();
        Self {
            mode,
            jobs,
            queue: Arc::new(Mutex::new(queue)),
            next_id: Arc::new(AtomicU64::new(1)),
            shutdown: Arc::new(AtomicBool::new(false)),
            snapshot: None,
            workers: Vec::new(),
        }
    }

    pub fn mode(&self) -> ServiceMode {
        self.mode
    }

    /// Open a response channel for one agent.
    pub fn channel(&self, agent: u64) -> PlanChannel {
        let (reply, replies) = mpsc::channel();
        PlanChannel {
            agent,
            jobs: self.jobs.clone(),
            next_id: Arc::clone(&self.next_id),
            reply,
            replies,
        }
    }

    /// Answer queued requests against `graph`. Returns how many were answered.
    ///
    /// Threaded services answer on their own; this is a no-op for them.
    pub fn pump<G: MovementGraph + ?Sized>(&self, graph: &G) -> usize {
        let ServiceMode::Inline { searches_per_pump } = self.mode else {
            return 0;
        };
        let mut answered = 0;
        while answered < searches_per_pump {
            let job = match lock(&self.queue).try_recv() {
                Ok(job) => job,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            };
            run_job(graph, job);
            answered += 1;
        }
        answered
    }

    /// Replace the graph worker threads search. Requests already being searched finish against
    /// the old snapshot. Returns false for inline services, which search whatever `pump` is given.
    pub fn publish_graph<G>(&self, graph: Arc<G>) -> bool
    where
        G: MovementGraph + Send + Sync + 'static,
    {
        let Some(slot) = &self.snapshot else {
            return false;
        };
        let graph: Snapshot = graph;
        match slot.write() {
            Ok(mut guard) => *guard = graph,
            Err(poisoned) => *poisoned.into_inner() = graph,
        }
        tracing::debug!("graph snapshot published");
        true
    }

    /// Answer every request still waiting in the queue with `Cancelled`.
    pub fn cancel_pending(&self) -> usize {
        let queue = lock(&self.queue);
        let mut cancelled = 0;
        while let Ok(job) = queue.try_recv() {
            cancel(job);
            cancelled += 1;
        }
        if cancelled > 0 {
            tracing::debug!(cancelled, "pending plan requests cancelled");
        }
        cancelled
    }
}

impl Drop for PathfindingService {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("pathfinding worker panicked");
            }
        }
    }
}

fn worker_main(index: usize, graph: SnapshotSlot, queue: JobQueue, shutdown: Arc<AtomicBool>) {
    tracing::trace!(worker = index, "pathfinding worker started");
    while !shutdown.load(Ordering::Acquire) {
        let job = lock(&queue).recv_timeout(WORKER_POLL);
        match job {
            Ok(job) => run_job(&*current(&graph), job),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::trace!(worker = index, "pathfinding worker stopped");
}

/// One agent's request/response endpoint.
///
/// Responses arrive at most once per request id and may come back out of order relative to
/// newer requests from the same channel.
pub struct PlanChannel {
    agent: u64,
    jobs: Sender<Job>,
    next_id: Arc<AtomicU64>,
    reply: Sender<PlanResponse>,
    replies: Receiver<PlanResponse>,
}

impl PlanChannel {
    pub fn agent(&self) -> u64 {
        self.agent
    }

    pub fn submit(&self, query: PathQuery) -> Result<RequestId, NavError> {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let job = Job {
            request: PlanRequest {
                id,
                agent: self.agent,
                query,
            },
            reply: self.reply.clone(),
        };
        self.jobs.send(job).map_err(|_| NavError::ServiceShutDown)?;
        Ok(id)
    }

    pub fn try_recv(&self) -> Option<PlanResponse> {
        self.replies.try_recv().ok()
    }

    /// Everything that has arrived so far, in arrival order.
    pub fn drain(&self) -> Vec<PlanResponse> {
        self.replies.try_iter().collect()
    }
}

impl std::fmt::Debug for PlanChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanChannel")
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::{GoalRegion, Mobility, Voxel, VoxelGrid};

    fn corridor() -> VoxelGrid {
        VoxelGrid::from_layers(&[["......"]]).unwrap()
    }

    fn query() -> PathQuery {
        PathQuery::new(Voxel::new(0, 0, 0), GoalRegion::single(Voxel::new(5, 0, 0)))
            .with_mobility(Mobility::walker())
    }

    #[test]
    fn inline_pump_respects_budget_and_ids_are_unique() {
        let grid = corridor();
        let service = PathfindingService::inline(1);
        let a = service.channel(1);
        let b = service.channel(2);

        let first = a.submit(query()).unwrap();
        let second = b.submit(query()).unwrap();
        assert_ne!(first, second);

        assert_eq!(service.pump(&grid), 1);
        assert_eq!(a.drain().len(), 1);
        assert!(b.try_recv().is_none());

        assert_eq!(service.pump(&grid), 1);
        let reply = b.try_recv().unwrap();
        assert_eq!(reply.request_id, second);
        assert_eq!(reply.result, PlanResultCode::Success);
        assert_eq!(service.pump(&grid), 0);
    }

    #[test]
    fn cancel_pending_answers_queued_requests() {
        let service = PathfindingService::inline(4);
        let channel = service.channel(1);
        let id = channel.submit(query()).unwrap();

        assert_eq!(service.cancel_pending(), 1);
        let reply = channel.try_recv().unwrap();
        assert_eq!(reply.request_id, id);
        assert_eq!(reply.result, PlanResultCode::Cancelled);
    }

    #[test]
    fn dropped_service_refuses_new_requests() {
        let service = PathfindingService::inline(1);
        let channel = service.channel(1);
        drop(service);
        assert_eq!(channel.submit(query()), Err(NavError::ServiceShutDown));
    }

    #[test]
    fn threaded_service_answers_without_pumping() {
        let service = PathfindingService::threaded(Arc::new(corridor()), 2);
        let channel = service.channel(7);
        let ids: Vec<_> = (0..4).map(|_| channel.submit(query()).unwrap()).collect();

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut replies = Vec::new();
        while replies.len() < ids.len() && Instant::now() < deadline {
            replies.extend(channel.drain());
            thread::sleep(Duration::from_millis(1));
        }

        let mut answered: Vec<_> = replies.iter().map(|r| r.request_id).collect();
        answered.sort();
        assert_eq!(answered, ids);
        assert!(replies.iter().all(|r| r.path.len() == 5));
    }

    fn wait_for(channel: &PlanChannel) -> PlanResponse {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(reply) = channel.try_recv() {
                return reply;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("no reply within the deadline");
    }

    #[test]
    fn published_graph_is_used_by_later_requests() {
        let walled = VoxelGrid::from_layers(&[["..#..."]]).unwrap();
        let service = PathfindingService::threaded(Arc::new(walled), 1);
        let channel = service.channel(3);

        channel.submit(query()).unwrap();
        assert_eq!(wait_for(&channel).result, PlanResultCode::NoSolution);

        assert!(service.publish_graph(Arc::new(corridor())));
        channel.submit(query()).unwrap();
        assert_eq!(wait_for(&channel).result, PlanResultCode::Success);

        assert!(!PathfindingService::inline(1).publish_graph(Arc::new(corridor())));
    }
}
