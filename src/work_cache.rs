use super::*;

const DUPLICATE_CACHE_SIZE: usize = 65_536;

#[derive(Debug, Default)]
struct Jobs {
    current: Option<Arc<WorkContext>>,
    valid: HashMap<JobId, Arc<WorkContext>>,
}

/// The current job plus older jobs at the same height, and the header hashes already credited
/// since the last clean refresh.
#[derive(Debug)]
pub(crate) struct WorkCache {
    jobs: RwLock<Jobs>,
    seen: Mutex<LruCache<[u8; 32], ()>>,
    next_id: AtomicU64,
}

impl WorkCache {
    pub(crate) fn new() -> Self {
        Self {
            jobs: RwLock::new(Jobs::default()),
            seen: Mutex::new(LruCache::new(
                NonZeroUsize::new(DUPLICATE_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            )),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn next_job_id(&self) -> JobId {
        JobId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn current(&self) -> Option<Arc<WorkContext>> {
        self.jobs.read().current.clone()
    }

    pub(crate) fn get(&self, job_id: JobId) -> Option<Arc<WorkContext>> {
        self.jobs.read().valid.get(&job_id).cloned()
    }

    /// Makes `work` current. A new height always cleans, whatever the caller asked for.
    /// Returns whether older jobs were invalidated.
    pub(crate) fn publish(&self, work: Arc<WorkContext>, clean: bool) -> bool {
        let mut jobs = self.jobs.write();

        let clean = clean
            || jobs
                .current
                .as_ref()
                .is_none_or(|current| current.height() != work.height());

        if clean {
            jobs.valid.clear();
            self.seen.lock().clear();
        }

        jobs.valid.insert(work.job_id, work.clone());
        jobs.current = Some(work);

        clean
    }

    pub(crate) fn is_duplicate(&self, header_hash: [u8; 32]) -> bool {
        self.seen.lock().put(header_hash, ()).is_some()
    }
}
