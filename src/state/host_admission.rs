use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of asking for a download slot on a host
#[derive(Debug)]
pub enum Admission<T> {
    /// A slot was taken; the caller must run the job and later call `release`
    Admitted(T),
    /// The host is at capacity; the job is parked until a slot is handed off
    Deferred,
}

impl<T> Admission<T> {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}

#[derive(Debug)]
struct HostSlots<T> {
    in_flight: usize,
    deferred: VecDeque<T>,
}

/// Per-host admission control
///
/// Guarantees that at most `per_host` jobs for any host are in flight at once.
/// A job that finds its host full is queued (FIFO per host) instead of waiting,
/// and the slot freed by a finishing job is handed straight to the oldest queued
/// job for that host, so the counter never drops below capacity while work is
/// waiting and no caller ever polls.
///
/// All state sits behind one mutex; it is only held for map operations and
/// never across an `.await`.
#[derive(Debug)]
pub struct HostAdmission<T> {
    per_host: usize,
    hosts: Mutex<HashMap<String, HostSlots<T>>>,
}

impl<T> HostAdmission<T> {
    /// Creates an admission controller with the given per-host cap (>= 1)
    pub fn new(per_host: usize) -> Self {
        Self {
            per_host: per_host.max(1),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Maximum number of in-flight jobs per host
    pub fn per_host(&self) -> usize {
        self.per_host
    }

    fn hosts(&self) -> MutexGuard<'_, HashMap<String, HostSlots<T>>> {
        // Nothing panics while the lock is held, so a poisoned map is still consistent.
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a slot on `host` for `job`, or parks the job if the host is full
    pub fn try_admit(&self, host: &str, job: T) -> Admission<T> {
        let mut hosts = self.hosts();
        let slots = hosts.entry(host.to_string()).or_insert_with(|| HostSlots {
            in_flight: 0,
            deferred: VecDeque::new(),
        });

        if slots.in_flight < self.per_host {
            slots.in_flight += 1;
            tracing::trace!("Admitted job for {} ({} in flight)", host, slots.in_flight);
            Admission::Admitted(job)
        } else {
            slots.deferred.push_back(job);
            tracing::trace!(
                "Deferred job for {} ({} waiting)",
                host,
                slots.deferred.len()
            );
            Admission::Deferred
        }
    }

    /// Gives back the slot of a finished job on `host`
    ///
    /// Must be called exactly once per admitted (or handed-off) job. If another
    /// job is waiting for the host it is returned and inherits the slot; the
    /// in-flight count is left unchanged. Otherwise the count is decremented.
    pub fn release(&self, host: &str) -> Option<T> {
        let mut hosts = self.hosts();
        let slots = hosts.get_mut(host)?;

        if let Some(next) = slots.deferred.pop_front() {
            tracing::trace!("Handing off slot on {} to deferred job", host);
            return Some(next);
        }

        slots.in_flight = slots.in_flight.saturating_sub(1);
        if slots.in_flight == 0 {
            hosts.remove(host);
        }
        None
    }

    /// Drops every deferred job and returns how many there were
    ///
    /// Used when a session is torn down so that finishing jobs stop handing
    /// their slots to work nobody will collect.
    pub fn abandon(&self) -> usize {
        let mut hosts = self.hosts();
        hosts
            .values_mut()
            .map(|slots| {
                let dropped = slots.deferred.len();
                slots.deferred.clear();
                dropped
            })
            .sum()
    }

    /// Current number of in-flight jobs on `host`
    pub fn in_flight(&self, host: &str) -> usize {
        self.hosts().get(host).map_or(0, |slots| slots.in_flight)
    }

    /// Number of jobs parked for `host`
    pub fn deferred(&self, host: &str) -> usize {
        self.hosts().get(host).map_or(0, |slots| slots.deferred.len())
    }
}
