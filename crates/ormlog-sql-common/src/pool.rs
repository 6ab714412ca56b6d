//! Small blocking connection pool.
//!
//! Every log write borrows one connection for the duration of a single insert-and-commit, so the
//! pool only needs to bound the number of live connections and hand them out fairly.

use std::fmt::Debug;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::database::DatabaseConnector;

/// Pool error
#[derive(Debug, thiserror::Error)]
pub enum Error<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Mutex Poison Error
    #[error("Internal: PoisonError")]
    Poison,

    /// Timeout error
    #[error("Timed out waiting for a resource")]
    Timeout,

    /// Internal database error
    #[error(transparent)]
    Resource(#[from] E),
}

impl<E> From<Error<E>> for crate::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(value: Error<E>) -> Self {
        match value {
            Error::Resource(e) => crate::Error::Database(Box::new(e)),
            other => crate::Error::Pool(other.to_string()),
        }
    }
}

/// Configuration
pub trait DatabaseConfig: Clone + Debug + Send + Sync {
    /// Max resource sizes
    fn max_size(&self) -> usize;

    /// Default timeout
    fn default_timeout(&self) -> Duration;
}

/// Trait to manage resources
pub trait DatabasePool: Debug + Send + Sync {
    /// The resource to be pooled
    type Connection: DatabaseConnector;

    /// The configuration that is needed in order to create the resource
    type Config: DatabaseConfig;

    /// The error the resource may return when creating a new instance
    type Error: Debug + std::error::Error + Send + Sync + 'static;

    /// Creates a new resource with a given config.
    ///
    /// If `stale` is ever set to TRUE it is assumed the resource is no longer valid and it will be
    /// dropped instead of being handed out again.
    fn new_resource(
        config: &Self::Config,
        stale: Arc<AtomicBool>,
        timeout: Duration,
    ) -> Result<Self::Connection, Error<Self::Error>>;

    /// The object is dropped
    fn drop(_resource: Self::Connection) {}
}

/// Generic connection pool of resources R
#[derive(Debug)]
pub struct Pool<RM>
where
    RM: DatabasePool,
{
    config: RM::Config,
    queue: Mutex<Vec<(Arc<AtomicBool>, RM::Connection)>>,
    in_use: AtomicUsize,
    max_size: usize,
    default_timeout: Duration,
    waiter: Condvar,
}

/// The pooled resource
pub struct PooledResource<RM>
where
    RM: DatabasePool,
{
    resource: Option<(Arc<AtomicBool>, RM::Connection)>,
    pool: Arc<Pool<RM>>,
}

impl<RM> Debug for PooledResource<RM>
where
    RM: DatabasePool,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Resource: {:?}", self.resource)
    }
}

impl<RM> Drop for PooledResource<RM>
where
    RM: DatabasePool,
{
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            if resource.0.load(Ordering::SeqCst) {
                RM::drop(resource.1);
            } else if let Ok(mut queue) = self.pool.queue.lock() {
                queue.push(resource);
            }

            self.pool.in_use.fetch_sub(1, Ordering::AcqRel);

            // Notify a waiting thread
            self.pool.waiter.notify_one();
        }
    }
}

impl<RM> Deref for PooledResource<RM>
where
    RM: DatabasePool,
{
    type Target = RM::Connection;

    fn deref(&self) -> &Self::Target {
        &self.resource.as_ref().expect("resource already dropped").1
    }
}

impl<RM> DerefMut for PooledResource<RM>
where
    RM: DatabasePool,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.resource.as_mut().expect("resource already dropped").1
    }
}

impl<RM> Pool<RM>
where
    RM: DatabasePool,
{
    /// Creates a new pool
    pub fn new(config: RM::Config) -> Arc<Self> {
        Arc::new(Self {
            default_timeout: config.default_timeout(),
            max_size: config.max_size(),
            config,
            queue: Default::default(),
            in_use: Default::default(),
            waiter: Default::default(),
        })
    }

    /// The configuration the pool creates resources with
    pub fn config(&self) -> &RM::Config {
        &self.config
    }

    /// How many resources are currently handed out
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }

    /// Similar to get_timeout but uses the default timeout value.
    #[inline(always)]
    pub fn get(self: &Arc<Self>) -> Result<PooledResource<RM>, Error<RM::Error>> {
        self.get_timeout(self.default_timeout)
    }

    /// Get a new resource or fail after timeout is reached.
    ///
    /// This function will return a free resource or create a new one if there is still room for it;
    /// otherwise, it will wait for a resource to be released for reuse.
    pub fn get_timeout(
        self: &Arc<Self>,
        timeout: Duration,
    ) -> Result<PooledResource<RM>, Error<RM::Error>> {
        let mut resources = self.queue.lock().map_err(|_| Error::Poison)?;
        let time = Instant::now();

        loop {
            while let Some((stale, resource)) = resources.pop() {
                if stale.load(Ordering::SeqCst) {
                    RM::drop(resource);
                    continue;
                }

                // The counter moves before the lock is released, otherwise another thread could
                // observe room in the pool and open a connection beyond `max_size`. For in-memory
                // SQLite every extra connection would be a different, empty database.
                self.in_use.fetch_add(1, Ordering::AcqRel);
                drop(resources);

                return Ok(PooledResource {
                    resource: Some((stale, resource)),
                    pool: self.clone(),
                });
            }

            if self.in_use.load(Ordering::Relaxed) < self.max_size {
                self.in_use.fetch_add(1, Ordering::AcqRel);
                drop(resources);

                let stale: Arc<AtomicBool> = Arc::new(false.into());
                return match RM::new_resource(&self.config, stale.clone(), timeout) {
                    Ok(new_resource) => Ok(PooledResource {
                        resource: Some((stale, new_resource)),
                        pool: self.clone(),
                    }),
                    Err(e) => {
                        self.in_use.fetch_sub(1, Ordering::AcqRel);
                        self.waiter.notify_one();
                        Err(e)
                    }
                };
            }

            let remaining = timeout.saturating_sub(time.elapsed());
            let (lock, timeout_result) = self
                .waiter
                .wait_timeout(resources, remaining)
                .map_err(|_| Error::Poison)?;

            if timeout_result.timed_out()
                && lock.is_empty()
                && self.in_use.load(Ordering::Relaxed) >= self.max_size
            {
                tracing::warn!(
                    "Timeout waiting for the resource (pool size: {}). Waited {} ms",
                    self.max_size,
                    time.elapsed().as_millis()
                );
                return Err(Error::Timeout);
            }

            resources = lock;
        }
    }
}

impl<RM> Drop for Pool<RM>
where
    RM: DatabasePool,
{
    fn drop(&mut self) {
        if let Ok(mut resources) = self.queue.lock() {
            while let Some(resource) = resources.pop() {
                RM::drop(resource.1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::test_utils::{RecordingConfig, RecordingPool};

    #[test]
    fn test_pool_reuses_released_connections() {
        let pool = Pool::<RecordingPool>::new(RecordingConfig::new(2));

        let first = pool.get().expect("first connection");
        let first_id = first.id;
        drop(first);

        let second = pool.get().expect("reused connection");
        assert_eq!(second.id, first_id);
        assert_eq!(pool.in_use(), 1);
    }

    #[test]
    fn test_pool_times_out_when_exhausted() {
        let pool = Pool::<RecordingPool>::new(RecordingConfig::new(1));

        let _held = pool.get().expect("only connection");
        let err = pool
            .get_timeout(Duration::from_millis(20))
            .expect_err("pool is exhausted");

        assert!(matches!(err, Error::Timeout));
    }

    #[test]
    fn test_pool_wakes_up_waiters() {
        let pool = Pool::<RecordingPool>::new(RecordingConfig::new(1));
        let held = pool.get().expect("only connection");

        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || pool.get_timeout(Duration::from_secs(5)).map(|conn| conn.id))
        };

        thread::sleep(Duration::from_millis(20));
        let held_id = held.id;
        drop(held);

        let waited_id = waiter
            .join()
            .expect("thread finished")
            .expect("connection released in time");
        assert_eq!(waited_id, held_id);
    }

    #[test]
    fn test_stale_connections_are_discarded() {
        let pool = Pool::<RecordingPool>::new(RecordingConfig::new(1));

        let conn = pool.get().expect("connection");
        let stale_id = conn.id;
        conn.mark_stale();
        drop(conn);

        let fresh = pool.get().expect("new connection");
        assert_ne!(fresh.id, stale_id);
    }
}
