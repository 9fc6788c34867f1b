// Scheduled Executor for periodic background tasks
// Owned by the process lifecycle: constructed, spawned, and stopped through its handle

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A trait for tasks that run periodically
pub trait ScheduledTask: Send + Sync + 'static {
    /// Execute one round of the task
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>>;

    /// Check if the task should terminate
    /// Default: never terminate (run forever)
    fn should_terminate(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}

/// Scheduled executor for running periodic tasks
pub struct ScheduledExecutor {
    interval: Duration,
    task_name: String,
    shutdown: CancellationToken,
}

impl ScheduledExecutor {
    /// Create a new scheduled executor
    ///
    /// # Arguments
    /// * `task_name` - Name of the task (for logging)
    /// * `interval` - Delay between the end of one run and the start of the next
    pub fn new(task_name: impl Into<String>, interval: Duration) -> Self {
        Self {
            task_name: task_name.into(),
            interval,
            shutdown: CancellationToken::new(),
        }
    }

    /// Tie the executor to an outer token (e.g. process shutdown)
    pub fn with_shutdown(mut self, parent: &CancellationToken) -> Self {
        self.shutdown = parent.child_token();
        self
    }

    pub fn shutdown_handle(&self) -> ScheduledExecutorHandle {
        ScheduledExecutorHandle {
            shutdown: self.shutdown.clone(),
            join: None,
        }
    }

    /// Run the task until shutdown is requested or `should_terminate()` returns true.
    ///
    /// The first run happens one interval after start. A failing run is logged
    /// and does not stop the schedule.
    pub async fn start<T>(self, task: T)
    where
        T: ScheduledTask,
    {
        let task_name = self.task_name;
        let shutdown = self.shutdown;

        tracing::info!("Starting scheduled task '{}' with interval: {:?}", task_name, self.interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            if task.should_terminate() {
                break;
            }

            tracing::debug!("Executing scheduled task '{}'", task_name);
            match task.run().await {
                Ok(()) => {
                    tracing::debug!("Scheduled task '{}' completed successfully", task_name);
                },
                Err(e) => {
                    tracing::error!("Scheduled task '{}' failed: {}", task_name, e);
                },
            }

            if task.should_terminate() {
                break;
            }
        }

        tracing::info!("Scheduled task '{}' stopped", task_name);
    }

    /// Spawn the schedule on the runtime and return immediately
    pub fn spawn<T>(self, task: T) -> ScheduledExecutorHandle
    where
        T: ScheduledTask,
    {
        let mut handle = self.shutdown_handle();
        handle.join = Some(tokio::spawn(self.start(task)));
        handle
    }
}

/// Handle to stop a scheduled executor
pub struct ScheduledExecutorHandle {
    shutdown: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl ScheduledExecutorHandle {
    /// Signal the executor to stop; an in-flight run finishes first
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    #[allow(dead_code)]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Signal shutdown and wait for the loop to exit
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                tracing::error!("Scheduled task panicked during shutdown: {}", e);
            }
        }
    }
}

/// Implement ScheduledTask for a type with an async `&self` method
///
/// ```ignore
/// impl KeepAliveTask {
///     async fn execute(&self) -> Result<(), anyhow::Error> { Ok(()) }
/// }
///
/// impl_scheduled_task!(KeepAliveTask, "keep-alive", execute);
/// ```
#[macro_export]
macro_rules! impl_scheduled_task {
    ($type:ty, $name:expr, $method:ident) => {
        impl $crate::utils::ScheduledTask for $type {
            fn run(
                &self,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = Result<(), anyhow::Error>> + Send + '_>,
            > {
                Box::pin(async move { self.$method().await })
            }

            fn name(&self) -> &str {
                $name
            }
        }
    };
}
