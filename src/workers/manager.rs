// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::job_queue::JobQueue;
use crate::workers::job_worker::{JobHandlers, JobWorker};
use crate::workers::worker::Worker;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
#[derive(Default)]
pub struct WorkerManager {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在独立任务中运行一个工作器
    pub fn spawn(&mut self, worker: Arc<dyn Worker>) {
        let handle = tokio::spawn(async move {
            if let Err(e) = worker.run().await {
                error!("Worker {} stopped: {}", worker.name(), e);
            }
        });
        self.handles.push(handle);
    }

    /// 启动任务工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    /// * `queue` - 共享的任务队列
    /// * `handlers` - 按任务类型路由的执行器
    /// * `idle_poll_interval` - 队列为空时的等待时间
    pub fn start_job_workers<Q>(
        &mut self,
        count: usize,
        queue: Arc<Q>,
        handlers: JobHandlers,
        idle_poll_interval: Duration,
    ) where
        Q: JobQueue + 'static,
    {
        for _ in 0..count {
            let worker = JobWorker::new(queue.clone(), handlers.clone(), idle_poll_interval);
            self.spawn(Arc::new(worker));
        }
        info!("Started {} job workers", count);
    }

    /// 正在运行的工作器数量
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 终止所有工作器
    pub fn shutdown(&mut self) {
        info!("Shutting down workers...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Workers shut down successfully");
    }

    /// 等待关闭信号并关闭工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockJobQueue;
    use crate::utils::errors::WorkerError;
    use crate::workers::worker::JobHandler;
    use crate::domain::models::job::Job;
    use async_trait::async_trait;

    struct NoopHandler;

    #[async_trait]
    impl JobHandler for NoopHandler {
        async fn handle(&self, _job: &Job) -> Result<(), WorkerError> {
            Ok(())
        }

        async fn abandon(&self, _job: &Job, _reason: &str) -> Result<(), WorkerError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_start_and_shutdown_job_workers() {
        let mut queue = MockJobQueue::new();
        queue.expect_dequeue().returning(|_| Ok(None));
        let handler: Arc<dyn JobHandler> = Arc::new(NoopHandler);
        let handlers = JobHandlers {
            audit: handler.clone(),
            scan: handler.clone(),
            geo_grid: handler,
        };

        let mut manager = WorkerManager::new();
        manager.start_job_workers(3, Arc::new(queue), handlers, Duration::from_millis(5));
        assert_eq!(manager.len(), 3);

        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.shutdown();
        assert!(manager.is_empty());
    }
}
