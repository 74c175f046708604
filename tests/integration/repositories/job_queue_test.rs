// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::setup_db;
use auditrs::domain::models::job::{Job, JobStatus, JobType};
use auditrs::domain::repositories::job_repository::JobRepository;
use auditrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use auditrs::queue::job_queue::{JobQueue, PostgresJobQueue};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

async fn queue_with_lease(
    lease: chrono::Duration,
) -> (Arc<JobRepositoryImpl>, PostgresJobQueue<JobRepositoryImpl>) {
    let repo = Arc::new(JobRepositoryImpl::new(setup_db().await));
    let queue = PostgresJobQueue::new(repo.clone(), lease);
    (repo, queue)
}

#[tokio::test]
async fn test_dequeue_locks_job_and_counts_attempt() {
    let (repo, queue) = queue_with_lease(chrono::Duration::minutes(10)).await;
    let job = queue.enqueue(Job::audit(Uuid::new_v4(), false)).await.unwrap();

    let worker = Uuid::new_v4();
    let acquired = queue.dequeue(worker).await.unwrap().unwrap();
    assert_eq!(acquired.id, job.id);
    assert_eq!(acquired.job_type, JobType::Audit);
    assert_eq!(acquired.status, JobStatus::Active);
    assert_eq!(acquired.attempt_count, 1);
    assert_eq!(acquired.lock_token, Some(worker));

    // 已锁定的任务不会被再次取出
    assert!(queue.dequeue(Uuid::new_v4()).await.unwrap().is_none());

    queue.complete(job.id).await.unwrap();
    let stored = repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert!(stored.lock_token.is_none());
}

#[tokio::test]
async fn test_delayed_job_is_not_visible_until_due() {
    let (_, queue) = queue_with_lease(chrono::Duration::minutes(10)).await;
    queue
        .enqueue(Job::site_scan_poll(Uuid::new_v4(), 1, chrono::Duration::minutes(5)))
        .await
        .unwrap();

    assert!(queue.dequeue(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reschedule_makes_job_available_again() {
    let (repo, queue) = queue_with_lease(chrono::Duration::minutes(10)).await;
    let job = queue.enqueue(Job::geo_grid(Uuid::new_v4())).await.unwrap();
    queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();

    queue.reschedule(job.id, Duration::ZERO).await.unwrap();
    let stored = repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Queued);

    let again = queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(again.attempt_count, 2);
}

/// 锁过期的任务被看门狗重新投递
#[tokio::test]
async fn test_expired_lock_is_released() {
    let (repo, queue) = queue_with_lease(chrono::Duration::seconds(-1)).await;
    let job = queue.enqueue(Job::site_scan(Uuid::new_v4())).await.unwrap();
    queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();

    assert_eq!(queue.reset_stuck_jobs().await.unwrap(), 1);
    let stored = repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Queued);
    assert!(stored.lock_expires_at.is_none());
}

#[tokio::test]
async fn test_failed_job_is_terminal() {
    let (repo, queue) = queue_with_lease(chrono::Duration::minutes(10)).await;
    let job = queue.enqueue(Job::audit(Uuid::new_v4(), true)).await.unwrap();
    queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();

    queue.fail(job.id).await.unwrap();

    assert_eq!(
        repo.find_by_id(job.id).await.unwrap().unwrap().status,
        JobStatus::Failed
    );
    assert!(queue.dequeue(Uuid::new_v4()).await.unwrap().is_none());
}
