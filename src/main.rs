// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use auditrs::config::settings::Settings;
use auditrs::domain::services::thematic_scorer::ThematicScorer;
use auditrs::engines::http_provider::HttpProviderClient;
use auditrs::infrastructure::database::connection;
use auditrs::infrastructure::metrics;
use auditrs::infrastructure::repositories::audit_repo_impl::AuditRepositoryImpl;
use auditrs::infrastructure::repositories::geo_grid_repo_impl::GeoGridRepositoryImpl;
use auditrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use auditrs::infrastructure::repositories::scan_repo_impl::ScanRepositoryImpl;
use auditrs::presentation::routes::{self, AppJobQueue};
use auditrs::utils::telemetry;
use auditrs::workers::audit_executor::AuditExecutor;
use auditrs::workers::geo_grid_executor::GeoGridExecutor;
use auditrs::workers::job_worker::JobHandlers;
use auditrs::workers::manager::WorkerManager;
use auditrs::workers::scan_executor::ScanExecutor;
use auditrs::workers::watchdog_worker::WatchdogWorker;
use axum::Extension;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting auditrs...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Repositories, queue and provider client
    let audit_repo = Arc::new(AuditRepositoryImpl::new(db.clone()));
    let scan_repo = Arc::new(ScanRepositoryImpl::new(db.clone()));
    let grid_repo = Arc::new(GeoGridRepositoryImpl::new(db.clone()));
    let job_repo = Arc::new(JobRepositoryImpl::new(db.clone()));
    let queue: Arc<AppJobQueue> = Arc::new(AppJobQueue::new(
        job_repo,
        chrono::Duration::seconds(settings.workers.lock_lease_seconds),
    ));
    let provider = Arc::new(HttpProviderClient::new(&settings.provider)?);
    let scorer = ThematicScorer::new(settings.scoring.clone());

    // 5. Start workers
    let handlers = JobHandlers {
        audit: Arc::new(AuditExecutor::new(
            audit_repo.clone(),
            provider.clone(),
            provider.clone(),
            provider.clone(),
            scorer.clone(),
            settings.audit.clone(),
        )),
        scan: Arc::new(ScanExecutor::new(
            scan_repo.clone(),
            provider.clone(),
            queue.clone(),
            settings.scan.clone(),
        )),
        geo_grid: Arc::new(GeoGridExecutor::new(grid_repo.clone(), provider.clone())),
    };

    let mut worker_manager = WorkerManager::new();
    worker_manager.start_job_workers(
        settings.workers.count,
        queue.clone(),
        handlers,
        Duration::from_millis(settings.workers.idle_poll_interval_ms),
    );

    if settings.watchdog.enabled {
        worker_manager.spawn(Arc::new(WatchdogWorker::new(
            audit_repo.clone(),
            scan_repo.clone(),
            grid_repo.clone(),
            queue.clone(),
            settings.watchdog.clone(),
        )));
    }

    // 6. Start HTTP server
    let app = routes::routes()
        .layer(Extension(audit_repo))
        .layer(Extension(scan_repo))
        .layer(Extension(grid_repo))
        .layer(Extension(queue))
        .layer(Extension(settings.audit.clone()))
        .layer(Extension(settings.scan.clone()))
        .layer(Extension(settings.geo_grid.clone()))
        .layer(Extension(scorer))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Unable to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    worker_manager.shutdown();
    Ok(())
}
