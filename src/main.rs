//! CROJ Judge - Application Entry Point
//!
//! This is the main entry point for the submission lifecycle server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use redis::Client as RedisClient;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use croj_judge::{
    config::{CONFIG, DispatchFailurePolicy, DispatchMode},
    constants::TIMEOUT_SWEEP_INTERVAL_SECS,
    create_router,
    db::{
        self, MemoryStore, ProblemStore, SubmissionStore, UserStore,
        repositories::{ProblemRepository, SubmissionRepository, UserRepository},
    },
    judge::{
        Dispatcher, FailoverDispatcher, LocalSimulationDispatcher, QueueDispatcher, RandomOutcome,
        ResultApplier, ResultConsumer, TimeoutSweeper,
    },
    services::{StatsService, SubmissionService},
    state::AppState,
};

type Stores = (
    Arc<dyn SubmissionStore>,
    Arc<dyn ProblemStore>,
    Arc<dyn UserStore>,
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| CONFIG.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CROJ judge server...");

    let shutdown = Arc::new(AtomicBool::new(false));
    let (submissions, problems, users) = connect_stores().await?;

    let applier = Arc::new(ResultApplier::new(submissions.clone(), problems.clone()));
    let judge = &CONFIG.judge;
    let simulator = || -> Arc<dyn Dispatcher> {
        Arc::new(LocalSimulationDispatcher::new(
            applier.clone(),
            Arc::new(RandomOutcome),
            judge.simulation_min_delay_ms,
            judge.simulation_max_delay_ms,
        ))
    };

    let dispatcher: Arc<dyn Dispatcher> = match judge.dispatch_mode {
        DispatchMode::Simulate => {
            tracing::info!("Judging in local simulation mode");
            simulator()
        }
        DispatchMode::Queue => {
            tracing::info!("Connecting to Redis...");
            let redis_client = RedisClient::open(CONFIG.redis.url.as_str())?;
            let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;

            let consumer =
                ResultConsumer::new(redis_conn.clone(), applier.clone(), judge, shutdown.clone());
            tokio::spawn(async move {
                if let Err(e) = consumer.run().await {
                    tracing::error!(error = %e, "Judge result consumer stopped");
                }
            });

            let queue: Arc<dyn Dispatcher> =
                Arc::new(QueueDispatcher::new(redis_conn, judge.queue_stream.clone()));
            match judge.failure_policy {
                DispatchFailurePolicy::Reject => queue,
                DispatchFailurePolicy::Simulate => {
                    Arc::new(FailoverDispatcher::new(queue, simulator()))
                }
            }
        }
    };

    if judge.timeout_secs > 0 {
        let sweeper = TimeoutSweeper::new(submissions.clone(), applier.clone(), judge.timeout_secs);
        tokio::spawn(sweeper.run(
            Duration::from_secs(TIMEOUT_SWEEP_INTERVAL_SECS),
            shutdown.clone(),
        ));
    }

    // Create application state
    let stats = Arc::new(StatsService::new(submissions.clone()));
    let service = Arc::new(SubmissionService::new(
        submissions,
        problems,
        users,
        dispatcher,
        stats.clone(),
    ));
    let state = AppState::new(service, stats, CONFIG.jwt.clone());

    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::new(CONFIG.server.host.parse()?, CONFIG.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.store(true, Ordering::SeqCst);
    tracing::info!("Server stopped");

    Ok(())
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise the in-memory store
async fn connect_stores() -> anyhow::Result<Stores> {
    match &CONFIG.database.url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(url, CONFIG.database.max_connections).await?;
            db::test_connection(&pool).await?;

            tracing::info!("Running database migrations...");
            db::run_migrations(&pool).await?;

            let submissions: Arc<dyn SubmissionStore> =
                Arc::new(SubmissionRepository::new(pool.clone()));
            let problems: Arc<dyn ProblemStore> = Arc::new(ProblemRepository::new(pool.clone()));
            let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool));
            Ok((submissions, problems, users))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            let store = Arc::new(MemoryStore::new());
            let submissions: Arc<dyn SubmissionStore> = store.clone();
            let problems: Arc<dyn ProblemStore> = store.clone();
            let users: Arc<dyn UserStore> = store;
            Ok((submissions, problems, users))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
