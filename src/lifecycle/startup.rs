//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration into per-instance settings
//! - Load TLS material for every instance before any listener opens
//! - Run all instances until a signal or the first instance exit
//!
//! # Design Decisions
//! - Fail fast: any configuration or certificate error is fatal
//! - One instance failing stops the others

use std::net::SocketAddr;
use tokio::task::JoinSet;

use crate::config::schema::MetricsConfig;
use crate::config::{settings, FileConfig};
use crate::error::Error;
use crate::http::ProxyInstance;
use crate::lifecycle::{signals, Shutdown};
use crate::net::tls;
use crate::observability::metrics;

/// Start the Prometheus exporter when an address is configured.
pub fn install_metrics(config: &MetricsConfig) -> Result<(), Error> {
    let Some(address) = &config.address else {
        return Ok(());
    };
    let addr: SocketAddr = address.parse().map_err(|source| Error::MetricsAddress {
        address: address.clone(),
        source,
    })?;
    metrics::init_metrics(addr)?;
    Ok(())
}

/// Run every configured proxy instance until shutdown.
pub async fn run(config: FileConfig) -> Result<(), Error> {
    let instances = settings::instances(&config)?;
    tls::install_crypto_provider();

    let mut prepared = Vec::with_capacity(instances.len());
    for settings in instances {
        let tls = tls::load_tls_config(&settings.cert, &settings.key)
            .await
            .map_err(|source| Error::Tls {
                proxy: settings.name.clone(),
                source,
            })?;
        prepared.push((ProxyInstance::new(settings), tls));
    }

    let shutdown = Shutdown::new();
    let mut tasks = JoinSet::new();
    for (instance, tls) in prepared {
        tasks.spawn(instance.serve(tls, shutdown.subscribe()));
    }
    tracing::info!(instances = tasks.len(), "Proxy instances started");

    let first = tokio::select! {
        _ = signals::wait_for_shutdown() => None,
        Some(joined) = tasks.join_next() => Some(joined),
    };

    let mut outcome = Ok(());
    if let Some(joined) = first {
        match flatten(joined) {
            Ok(()) => tracing::warn!("Proxy instance stopped unexpectedly"),
            Err(e) => {
                tracing::error!(error = %e, "Proxy instance failed");
                outcome = Err(e);
            }
        }
    }

    shutdown.trigger();
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = flatten(joined) {
            tracing::error!(error = %e, "Proxy instance failed during shutdown");
            if outcome.is_ok() {
                outcome = Err(e);
            }
        }
    }

    tracing::info!("Shutdown complete");
    outcome
}

fn flatten(joined: Result<Result<(), Error>, tokio::task::JoinError>) -> Result<(), Error> {
    joined?
}
