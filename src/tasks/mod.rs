//! Background jobs.
//!
//! `spawn_all` is called once at startup and detaches each loop with
//! `tokio::spawn`.

use std::time::Duration;

use crate::services::{AuthService, ReconciliationService};

pub fn spawn_all(
    reconciliation_service: ReconciliationService,
    auth_service: AuthService,
    reconcile_interval: Duration,
    purge_interval: Duration,
) {
    // 定期对账
    {
        let svc = reconciliation_service.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(reconcile_interval).await;
                match svc.run().await {
                    Ok(report) if report.issues_recorded > 0 => log::warn!(
                        "Reconciliation recorded {} new consistency issues",
                        report.issues_recorded
                    ),
                    Ok(_) => {}
                    Err(e) => log::error!("Reconciliation failed: {e:?}"),
                }
            }
        });
    }

    // 清理过期未验证账号
    {
        let svc = auth_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.purge_unverified().await {
                    Ok(n) if n > 0 => log::info!("Purged unverified accounts: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to purge unverified accounts: {e:?}"),
                }
                tokio::time::sleep(purge_interval).await;
            }
        });
    }
}
