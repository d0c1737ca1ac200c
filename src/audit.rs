use tokio::sync::mpsc;

use crate::models::AuditRecord;

// Background worker - drains the audit queue and logs each record.
// Handlers push with try_send and drop the record if the queue is full
// or the worker is gone, so admission never waits on this path.
pub async fn audit_worker(mut rx: mpsc::Receiver<AuditRecord>) {
    println!("Audit worker started");

    while let Some(record) = rx.recv().await {
        println!(
            "[Audit] {} identity={} endpoint={} origin={} status={} latency={}ms",
            record.at.to_rfc3339(),
            record.identity,
            record.endpoint,
            record.origin,
            record.status,
            record.latency_ms
        );
    }
}
