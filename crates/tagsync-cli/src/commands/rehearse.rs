use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tagsync_config::SyncConfig;
use tagsync_core::TagSet;
use tagsync_engine::{InMemoryTagApi, SyncOutcome, TagSynchronizer};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::info;

use crate::cli::{OutputFormat, RehearseArgs};
use crate::document::{read_tags, read_tags_or_stdin};
use crate::output::{print_field, print_json, print_success, print_table};

/// Runs a full synchronization against an in-memory resource, honouring the
/// service's retry window. Ctrl-C cancels a pending retry loop.
pub async fn rehearse(config: &SyncConfig, args: &RehearseArgs, format: OutputFormat) -> Result<()> {
    let binding = super::binding_for(config, &args.service)?;
    let previous = read_tags(args.previous.as_deref())?;
    let current = read_tags_or_stdin(args.current.as_deref())?;
    let remote = match args.remote.as_deref() {
        Some(path) => read_tags(Some(path))?,
        None => previous.clone(),
    };

    let api = Arc::new(InMemoryTagApi::new());
    if args.visible_after_secs > 0 {
        let visible_at = Instant::now() + Duration::from_secs(args.visible_after_secs);
        api.insert_pending_resource(args.resource_id.clone(), remote, visible_at);
    } else {
        api.insert_resource(args.resource_id.clone(), remote);
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling rehearsal");
            let _ = cancel_tx.send(true);
        }
    });

    let sync = TagSynchronizer::new(binding, api.clone()).with_cancellation(cancel_rx);
    let outcome = sync
        .sync(&args.resource_id, &previous, &current)
        .await
        .with_context(|| format!("Rehearsal for {} on {} failed", args.resource_id, args.service))?;
    let remote = api.tags(&args.resource_id).unwrap_or_default();

    match format {
        OutputFormat::Json => print_json(&json!({
            "resource_id": args.resource_id,
            "service": args.service,
            "deleted": outcome.deleted,
            "upserted": outcome.upserted,
            "attempts": outcome.attempts,
            "remote_tags": remote,
        })),
        OutputFormat::Table => {
            print_outcome(&args.resource_id, &outcome, &remote);
            Ok(())
        }
    }
}

fn print_outcome(resource_id: &str, outcome: &SyncOutcome, remote: &TagSet) {
    if outcome.is_noop() {
        print_success(&format!("{resource_id} already up to date"));
    } else {
        print_success(&format!(
            "{resource_id}: {} deleted, {} upserted in {} call(s)",
            outcome.deleted.len(),
            outcome.upserted.len(),
            outcome.attempts
        ));
    }

    print_field("Remote tags", remote.len());
    let rows = remote
        .iter()
        .map(|(key, value)| vec![key.to_string(), value.to_string()])
        .collect();
    print_table(&["Key", "Value"], rows);
}
