//! The message ingestion and decomposition pipeline: decode the raw bytes
//! into a tree, classify its parts, extract links, plan the forwarding
//! actions, and execute them against the external collaborators.

pub mod classify;
pub mod decode;
pub mod links;
pub mod plan;

use std::net::SocketAddr;
use std::path::PathBuf;

use md5::{Digest, Md5};

use crate::{
    error::{DeliveryError, PipelineError},
    internal,
    notify::Notify,
    staging::Staging,
};

use self::plan::{Action, ForwardingPlan};

/// One accepted SMTP transaction, as handed over by the session. Owned
/// exclusively by that transaction's processing task and discarded when
/// processing completes, success or failure.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub peer: SocketAddr,
    pub sender: String,
    pub recipients: Vec<String>,
    pub data: Vec<u8>,
}

/// Entry point invoked once per accepted transaction.
///
/// Never propagates an error: a single malformed or hostile inbound
/// message must not abort the listener or affect any other session.
pub async fn handle(raw: RawMessage, notifier: &dyn Notify, staging: &Staging, channel: &str) {
    let peer = raw.peer;

    if let Err(err) = process(raw, notifier, staging, channel).await {
        internal!(level = ERROR, "Failed to process message from {peer}: {err}");
    }
}

async fn process(
    raw: RawMessage,
    notifier: &dyn Notify,
    staging: &Staging,
    channel: &str,
) -> Result<(), PipelineError> {
    let tree = decode::decode(&raw.data)?;
    let parts = classify::classify(&tree);

    let links = parts
        .body
        .as_ref()
        .map(|body| links::extract(&body.content, body.kind))
        .unwrap_or_default();

    let subject = tree.header("subject").unwrap_or_default().to_string();
    let plan = plan::plan(raw, subject, parts, links);

    execute(plan, notifier, staging, channel).await?;

    Ok(())
}

/// Run the plan's actions in order, short-circuiting the rest of this
/// message (but not the listener) on the first failure. A staged file is
/// removed even when its upload fails.
async fn execute(
    plan: ForwardingPlan,
    notifier: &dyn Notify,
    staging: &Staging,
    channel: &str,
) -> Result<(), DeliveryError> {
    let summary = plan.summary.render();
    let mut staged: Option<PathBuf> = None;

    for action in plan.actions {
        let result = match action {
            Action::PostSummary => notifier.post_text(channel, &summary).await,
            Action::PostLink(link) => notifier.post_text(channel, &link).await,
            Action::Stage { filename, payload } => staging
                .stage(&filename, &payload)
                .await
                .map(|path| staged = Some(path)),
            Action::Upload { filename, payload } => {
                let digest = format!("{:x}", Md5::digest(&payload));
                let result = notifier
                    .upload_file(channel, &filename, payload, Some(digest))
                    .await;

                // Best effort cleanup, whether or not the upload went
                // through: staged files must not leak.
                if let Some(path) = staged.take() {
                    staging.remove(&path).await;
                }

                result
            }
            Action::UploadRaw { filename, payload } => {
                notifier.upload_file(channel, &filename, payload, None).await
            }
        };

        if let Err(err) = result {
            if let Some(path) = staged.take() {
                staging.remove(&path).await;
            }
            return Err(err);
        }
    }

    Ok(())
}
