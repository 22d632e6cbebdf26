use std::{sync::Arc, time::Duration};

use build_core::{
    crds::{Build, CnbBuild},
    models::{MANAGED_BY_LABEL, MANAGED_BY_VALUE},
    registry::metadata::MetadataRetriever,
};
use futures::StreamExt;
use kube::{
    Api, Client,
    runtime::{
        Controller,
        controller::{self, Action},
        watcher,
    },
};
use tracing::{debug, error, info, warn};

use crate::{
    config::ReconcilerConfig,
    error::AppError,
    services::{
        reconciler::Reconciler,
        stores::{BuildRequestStore, DerivedBuildStore},
    },
};

struct Context<B, D, M> {
    reconciler: Reconciler<B, D, M>,
    cfg: ReconcilerConfig,
}

/// Drives the reconciler from watch events on CNBBuilds and the Builds they own.
///
/// kube's controller queue never runs two reconciles for the same object at once,
/// while different objects proceed concurrently up to `cfg.concurrency`.
pub async fn start_controller<B, D, M>(
    client: Client,
    reconciler: Reconciler<B, D, M>,
    cfg: ReconcilerConfig,
) -> Result<(), AppError>
where
    B: BuildRequestStore + 'static,
    D: DerivedBuildStore + 'static,
    M: MetadataRetriever + 'static,
{
    let cnb_builds: Api<CnbBuild> = Api::all(client.clone());
    let builds: Api<Build> = Api::all(client);

    let owned_config =
        watcher::Config::default().labels(&format!("{MANAGED_BY_LABEL}={MANAGED_BY_VALUE}"));
    let controller_config = controller::Config::default().concurrency(cfg.concurrency);

    let context = Arc::new(Context { reconciler, cfg });

    info!("🔍 Starting CNBBuild controller");

    Controller::new(cnb_builds, watcher::Config::default())
        .owns(builds, owned_config)
        .with_config(controller_config)
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => debug!(object = %object, "Reconcile finished"),
                Err(e) => warn!(error = %e, "⚠️ Controller error"),
            }
        })
        .await;

    warn!("❌ CNBBuild controller stream ended");

    Ok(())
}

async fn reconcile<B, D, M>(
    cnb_build: Arc<CnbBuild>,
    ctx: Arc<Context<B, D, M>>,
) -> Result<Action, AppError>
where
    B: BuildRequestStore,
    D: DerivedBuildStore,
    M: MetadataRetriever,
{
    ctx.reconciler.reconcile(&cnb_build.key()).await?;

    Ok(Action::requeue(Duration::from_secs(
        ctx.cfg.requeue_after_secs,
    )))
}

fn error_policy<B, D, M>(
    cnb_build: Arc<CnbBuild>,
    error: &AppError,
    ctx: Arc<Context<B, D, M>>,
) -> Action {
    let Some(delay) = requeue_delay(error, &ctx.cfg) else {
        error!(
            key = %cnb_build.key(),
            error = %error,
            "❌ Reconcile failed, waiting for the object to change"
        );
        return Action::await_change();
    };

    warn!(
        key = %cnb_build.key(),
        error = %error,
        "⚠️ Reconcile failed, retrying in {}s",
        delay.as_secs()
    );

    Action::requeue(delay)
}

/// `None` when retrying without a change to the object cannot help.
fn requeue_delay(error: &AppError, cfg: &ReconcilerConfig) -> Option<Duration> {
    match error {
        AppError::Conflict(_) => Some(Duration::from_secs(cfg.conflict_requeue_secs)),
        e if e.is_retryable() => Some(Duration::from_secs(cfg.error_requeue_secs)),
        _ => None,
    }
}
