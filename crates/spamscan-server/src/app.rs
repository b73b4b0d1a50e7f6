use std::sync::Arc;

use anyhow::{Context, Result};
use rocket::figment::Provider;
use rocket::{Build, Config, Rocket};
use spamscan_ai::{ModelHandle, ModelResolver, OnnxLoader};
use tracing::info;

use crate::{args::Args, cors::Cors, routes, service::InferenceService};

/// Assemble the rocket instance around an already-built service.
pub fn build<P: Provider>(service: Arc<InferenceService>, config: P) -> Rocket<Build> {
    rocket::custom(config)
        .attach(Cors)
        .manage(service)
        .mount("/", routes::routes())
        .mount("/", crate::cors::routes())
        .register("/", routes::catchers())
}

/// Resolve the model. Runs to completion before the server binds.
pub async fn resolve_model(args: &Args) -> Result<ModelHandle> {
    let resolver = ModelResolver::new(args.model_dir.clone(), args.fallback_model.clone());
    let loader = OnnxLoader::new(args.hub_weights_file.clone());

    let resolution = tokio::task::spawn_blocking(move || resolver.resolve(&loader))
        .await
        .context("model resolution task panicked")??;

    for attempt in &resolution.attempts {
        info!(%attempt, "resolution attempt");
    }
    Ok(resolution.handle)
}

pub async fn run(args: Args) -> Result<()> {
    info!(
        model_dir = %args.model_dir.display(),
        fallback_model = %args.fallback_model,
        hub_weights_file = %args.hub_weights_file,
        "loading model"
    );
    let handle = resolve_model(&args).await?;

    let service = Arc::new(InferenceService::new(
        handle,
        &args.spam_labels(),
        args.inference_timeout(),
    )?);
    info!(
        model_source = service.model_source(),
        spam_label = service.spam_label(),
        "inference service ready"
    );

    let figment = Config::figment()
        .merge(("port", args.port))
        .merge(("address", args.host.clone()));

    info!("Server ready on {}:{}", args.host, args.port);

    build(service, figment)
        .launch()
        .await
        .map_err(|err| anyhow::anyhow!("rocket failed: {err}"))?;

    Ok(())
}
