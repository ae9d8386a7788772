use crate::generator::profile::{build_candidates_from_config, GeneratorConfig};
use crate::gui_bridge::model::OverviewModel;
use crate::workflow::runner::Runner;
use anyhow::{anyhow, Result};
use candcore::Candidate;
use log::warn;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

pub fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct WarpError;

impl warp::reject::Reject for WarpError {}

type SharedModel = Arc<RwLock<OverviewModel>>;

/// Runs a batch through the workflow and swaps the result into the shared model.
fn process_batch(
    runner: &Runner,
    state: &SharedModel,
    candidates: &[Candidate],
) -> Result<OverviewModel> {
    let result = runner.execute(candidates)?;
    let model = OverviewModel::from_result(&result);
    let mut guard = state
        .write()
        .map_err(|_| anyhow!("overview state lock poisoned"))?;
    *guard = model.clone();
    Ok(model)
}

/// Holds the latest overview and exposes it to an external renderer over HTTP.
pub struct GuiBridge {
    state: SharedModel,
    runner: Arc<Runner>,
}

impl GuiBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            state: Arc::new(RwLock::new(OverviewModel::default())),
            runner,
        }
    }

    /// Binds the HTTP endpoint and serves it from a background thread.
    ///
    /// Bind failures are returned here; the returned address is the one
    /// actually bound, which differs from `addr` when port 0 is requested.
    pub fn spawn(&self, addr: SocketAddr) -> Result<SocketAddr> {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());

        let get_route = warp::path("overview")
            .and(warp::get())
            .and(state_filter.clone())
            .and_then(|state: SharedModel| async move {
                match state.read() {
                    Ok(guard) => Ok(warp::reply::json(&*guard)),
                    Err(_) => {
                        warn!("overview state lock poisoned");
                        Err(warp::reject::custom(WarpError))
                    }
                }
            });

        let post_route = warp::path("ingest")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter.clone())
            .and(runner_filter.clone())
            .and_then(
                |candidates: Vec<Candidate>, state: SharedModel, runner: Arc<Runner>| async move {
                    match process_batch(&runner, &state, &candidates) {
                        Ok(model) => Ok::<_, warp::Rejection>(warp::reply::with_status(
                            warp::reply::json(&json!({
                                "status": "ok",
                                "counts": model.counts,
                            })),
                            StatusCode::OK,
                        )),
                        Err(err) => {
                            warn!("ingest error: {:#}", err);
                            Err(warp::reject::custom(WarpError))
                        }
                    }
                },
            );

        let generator_route = warp::path("ingest-config")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |config: GeneratorConfig, state: SharedModel, runner: Arc<Runner>| async move {
                    match build_candidates_from_config(&config)
                        .and_then(|candidates| process_batch(&runner, &state, &candidates))
                    {
                        Ok(model) => {
                            if let Some(name) = config.scenario.as_ref() {
                                println!(
                                    "[GUI] Scenario {} -> valid {}",
                                    name, model.counts.valid
                                );
                            }
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "counts": model.counts,
                                    "description": config.description.clone().unwrap_or_default()
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            warn!("ingest-config error: {:#}", err);
                            Err(warp::reject::custom(WarpError))
                        }
                    }
                },
            );

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| anyhow!("building bridge runtime: {}", err))?;
        let routes = get_route.or(post_route).or(generator_route);
        let (bound, server) = {
            let _context = runtime.enter();
            warp::serve(routes)
                .try_bind_ephemeral(addr)
                .map_err(|err| anyhow!("binding HTTP bridge to {}: {}", addr, err))?
        };
        thread::spawn(move || runtime.block_on(server));
        Ok(bound)
    }

    pub fn publish(&self, model: &OverviewModel) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| anyhow!("overview state lock poisoned"))?;
        *guard = model.clone();
        println!(
            "[GUI] candidates: {}, valid: {}, beams: {}",
            guard.counts.total(),
            guard.counts.valid,
            guard.histograms.len()
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        println!("[GUI] {}", message);
    }

    pub fn snapshot(&self) -> Result<OverviewModel> {
        self.state
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| anyhow!("overview state lock poisoned"))
    }
}
