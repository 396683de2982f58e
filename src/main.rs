mod config;
mod error;
mod html;
mod listing;
mod models;
mod submission;

use axum::{
    Form, Router,
    extract::State,
    response::Html,
    routing::get,
};
use clap::Parser;
use config::Config;
use models::{crm::CrmHandle, ucrm_api::UcrmApi};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use submission::{SubmissionForm, SubmissionService};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// ----------------------------------------------------------------------
/// 1  Command line
/// ----------------------------------------------------------------------
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, env = "PORTAL_CONFIG", default_value = "config.yml")]
    config: PathBuf,

    /// Port (default 8000)
    #[arg(short, long, env = "PORTAL_PORT", default_value_t = 8000)]
    port: u16,

    /// Show raw CRM errors and a step trace on the public form
    #[arg(long, env = "PORTAL_DEBUG")]
    debug: bool,
}

/// ----------------------------------------------------------------------
/// 2  Shared app state
/// ----------------------------------------------------------------------
struct AppState {
    crm: CrmHandle,
    submissions: SubmissionService,
}

impl AppState {
    fn new(crm: CrmHandle, config: &Config) -> Self {
        Self {
            submissions: SubmissionService::new(crm.clone(), &config.portal),
            crm,
        }
    }
}

/// A CRM client that cannot be built leaves the portal running with the
/// CRM marked unavailable.
fn connect_crm(config: &Config) -> CrmHandle {
    match UcrmApi::new(&config.crm) {
        Ok(api) => {
            info!("Using CRM API at {}", config.crm.endpoint);
            CrmHandle::Ready(Arc::new(api))
        }
        Err(err) => {
            error!("CRM client unavailable: {:#}", err);
            CrmHandle::Unavailable(format!("{:#}", err))
        }
    }
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/admin", get(admin_listing))
        .route("/public", get(submission_form).post(submit_ticket))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// ----------------------------------------------------------------------
/// 3  Startup
/// ----------------------------------------------------------------------
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a) Logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // b) CLI + config
    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    config.portal.debug |= cli.debug;
    if config.portal.debug {
        info!("Debug mode enabled: raw errors and step traces are shown to visitors");
    }

    // c) State
    let state = Arc::new(AppState::new(connect_crm(&config), &config));

    // d) Server
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}/{{admin, public}}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// ----------------------------------------------------------------------
/// 4  Handlers
/// ----------------------------------------------------------------------
#[tracing::instrument(skip(state))]
async fn admin_listing(State(state): State<Arc<AppState>>) -> Html<String> {
    let dashboard = listing::load_dashboard(&state.crm).await;
    Html(html::render_dashboard(&dashboard))
}

async fn submission_form() -> Html<String> {
    Html(html::render_submission_page(None))
}

#[tracing::instrument(skip(state, form))]
async fn submit_ticket(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SubmissionForm>,
) -> Html<String> {
    info!(debug = state.submissions.debug(), "processing ticket submission");
    let outcome = state.submissions.submit(&form).await;
    Html(html::render_submission_page(Some(&outcome)))
}
