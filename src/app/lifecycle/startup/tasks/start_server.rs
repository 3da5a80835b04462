use crate::app::context::StartupContext;
use crate::app::pipeline::ortb::AuctionContext;
use crate::core::ortb::{BidRequest, ResponseState};
use crate::core::pipeline::{AsyncTask, Pipeline};
use actix_web::http::StatusCode;
use actix_web::middleware::Compress;
use actix_web::{App, HttpResponse, HttpServer, web};
use anyhow::{Error, anyhow};
use async_trait::async_trait;
use opentelemetry::metrics::Counter;
use opentelemetry::{KeyValue, global};
use serde_json::json;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, instrument};

static REQUESTS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("adx")
        .u64_counter("requests")
        .with_description("Inbound openrtb requests by outcome")
        .with_unit("1")
        .build()
});

type AuctionPipeline = Pipeline<AuctionContext, Error>;

fn record_request_metric(ssp_id: &str, state: &Option<ResponseState>, pipeline_ok: bool) {
    let outcome = match state {
        Some(state) => state.outcome(),
        None => "unresolved",
    };

    REQUESTS_TOTAL.add(
        1,
        &[
            KeyValue::new("ssp_id", ssp_id.to_string()),
            KeyValue::new("outcome", outcome),
            KeyValue::new("pipeline_completed", pipeline_ok),
        ],
    );
}

fn error_body(status: StatusCode, msg: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "error": msg }))
}

/// Publisher facing translation of the pipeline result
fn into_http_response(state: Option<ResponseState>, pipeline_ok: bool) -> HttpResponse {
    match state {
        Some(ResponseState::Bid(res)) => HttpResponse::Ok().json(res),
        Some(ResponseState::NoFill { .. }) => HttpResponse::NoContent().finish(),
        Some(ResponseState::Rejected { reason, desc }) => {
            let status = StatusCode::from_u16(reason.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_body(status, &desc)
        }
        None if pipeline_ok => HttpResponse::NoContent().finish(),
        None => error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    }
}

async fn openrtb_handler(
    ssp_id: web::Path<String>,
    body: web::Bytes,
    pipeline: web::Data<AuctionPipeline>,
) -> HttpResponse {
    let ssp_id = ssp_id.into_inner();

    let req = match serde_json::from_slice::<BidRequest>(&body) {
        Ok(req) => req,
        Err(e) => {
            debug!("Unparseable bid request from ssp {}: {}", ssp_id, e);
            record_request_metric(&ssp_id, &None, false);
            return error_body(StatusCode::BAD_REQUEST, "Invalid request");
        }
    };

    let mut ctx = AuctionContext::new(ssp_id, req);

    let pipeline_result = pipeline.run(&ctx).await;

    match &pipeline_result {
        Ok(_) => debug!("Auction pipeline completed"),
        Err(e) => debug!("Auction pipeline aborted: {}", e),
    }

    let state = ctx.res.take();
    record_request_metric(&ctx.ssp_id, &state, pipeline_result.is_ok());

    into_http_response(state, pipeline_result.is_ok())
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

pub fn routes(cfg: &mut web::ServiceConfig, pipeline: Arc<AuctionPipeline>) {
    cfg.app_data(web::Data::from(pipeline))
        .route("/health", web::get().to(health))
        .route("/api/openrtb/{ssp_id}", web::post().to(openrtb_handler));
}

pub struct StartServerTask;

#[async_trait]
impl AsyncTask<StartupContext, Error> for StartServerTask {
    #[instrument(skip_all, name = "start_server_task")]
    async fn run(&self, ctx: &StartupContext) -> Result<(), Error> {
        let config = ctx
            .config
            .get()
            .ok_or(anyhow!("Server task missing config!"))?;

        let pipeline = ctx
            .auction_pipeline
            .get()
            .ok_or(anyhow!("Auction pipeline not built"))?
            .clone();

        let mut server = HttpServer::new(move || {
            let pipeline = pipeline.clone();
            App::new()
                .wrap(Compress::default())
                .configure(move |cfg| routes(cfg, pipeline))
        })
        .disable_signals()
        .bind((config.server.host.as_str(), config.server.port))?;

        if let Some(workers) = config.server.workers {
            server = server.workers(workers);
        }

        let server = server.run();

        ctx.server
            .set(server.handle())
            .map_err(|_| anyhow!("Could not set server"))?;

        actix_web::rt::spawn(server);

        info!(
            "Listening on {}:{}, ready for requests",
            config.server.host, config.server.port
        );

        Ok(())
    }
}
