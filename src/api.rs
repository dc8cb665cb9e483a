//! HTTP control surface for the run controller.

use crate::controller::{RunController, StartRequest};
use crate::countries::{list_countries, search_countries};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use warp::{Filter, Rejection, Reply, http::StatusCode};

/// API response structure
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(message: impl Into<String>, data: T) -> warp::reply::WithStatus<warp::reply::Json> {
        warp::reply::with_status(
            warp::reply::json(&ApiResponse {
                success: true,
                message: message.into(),
                data: Some(data),
            }),
            StatusCode::OK,
        )
    }
}

fn failure(message: impl Into<String>, status: StatusCode) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&ApiResponse::<()> {
            success: false,
            message: message.into(),
            data: None,
        }),
        status,
    )
}

#[derive(Deserialize, Debug, Default)]
struct LeadsQuery {
    run_id: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct CountriesQuery {
    q: Option<String>,
}

#[derive(Serialize)]
struct LeadsPayload {
    count: usize,
    leads: Vec<crate::models::Lead>,
}

#[derive(Serialize)]
struct StartPayload {
    run_id: String,
}

/// Builds the routes served by `start_api_server`.
pub(crate) fn routes(
    controller: RunController,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_controller = warp::any().map(move || controller.clone());

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| ApiResponse::ok("Lead Scout API is running", ()));

    let status = warp::path!("status")
        .and(warp::get())
        .and(with_controller.clone())
        .and_then(handle_status);

    let start = warp::path!("start")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_controller.clone())
        .and_then(handle_start);

    let stop = warp::path!("stop")
        .and(warp::post())
        .and(with_controller.clone())
        .and_then(handle_stop);

    let leads = warp::path!("leads")
        .and(warp::get())
        .and(warp::query::<LeadsQuery>())
        .and(with_controller.clone())
        .and_then(handle_leads);

    let countries = warp::path!("countries")
        .and(warp::get())
        .and(warp::query::<CountriesQuery>())
        .map(|query: CountriesQuery| {
            let found = match query.q.as_deref().map(str::trim) {
                Some(q) if !q.is_empty() => search_countries(q),
                _ => list_countries(),
            };
            ApiResponse::ok(format!("{} countries", found.len()), found)
        });

    let categories = warp::path!("categories")
        .and(warp::get())
        .and(with_controller.clone())
        .map(|controller: RunController| {
            let categories = controller.default_categories().to_vec();
            ApiResponse::ok(format!("{} categories", categories.len()), categories)
        });

    let stats = warp::path!("stats")
        .and(warp::get())
        .and(with_controller)
        .and_then(handle_stats);

    health
        .or(status)
        .or(start)
        .or(stop)
        .or(leads)
        .or(countries)
        .or(categories)
        .or(stats)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_methods(vec!["GET", "POST"])
                .allow_header("content-type"),
        )
        .recover(handle_rejection)
}

/// Start the API server
pub(crate) async fn start_api_server(controller: RunController, port: u16) {
    tracing::info!("Starting API server on port {}", port);
    warp::serve(routes(controller)).run(([0, 0, 0, 0], port)).await;
}

async fn handle_status(controller: RunController) -> Result<impl Reply, Rejection> {
    let status = controller.get_status().await;
    Ok(ApiResponse::ok("Status retrieved", status))
}

async fn handle_start(request: StartRequest, controller: RunController) -> Result<impl Reply, Rejection> {
    tracing::info!("Start requested for {}, {}", request.city, request.country);
    match controller.start(request).await {
        Ok(handle) => {
            let run_id = controller.get_status().await.run_id;
            tokio::spawn(async move {
                match handle.await {
                    Ok(summary) => tracing::info!(
                        "Run {} ended: {:?}, {} leads",
                        summary.run_id,
                        summary.outcome,
                        summary.leads_saved
                    ),
                    Err(e) => tracing::error!("Run task failed: {}", e),
                }
            });
            Ok(ApiResponse::ok(
                format!("Discovery started (run {})", run_id),
                StartPayload { run_id },
            ))
        }
        Err(e) => {
            tracing::warn!("Start rejected: {}", e);
            Ok(failure(e.to_string(), StatusCode::BAD_REQUEST))
        }
    }
}

async fn handle_stop(controller: RunController) -> Result<impl Reply, Rejection> {
    if controller.stop().await {
        Ok(ApiResponse::ok("Stop requested", true))
    } else {
        Ok(ApiResponse::ok("No discovery is running", false))
    }
}

async fn handle_leads(query: LeadsQuery, controller: RunController) -> Result<impl Reply, Rejection> {
    let leads = controller.leads(query.run_id.as_deref()).await;
    Ok(ApiResponse::ok(
        format!("{} leads", leads.len()),
        LeadsPayload {
            count: leads.len(),
            leads,
        },
    ))
}

async fn handle_stats(controller: RunController) -> Result<impl Reply, Rejection> {
    Ok(ApiResponse::ok("Stats retrieved", controller.stats().await))
}

/// Handle API rejections
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    if err.is_not_found() {
        Ok(failure("Not Found", StatusCode::NOT_FOUND))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        Ok(failure(format!("Invalid request body: {}", e), StatusCode::BAD_REQUEST))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        Ok(failure("Method not allowed", StatusCode::METHOD_NOT_ALLOWED))
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        Ok(failure("Invalid query string", StatusCode::BAD_REQUEST))
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        Ok(failure("Server error", StatusCode::INTERNAL_SERVER_ERROR))
    }
}
