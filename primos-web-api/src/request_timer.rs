use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Status;
use rocket::{Data, Request, Response};
use std::time::Instant;
use tracing::info;

/// Logs method, path, status and latency of every request.
pub struct RequestTimer;

#[derive(Copy, Clone)]
struct TimerStart(Option<Instant>);

#[rocket::async_trait]
impl Fairing for RequestTimer {
    fn info(&self) -> Info {
        Info {
            name: "Request Timer",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        if request.uri().path().as_str() == "/" {
            return;
        }
        request.local_cache(|| TimerStart(Some(Instant::now())));
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        if res.status() == Status::NotFound {
            return;
        }
        if let Some(start) = req.local_cache(|| TimerStart(None)).0 {
            info!(
                method = %req.method(),
                path = %req.uri().path(),
                status = res.status().code,
                latency_ms = start.elapsed().as_millis() as u64,
                "request finished"
            );
        }
    }
}
