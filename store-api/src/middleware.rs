use async_trait::async_trait;
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use std::time::Instant;

/// Logs every outgoing API call with its status and latency.
pub struct LogRequests;

#[async_trait]
impl Middleware for LogRequests {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let path = req.url().path().to_string();
        let started = Instant::now();
        let res = next.run(req, extensions).await;
        match &res {
            Ok(r) => log::debug!(
                "{method} {path} -> {} in {:?}",
                r.status(),
                started.elapsed()
            ),
            Err(err) => log::warn!("{method} {path} failed after {:?}: {err}", started.elapsed()),
        }
        res
    }
}
