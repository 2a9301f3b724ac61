use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes HTTP requests; the seam that lets [`HttpSource`](super::HttpSource)
/// run against a real client or a wrapper.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
