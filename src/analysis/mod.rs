mod client;
mod http;
mod types;

pub use client::{AnalysisClient, AnalysisTransport};
pub use http::HttpTransport;
pub use types::{AnalysisResult, AnalyzeRequest, AnalyzeResponse};
