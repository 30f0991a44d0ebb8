//! Request command implementation.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use leadr::http::Method;

use crate::cli::ClientArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: Method,

    /// Path relative to the API URL (e.g. /v1/client/boards)
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,

    /// Attach a one-time nonce (required by mutating endpoints)
    #[arg(long)]
    pub nonce: bool,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

pub async fn run(args: RequestArgs, client_args: &ClientArgs) -> Result<()> {
    let body = args
        .body
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--body is not valid JSON")?;

    let client = super::client(client_args)?;
    let value: Value = client
        .execute_json(args.method, &args.path, body, args.nonce)
        .await
        .with_context(|| format!("{} {} failed", args.method, args.path))?;

    if args.compact {
        output::json(&value)
    } else {
        output::json_pretty(&value)
    }
}
