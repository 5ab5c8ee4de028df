//! Endpoint call command.

use std::io::Write;

use serde_json::Value;
use tracing::debug;

use gl_api::Payload;
use gl_core::config::AppConfig;
use gl_core::error::GlResult;

use super::args::{parse_invocation, Invocation};
use crate::GlobalArgs;

pub async fn run(config: &AppConfig, global: &GlobalArgs, tokens: &[String]) -> GlResult<()> {
    let invocation = parse_invocation(tokens)?;
    let client = super::create_client(config, global)?;

    debug!(
        "{} with {} argument(s), {} parameter(s)",
        invocation.method,
        invocation.args.len(),
        invocation.params.len()
    );

    let output = execute(&client, &invocation, global.all).await?;
    // Nothing reaches stdout until the whole call has succeeded.
    if let Some(bytes) = render(output, global.pretty)? {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.flush()?;
    }
    Ok(())
}

async fn execute(
    client: &gl_api::Client,
    invocation: &Invocation,
    all_pages: bool,
) -> GlResult<Option<Payload>> {
    let Invocation {
        method, args, upload, ..
    } = invocation;

    if let Some(file) = upload {
        return client
            .upload(method, args, file.clone(), invocation.params())
            .await;
    }

    if all_pages {
        let records = client
            .paginate(method.clone(), args.clone(), invocation.params())
            .all()
            .await?;
        return Ok(Some(Payload::Json(Value::Array(records))));
    }

    client.call(method, args, invocation.params()).await
}

/// Bytes to print for a call result. Absent and empty results print nothing.
fn render(payload: Option<Payload>, pretty: bool) -> GlResult<Option<Vec<u8>>> {
    let rendered = match payload {
        None | Some(Payload::Empty) => None,
        Some(Payload::Raw(bytes)) => Some(bytes),
        Some(Payload::Json(value)) => {
            let mut text = if pretty {
                serde_json::to_string_pretty(&value)?
            } else {
                serde_json::to_string(&value)?
            };
            text.push('\n');
            Some(text.into_bytes())
        }
    };
    Ok(rendered)
}
