//! Request command handler

use crate::cli::RequestArgs;
use crate::error::Result;
use crate::logging::redaction;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use las_core::http::RequestBuilder;
use las_core::Client;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Handle the request command, cancelling the call on Ctrl-C
#[instrument(skip_all, fields(method = %args.method, path = %args.path))]
pub async fn handle_request(
    args: RequestArgs,
    client: &Client,
    output: &mut OutputWriter,
) -> Result<()> {
    let interrupt = async {
        // Without a signal handler the call just runs to completion
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    execute_until(args, client, output, interrupt).await
}

async fn execute_until<F>(
    args: RequestArgs,
    client: &Client,
    output: &mut OutputWriter,
    interrupt: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let timer = Timer::new("request");
    let request = build_request(args);

    let cancel = CancellationToken::new();
    let call = client.execute_with_cancel(request, &cancel);
    tokio::pin!(call);

    let response = tokio::select! {
        biased;
        _ = interrupt => {
            info!("Interrupted, cancelling request");
            cancel.cancel();
            call.await
        }
        response = &mut call => response,
    }?;

    debug!(elapsed_ms = timer.elapsed().as_millis() as u64, "Request finished");
    output.response(&response)
}

fn build_request(args: RequestArgs) -> RequestBuilder {
    let mut request = RequestBuilder::new(args.method, args.path);

    if let Some(body) = args.body {
        let mut preview = body.clone();
        redaction::redact_json_value(&mut preview);
        debug!(body = %preview, "Request body");
        request = request.body(body);
    }
    for (key, value) in &args.query {
        request = request.query(key, value);
    }

    request
}
