//! Command handlers for CLI subcommands
//!
//! Each handler receives a ready client and an output writer, calls the
//! API and prints the response.

mod documents;
mod predictions;
mod request;

pub use documents::handle_documents;
pub use predictions::handle_predictions;
pub use request::handle_request;

use crate::cli::{AssetsCommand, Cli, HeartbeatArgs, PageArgs};
use crate::error::Result;
use crate::output::OutputWriter;
use las_core::endpoints::Page;
use las_core::{Client, ClientConfig};
use tracing::info;

/// Build a client from the global flags
pub fn connect(cli: &Cli) -> Result<Client> {
    let mut builder = Client::builder()
        .config(ClientConfig::default().with_signing_scheme(cli.signing.into()));
    if let Some(profile) = &cli.profile {
        builder = builder.profile(profile.clone());
    }
    if let Some(path) = &cli.credentials {
        builder = builder.credentials_file(path.clone());
    }

    let client = builder.build()?;
    info!(api_endpoint = client.api_endpoint(), "Connected");
    Ok(client)
}

/// Handle the assets command
pub async fn handle_assets(
    command: AssetsCommand,
    client: &Client,
    output: &mut OutputWriter,
) -> Result<()> {
    let response = match command {
        AssetsCommand::List(page) => client.list_assets(&page.into()).await?,
        AssetsCommand::Get { asset_id } => client.get_asset(&asset_id).await?,
    };
    output.response(&response)
}

/// Handle the heartbeat command
pub async fn handle_heartbeat(
    args: HeartbeatArgs,
    client: &Client,
    output: &mut OutputWriter,
) -> Result<()> {
    let response = client
        .send_heartbeat(&args.transition_id, &args.execution_id)
        .await?;
    output.response(&response)
}

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Page::new(args.max_results, args.next_token)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{client, json_output, FakeApi};
    use super::*;
    use las_core::http::RawResponse;
    use las_core::Method;

    #[tokio::test]
    async fn test_list_assets_with_page() {
        let api = FakeApi::scripted(vec![RawResponse::new(
            200,
            r#"{"assets": [], "nextToken": null}"#,
        )]);
        let (mut output, captured) = json_output();

        let page = PageArgs {
            max_results: Some(5),
            next_token: None,
        };
        handle_assets(AssetsCommand::List(page), &client(api.clone()), &mut output)
            .await
            .unwrap();

        let sent = api.sent();
        assert_eq!(sent[0].method, Method::GET);
        assert_eq!(sent[0].path, "/v1/assets");
        assert_eq!(sent[0].query, vec![("maxResults".to_string(), "5".to_string())]);
        assert_eq!(captured.text(), "{\"assets\":[],\"nextToken\":null}\n");
    }

    #[tokio::test]
    async fn test_heartbeat_prints_acknowledgement() {
        let api = FakeApi::scripted(vec![RawResponse::new(204, Vec::new())]);
        let (mut output, captured) = json_output();

        let args = HeartbeatArgs {
            transition_id: "t1".to_string(),
            execution_id: "e1".to_string(),
        };
        handle_heartbeat(args, &client(api.clone()), &mut output)
            .await
            .unwrap();

        assert_eq!(api.sent()[0].path, "/v1/transitions/t1/executions/e1/heartbeats");
        assert_eq!(
            captured.text(),
            "{\"message\":\"request executed successfully\"}\n"
        );
    }

    #[tokio::test]
    async fn test_service_error_propagates() {
        let api = FakeApi::scripted(vec![RawResponse::new(404, "not found")]);
        let (mut output, captured) = json_output();

        let err = handle_assets(
            AssetsCommand::Get {
                asset_id: "missing".to_string(),
            },
            &client(api),
            &mut output,
        )
        .await
        .unwrap_err();

        assert_eq!(err.exit_code(), 5);
        assert!(captured.text().is_empty());
    }
}
