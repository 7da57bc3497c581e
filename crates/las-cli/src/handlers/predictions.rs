//! Predictions command handler

use crate::cli::PredictionsCommand;
use crate::error::Result;
use crate::output::OutputWriter;
use las_core::endpoints::CreatePrediction;
use las_core::Client;

/// Handle the predictions command
pub async fn handle_predictions(
    command: PredictionsCommand,
    client: &Client,
    output: &mut OutputWriter,
) -> Result<()> {
    let response = match command {
        PredictionsCommand::Create(args) => {
            output.info(&format!(
                "Running model {} on document {}",
                args.model_id, args.document_id
            ))?;
            let params = CreatePrediction {
                max_pages: args.max_pages,
                auto_rotate: args.auto_rotate,
                image_quality: args.image_quality,
                ..CreatePrediction::new(args.document_id, args.model_id)
            };
            client.create_prediction(params).await?
        }
        PredictionsCommand::List(page) => client.list_predictions(&page.into()).await?,
    };

    output.response(&response)
}
