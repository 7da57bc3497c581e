//! Documents command handler

use crate::cli::{CreateDocumentArgs, DocumentsCommand};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use las_core::endpoints::{CreateDocument, DocumentFilter};
use las_core::Client;
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

/// Handle the documents command
#[instrument(skip_all)]
pub async fn handle_documents(
    command: DocumentsCommand,
    client: &Client,
    output: &mut OutputWriter,
) -> Result<()> {
    let response = match command {
        DocumentsCommand::Create(args) => {
            let params = create_params(args)?;
            output.info(&format!(
                "Uploading {} bytes as {}",
                params.content.len(),
                params.content_type
            ))?;
            let response = client.create_document(params).await?;
            output.success("Document uploaded")?;
            response
        }
        DocumentsCommand::List(args) => {
            let filter = DocumentFilter {
                batch_id: args.batch_id,
                consent_id: args.consent_id,
            };
            client.list_documents(&filter, &args.page.into()).await?
        }
        DocumentsCommand::Get { document_id } => client.get_document(&document_id).await?,
        DocumentsCommand::Delete(args) => {
            let filter = DocumentFilter {
                batch_id: args.batch_id,
                consent_id: args.consent_id,
            };
            client.delete_documents(&filter, &args.page.into()).await?
        }
    };

    output.response(&response)
}

fn create_params(args: CreateDocumentArgs) -> Result<CreateDocument> {
    if !args.file.exists() {
        return Err(Error::FileNotFound { path: args.file });
    }

    let content_type = match args.content_type {
        Some(content_type) => content_type,
        None => guess_content_type(&args.file).ok_or_else(|| {
            Error::invalid_args(format!(
                "cannot guess the content type of {}, pass --content-type",
                args.file.display()
            ))
        })?,
    };

    let content = fs::read(&args.file)?;
    debug!(file = %args.file.display(), bytes = content.len(), "Read document");

    let mut params = CreateDocument::new(content, content_type);
    if let Some(consent_id) = args.consent_id {
        params = params.consent_id(consent_id);
    }
    if let Some(batch_id) = args.batch_id {
        params = params.batch_id(batch_id);
    }
    if let Some(ground_truth) = args.ground_truth {
        params = params.ground_truth(ground_truth);
    }
    Ok(params)
}

fn guess_content_type(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match extension.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(content_type.to_string())
}
