//! Command-line front end for the remote processing client.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::{debug, info};
use procgate_client::{Binding, RemoteProcessingClient, ReturnInfo};
use procgate_protocol::AttachmentChunk;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Default fragment size for chunked uploads.
const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Command-line options.
#[derive(Parser)]
#[command(name = "procgate", version)]
struct Cli {
    /// Named endpoint profile from procgate.json5
    #[arg(long)]
    profile: Option<String>,
    /// Explicit endpoint address
    #[arg(long)]
    address: Option<String>,
    /// Whole-call timeout in seconds (only with --address)
    #[arg(long)]
    timeout: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Liveness check against the endpoint
    Ping,
    /// Execute a named process
    Exec {
        /// Process name as the contract spells it
        process: String,
        /// Arguments document passed through verbatim
        #[arg(long, default_value = "<args/>")]
        arguments: String,
        /// Metadata selection: None, Keys, or Timing
        #[arg(long, default_value = "None")]
        return_info: String,
    },
    /// Upload a file as a chunked attachment transfer
    Upload {
        /// File to upload
        file: PathBuf,
        /// Fragment size in bytes
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// List items out of sync relative to a tag
    OutOfSync {
        /// Sync tag to compare against
        tag: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let client = build_client(&cli)?;

    match cli.command {
        Command::Ping => {
            client.ping().await?;
            println!("endpoint is alive");
        }
        Command::Exec {
            process,
            arguments,
            return_info,
        } => {
            let return_info: ReturnInfo = return_info
                .parse()
                .map_err(|err| anyhow::anyhow!("{err}"))?;
            let result = client
                .execute_process(&process, &arguments, return_info)
                .await?;
            println!("{result}");
        }
        Command::Upload { file, chunk_size } => {
            if chunk_size == 0 {
                bail!("--chunk-size must be positive");
            }
            upload(&client, &file, chunk_size).await?;
        }
        Command::OutOfSync { tag } => {
            for item in client.out_of_sync_items(&tag).await? {
                println!("{item}");
            }
        }
    }
    Ok(())
}

fn build_client(cli: &Cli) -> anyhow::Result<RemoteProcessingClient> {
    match (&cli.profile, &cli.address) {
        (Some(profile), Some(address)) => {
            Ok(RemoteProcessingClient::from_profile_at(profile, address)?)
        }
        (Some(profile), None) => Ok(RemoteProcessingClient::from_profile(profile)?),
        (None, Some(address)) => {
            let binding = match cli.timeout {
                Some(secs) => Binding {
                    timeout: Duration::from_secs(secs),
                    ..Binding::default()
                },
                None => Binding::default(),
            };
            Ok(RemoteProcessingClient::with_binding(binding, address)?)
        }
        (None, None) => bail!("either --profile or --address is required"),
    }
}

/// Drive a chunked transfer with contiguous offsets and a declared total.
///
/// This is the caller-side half of the upload contract: the client forwards
/// fragments as given and never re-frames, retries, or resumes them. Returns
/// the transfer id used.
async fn upload(
    client: &RemoteProcessingClient,
    file: &PathBuf,
    chunk_size: usize,
) -> anyhow::Result<String> {
    let payload = std::fs::read(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    let transfer_id = Uuid::new_v4().to_string();
    let total_bytes = payload.len() as u64;
    info!(
        "uploading {file_name} ({total_bytes} bytes, transfer_id={transfer_id})"
    );

    if payload.is_empty() {
        // A zero-byte file still announces its transfer: one empty fragment.
        client
            .upload_attachment_chunk(&AttachmentChunk {
                transfer_id: transfer_id.clone(),
                file_name: file_name.clone(),
                payload: Vec::new(),
                offset: 0,
                bytes_read: 0,
                total_bytes: 0,
            })
            .await?;
    }
    let mut offset = 0u64;
    for part in payload.chunks(chunk_size) {
        let chunk = AttachmentChunk {
            transfer_id: transfer_id.clone(),
            file_name: file_name.clone(),
            payload: part.to_vec(),
            offset,
            bytes_read: part.len() as u64,
            total_bytes,
        };
        debug!("sending fragment at offset {offset} ({} bytes)", part.len());
        client.upload_attachment_chunk(&chunk).await?;
        offset += part.len() as u64;
    }
    println!("uploaded {file_name} as transfer {transfer_id}");
    Ok(transfer_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgate_test_utils::ChunkSink;
    use std::sync::Arc;

    fn sink_client() -> (RemoteProcessingClient, ChunkSink) {
        let sink = ChunkSink::new();
        let client = RemoteProcessingClient::with_transport(Arc::new(sink.clone()));
        (client, sink)
    }

    #[tokio::test]
    async fn upload_splits_file_into_contiguous_fragments() {
        let (client, sink) = sink_client();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let payload: Vec<u8> = (0u8..200).collect();
        std::fs::write(&path, &payload).unwrap();

        let transfer_id = upload(&client, &path, 64).await.unwrap();
        assert!(sink.is_complete(&transfer_id));
        assert_eq!(sink.received(&transfer_id).unwrap(), payload);
    }

    #[tokio::test]
    async fn empty_file_still_announces_its_transfer() {
        let (client, sink) = sink_client();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let transfer_id = upload(&client, &path, 64).await.unwrap();
        assert!(sink.is_complete(&transfer_id));
        assert_eq!(sink.received(&transfer_id).unwrap(), Vec::<u8>::new());
    }
}
