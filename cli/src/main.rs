use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::UnixStream,
};
use uuid::Uuid;

const USAGE: &str =
    "usage: portgate-cli --socket-path <path> (--request <file> | --flush | --exit)";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Request(PathBuf),
    Flush,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    socket_path: PathBuf,
    command: Command,
}

fn cli_options_from_args() -> Result<CliOptions> {
    parse_cli_options(env::args().skip(1))
}

fn parse_cli_options<I>(mut args: I) -> Result<CliOptions>
where
    I: Iterator<Item = String>,
{
    let mut socket_path = None;
    let mut command = None;

    while let Some(arg) = args.next() {
        let next = match arg.as_str() {
            "--socket-path" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --socket-path"))?;
                socket_path = Some(PathBuf::from(value));
                continue;
            }
            "--request" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --request"))?;
                Command::Request(PathBuf::from(value))
            }
            "--flush" => Command::Flush,
            "--exit" => Command::Exit,
            other => return Err(anyhow!("unknown argument: {other}. {USAGE}")),
        };
        if command.replace(next).is_some() {
            return Err(anyhow!("only one of --request, --flush, --exit may be given. {USAGE}"));
        }
    }

    let socket_path =
        socket_path.ok_or_else(|| anyhow!("missing required argument --socket-path. {USAGE}"))?;
    let command = command.ok_or_else(|| anyhow!("missing command. {USAGE}"))?;

    Ok(CliOptions {
        socket_path,
        command,
    })
}

/// Contents of a `--request` file; `request_id` is generated when absent.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestFile {
    #[serde(default)]
    request_id: Option<String>,
    caller: serde_json::Value,
    record: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    AllowedActions {
        request_id: String,
        caller: serde_json::Value,
        record: serde_json::Value,
    },
    FlushEvaluatorCache,
    Exit,
}

fn build_message(command: &Command) -> Result<ClientMessage> {
    match command {
        Command::Request(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read request file {}", path.display()))?;
            let request: RequestFile = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse request file {}", path.display()))?;
            Ok(ClientMessage::AllowedActions {
                request_id: request
                    .request_id
                    .unwrap_or_else(|| Uuid::now_v7().to_string()),
                caller: request.caller,
                record: request.record,
            })
        }
        Command::Flush => Ok(ClientMessage::FlushEvaluatorCache),
        Command::Exit => Ok(ClientMessage::Exit),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = cli_options_from_args()?;
    let message = build_message(&options.command)?;

    let stream = UnixStream::connect(&options.socket_path)
        .await
        .with_context(|| {
            format!(
                "failed to connect to portgate socket {}",
                options.socket_path.display()
            )
        })?;
    let (read_half, mut write_half) = stream.into_split();
    send_message(&mut write_half, &message).await?;

    if matches!(options.command, Command::Exit) {
        return Ok(());
    }

    let mut socket_lines = BufReader::new(read_half).lines();
    let reply = socket_lines
        .next_line()
        .await
        .context("failed to read reply")?
        .ok_or_else(|| anyhow!("server closed the connection without replying"))?;
    println!("{}", reply.trim());
    Ok(())
}

async fn send_message<W>(writer: &mut W, message: &ClientMessage) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let encoded = serde_json::to_string(message)?;
    writer.write_all(encoded.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
