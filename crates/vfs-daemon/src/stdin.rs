//! Single-user console driven by line input.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;
use vfs_service::VfsService;

/// Runs command lines from the process stdin, printing results to stdout.
pub async fn run_stdin_mode(service: VfsService, user: &str) -> Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    run_lines(&service, user, input, &mut output).await
}

/// Authorizes `user`, then executes each non-blank input line as a command.
///
/// Successful commands print their response message (nothing for copy and
/// move); failures print `error: <message>` and do not stop the loop.
pub async fn run_lines<R, W>(service: &VfsService, user: &str, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let token = service.authorize(user).await?.token;
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let text = match service.perform_command(token, line).await {
            Ok(resp) => resp.response_message,
            Err(e) => {
                debug!(command = line, error = %e, "command failed");
                format!("error: {e}")
            }
        };
        if !text.is_empty() {
            output.write_all(text.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
    }

    service.deauthorize(token).await?;
    Ok(())
}
