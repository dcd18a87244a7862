use rusqlite::Connection;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::AppResult;
use crate::models::Session;
use crate::services::ai::LlmProvider;
use crate::services::conversation::process_message;
use crate::services::scheduling::BookingContext;

pub const WELCOME: &str = "Welcome to the Healthcare Chatbot!";

pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Line-oriented chat loop. Returns on `exit`, `quit` or end of input; any
/// fatal store or model error ends the loop with that error.
pub async fn run<R, W>(
    llm: &dyn LlmProvider,
    conn: &mut Connection,
    ctx: &mut BookingContext,
    session: &mut Session,
    input: R,
    mut output: W,
) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    output.write_all(format!("{WELCOME}\n").as_bytes()).await?;

    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_exit_command(line) {
            break;
        }

        let report = process_message(llm, conn, ctx, session, line).await?;

        let mut text = format!("Assistant:\n{}\n", report.reply);
        if let Some(status) = report.outcome.message() {
            text.push_str(&status);
            text.push('\n');
        }
        output.write_all(text.as_bytes()).await?;
    }

    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
