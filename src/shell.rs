//! Line-oriented popup host: reads questions, prints replies and highlight results.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bus::extension::Delivery;
use crate::chat::controller::ChatSessionController;
use crate::chat::state::{SessionState, SubmitOutcome};
use crate::errors::PageHintResult;

const QUIT: &str = "/quit";
const TRANSCRIPT: &str = "/transcript";
const TYPING: &str = "Bot is typing...";

/// Drive `controller` from `reader` until EOF or `/quit`.
pub async fn run_popup<R, W>(
    controller: &mut ChatSessionController,
    reader: R,
    mut writer: W,
) -> PageHintResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut segments = reader.split(b'\n');
    while let Some(raw) = segments.next_segment().await? {
        let line = match String::from_utf8(raw) {
            Ok(line) => line.trim_end_matches('\r').to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "input line is not valid UTF-8, skipping");
                continue;
            }
        };
        match line.trim() {
            QUIT => break,
            TRANSCRIPT => {
                for message in controller.transcript() {
                    let json = serde_json::to_string(message)?;
                    writer.write_all(format!("{json}\n").as_bytes()).await?;
                }
                writer.flush().await?;
                continue;
            }
            _ => {}
        }

        let outcome = controller.send_input(line).await;
        let highlighted = match &outcome {
            SubmitOutcome::Rejected | SubmitOutcome::Busy => continue,
            SubmitOutcome::Answered { dispatch } => dispatch
                .as_ref()
                .and_then(Delivery::acknowledgement)
                .filter(|ack| ack.success)
                .and_then(|ack| ack.matched),
            SubmitOutcome::Failed => None,
        };

        if let Some(reply) = controller.transcript().last() {
            writer
                .write_all(format!("bot> {}\n", reply.text()).as_bytes())
                .await?;
        }
        if let Some(n) = highlighted.filter(|n| *n > 0) {
            writer
                .write_all(format!("[highlighted {n} element(s) on the page]\n").as_bytes())
                .await?;
        }
        writer.flush().await?;
    }

    tracing::debug!(
        session = %controller.session_id(),
        messages = controller.transcript().len(),
        "popup closed"
    );
    Ok(())
}

/// Print a typing indicator whenever the session starts awaiting a reply.
/// Ends when the controller is dropped.
pub fn spawn_pending_indicator<W>(mut state: watch::Receiver<SessionState>, mut out: W) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let pending = *state.borrow_and_update() == SessionState::AwaitingReply;
            if pending {
                if out.write_all(format!("{TYPING}\n").as_bytes()).await.is_err() {
                    break;
                }
                let _ = out.flush().await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::backend::provider::QueryBackend;
    use crate::backend::types::BackendReply;
    use crate::bus::extension::ExtensionBus;
    use crate::errors::PageHintError;
    use crate::page::applier::{HighlightListener, PageActionApplier};
    use crate::page::document::{Element, StaticDocument};

    /// Echoes a directive for questions mentioning "button", fails on "fail".
    struct EchoBackend;

    #[async_trait]
    impl QueryBackend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        async fn query(&self, input: &str) -> PageHintResult<BackendReply> {
            if input.contains("fail") {
                return Err(PageHintError::Backend("503 Service Unavailable".into()));
            }
            let text = if input.contains("button") {
                "Selector for button: #create-bucket".to_string()
            } else {
                format!("You said: {input}")
            };
            Ok(BackendReply { text })
        }
    }

    async fn run_script(script: &str, bus: ExtensionBus) -> String {
        run_bytes(script.as_bytes(), bus).await
    }

    async fn run_bytes(input: &[u8], bus: ExtensionBus) -> String {
        let mut controller = ChatSessionController::new(Arc::new(EchoBackend), Arc::new(bus));
        let mut out = Vec::new();
        run_popup(&mut controller, input, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_skipped_and_session_continues() {
        let bus = ExtensionBus::new(4, Duration::from_millis(100));
        let out = run_bytes(b"\xff\xfe broken\r\nhello\r\n", bus).await;
        assert_eq!(out, "bot> You said: hello\n");
    }

    #[tokio::test]
    async fn prints_replies_and_skips_blank_lines() {
        let bus = ExtensionBus::new(4, Duration::from_millis(100));
        let out = run_script("hello\n   \nplease fail\n", bus).await;
        assert_eq!(
            out,
            "bot> You said: hello\nbot> An error occurred. Please try again.\n"
        );
    }

    #[tokio::test]
    async fn reports_highlight_when_page_acknowledges() {
        let mut page = StaticDocument::new("https://console.example.com/s3");
        page.push(Element::new("button").with_id("create-bucket").with_text("Create bucket"));
        let page = Arc::new(Mutex::new(page));

        let bus = ExtensionBus::new(4, Duration::from_millis(500));
        let _listener = bus
            .attach_content_script()
            .receive(HighlightListener::new(PageActionApplier::default(), page.clone()));

        let out = run_script("which button creates a bucket?\n", bus).await;
        assert_eq!(
            out,
            "bot> Selector for button: #create-bucket\n[highlighted 1 element(s) on the page]\n"
        );
        assert_eq!(
            page.lock().unwrap().elements()[0].style("outline"),
            Some("2px solid red")
        );
    }

    #[tokio::test]
    async fn quit_stops_and_transcript_dumps_json() {
        let bus = ExtensionBus::new(4, Duration::from_millis(100));
        let out = run_script("hi\n/transcript\n/quit\nnever sent\n", bus).await;

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "bot> You said: hi");
        let user: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(user["role"], "user");
        assert_eq!(user["text"], "hi");
        let bot: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(bot["role"], "assistant");
        assert!(bot["ts"].is_i64());
    }

    #[tokio::test]
    async fn indicator_follows_state_transitions() {
        let (tx, rx) = watch::channel(SessionState::Idle);
        let (writer, mut reader) = tokio::io::duplex(64);
        let task = spawn_pending_indicator(rx, writer);

        tx.send_replace(SessionState::AwaitingReply);
        let mut buf = vec![0u8; TYPING.len() + 1];
        tokio::io::AsyncReadExt::read_exact(&mut reader, &mut buf).await.unwrap();
        assert_eq!(buf, format!("{TYPING}\n").as_bytes());

        tx.send_replace(SessionState::Idle);
        drop(tx);
        task.await.unwrap();
    }
}
