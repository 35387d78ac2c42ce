//! Where outbound messages go

use super::protocol::OutboundMessage;
use crate::error::SurfaceError;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Receives outbound messages
///
/// Posting must not block: the session actor calls it from inside its
/// observer. Delivery failures are the caller's to log.
pub trait DisplaySurface: Send + Sync {
    fn post(&self, message: OutboundMessage) -> Result<(), SurfaceError>;
}

/// Surface that forwards messages into a channel
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    sender: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelSurface {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl DisplaySurface for ChannelSurface {
    fn post(&self, message: OutboundMessage) -> Result<(), SurfaceError> {
        self.sender.send(message).map_err(|_| SurfaceError::Closed)
    }
}

/// Surface that writes one JSON object per line
///
/// Messages are encoded on `post` and written by a background task in
/// posting order.
#[derive(Debug, Clone)]
pub struct JsonLinesSurface {
    lines: mpsc::UnboundedSender<String>,
}

impl JsonLinesSurface {
    pub fn spawn<W>(mut writer: W) -> (Self, JoinHandle<Result<(), SurfaceError>>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (lines, mut receiver) = mpsc::unbounded_channel::<String>();
        let task = tokio::spawn(async move {
            while let Some(line) = receiver.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, SurfaceError>(())
        });
        (Self { lines }, task)
    }
}

impl DisplaySurface for JsonLinesSurface {
    fn post(&self, message: OutboundMessage) -> Result<(), SurfaceError> {
        let line = message.encode()?;
        self.lines.send(line).map_err(|_| SurfaceError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Position;

    #[tokio::test]
    async fn channel_surface_reports_a_dropped_receiver() {
        let (surface, receiver) = ChannelSurface::new();
        drop(receiver);

        let result = surface.post(OutboundMessage::NavigationFailed {
            message: "gone".to_string(),
        });

        assert!(matches!(result, Err(SurfaceError::Closed)));
    }

    #[tokio::test]
    async fn json_lines_are_written_in_order() {
        let (client, mut server) = tokio::io::duplex(4096);
        let (surface, task) = JsonLinesSurface::spawn(client);

        surface
            .post(OutboundMessage::RevealPosition {
                position: Position { line: 4, column: 2 },
            })
            .unwrap();
        surface
            .post(OutboundMessage::NavigationFailed {
                message: "text not found".to_string(),
            })
            .unwrap();
        drop(surface);
        task.await.unwrap().unwrap();

        let mut output = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut server, &mut output)
            .await
            .unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(r#"{"type":"revealPosition""#));
        assert!(lines[1].contains("text not found"));
    }
}
