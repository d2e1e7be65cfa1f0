//! Line-framed message transport over async byte streams
//!
//! The worker process talks to the coordinator over its stdin/stdout; the
//! coordinator uses the same tasks on the child's pipes.

use log::{debug, error, warn};
use shared::{decode, encode, Message, WireError};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Spawns a task that decodes one message per line and hands it to `deliver`.
///
/// Malformed lines, including ones that are not valid UTF-8, are logged and
/// skipped. The task ends on EOF, on an I/O error, or when `deliver` returns
/// false.
pub fn spawn_reader<R, F>(reader: R, mut deliver: F) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    F: FnMut(Message) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => {
                    debug!("Channel closed by peer");
                    break;
                }
                Ok(_) => {
                    let line = match std::str::from_utf8(&buf) {
                        Ok(line) => line.trim(),
                        Err(e) => {
                            warn!("Dropping line that is not UTF-8: {}", e);
                            continue;
                        }
                    };
                    if line.is_empty() {
                        continue;
                    }
                    match decode(line) {
                        Ok(message) => {
                            if !deliver(message) {
                                debug!("Reader receiver gone, stopping");
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping line: {}", e),
                    }
                }
                Err(e) => {
                    error!("Error reading channel: {}", e);
                    break;
                }
            }
        }
    })
}

/// Spawns a task that writes each outbound message as one line.
pub fn spawn_writer<W>(
    writer: W,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) -> JoinHandle<Result<(), WireError>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut writer = writer;

        while let Some(message) = outbound.recv().await {
            let line = match encode(&message) {
                Ok(line) => line,
                Err(e) => {
                    warn!("Not sending {}: {}", message.tag(), e);
                    continue;
                }
            };

            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{AttackIntent, Character, Direction};
    use tokio::io::{duplex, AsyncReadExt};
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_reader_decodes_lines() {
        let input: &[u8] = b"{\"type\":\"characterUpsert\",\"data\":{\"id\":\"h1\",\"x\":1,\"y\":2}}\n\
            garbage\n\
            \n\
            {\"type\":\"teleport\",\"data\":null}\n\
            {\"type\":\"attackSubmit\",\"data\":{\"attackerId\":\"h1\",\"x\":1,\"y\":2,\"direction\":7}}\n";

        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_reader(input, move |message| tx.send(message).is_ok())
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(Message::CharacterUpsert(Character::new("h1", 1.0, 2.0)))
        );
        assert_eq!(
            rx.recv().await,
            Some(Message::Unrecognized("teleport".to_string()))
        );
        match rx.recv().await {
            Some(Message::AttackSubmit(intent)) => assert_eq!(intent.direction, Direction::Up),
            other => panic!("Unexpected message: {:?}", other),
        }
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_reader_skips_invalid_utf8() {
        let input: &[u8] = b"{\"type\":\"x\",\"data\":\"\xff\xfe\"}\n\
            {\"type\":\"hitNotification\",\"data\":\"after\"}\n";

        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_reader(input, move |message| tx.send(message).is_ok())
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(Message::HitNotification("after".to_string()))
        );
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_reader_stops_when_deliver_refuses() {
        let input: &[u8] = b"{\"type\":\"hitNotification\",\"data\":\"a\"}\n\
            {\"type\":\"hitNotification\",\"data\":\"b\"}\n";

        let mut seen = 0;
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_reader(input, move |message| {
            seen += 1;
            let _ = tx.send(message);
            seen < 1
        })
        .await
        .unwrap();

        assert_eq!(rx.recv().await, Some(Message::HitNotification("a".to_string())));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_writer_frames_lines() {
        let (client, mut server) = duplex(1024);
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = spawn_writer(client, rx);

        tx.send(Message::HitNotification("h2".to_string())).unwrap();
        tx.send(Message::Unrecognized("skip me".to_string())).unwrap();
        tx.send(Message::AttackSubmit(AttackIntent {
            attacker_id: "h1".to_string(),
            x: 0.0,
            y: 0.0,
            direction: Direction::Left,
        }))
        .unwrap();
        drop(tx);

        assert_ok!(writer.await.unwrap());

        let mut output = String::new();
        server.read_to_string(&mut output).await.unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"type":"hitNotification","data":"h2"}"#);
        assert!(lines[1].contains(r#""direction":3"#));
    }
}
