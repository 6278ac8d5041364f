/// SMTP server - accept loop and per-connection session handling
use crate::constants::{MAX_COMMAND_LINE_LENGTH, MAX_MESSAGE_SIZE_BYTES};
use crate::handlers::IngestPipeline;
use crate::smtp::commands::parse_command;
use crate::smtp::response::SmtpResponse;
use crate::smtp::session::{Session, error_response};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, tcp::OwnedWriteHalf};
use tracing::{debug, error, info};

pub struct SmtpServer {
    hostname: String,
    pipeline: Arc<IngestPipeline>,
}

impl SmtpServer {
    pub fn new(hostname: impl Into<String>, pipeline: Arc<IngestPipeline>) -> Self {
        Self {
            hostname: hostname.into(),
            pipeline,
        }
    }

    /// Accepts connections until the listener is dropped, one spawned task
    /// per session.
    pub async fn run(&self, listener: TcpListener) -> std::io::Result<()> {
        info!(addr = %listener.local_addr()?, "SMTP server listening");

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(peer = %peer, "Accepted connection");
                    let hostname = self.hostname.clone();
                    let pipeline = self.pipeline.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &hostname, pipeline).await {
                            debug!(peer = %peer, error = %e, "Session ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

async fn send(
    writer: &mut OwnedWriteHalf,
    response: &SmtpResponse,
) -> std::io::Result<()> {
    writer.write_all(response.format().as_bytes()).await?;
    writer.flush().await
}

async fn handle_connection(
    stream: TcpStream,
    hostname: &str,
    pipeline: Arc<IngestPipeline>,
) -> std::io::Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut session = Session::new();

    send(&mut writer, &SmtpResponse::greeting(hostname)).await?;

    let mut line = Vec::new();
    loop {
        line.clear();
        let limit = if session.in_data() {
            // One data line plus its CRLF; the overall message cap is
            // enforced by the session
            MAX_MESSAGE_SIZE_BYTES + 2
        } else {
            MAX_COMMAND_LINE_LENGTH * 4
        };
        match read_line_bounded(&mut reader, &mut line, limit).await {
            Ok(0) => break, // connection closed
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                // The peer is streaming without line terminators; refuse to
                // buffer further and drop the session
                send(&mut writer, &SmtpResponse::new(500, "Line too long")).await?;
                break;
            }
            Err(e) => return Err(e),
        }

        if session.in_data() {
            if let Some(response) = handle_data_line(&line, &mut session, &pipeline).await {
                send(&mut writer, &response).await?;
            }
            continue;
        }

        let text = String::from_utf8_lossy(&line);
        let trimmed = text.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            send(&mut writer, &SmtpResponse::new(500, "Command not recognized")).await?;
            continue;
        }
        if trimmed.len() > MAX_COMMAND_LINE_LENGTH {
            send(&mut writer, &SmtpResponse::new(500, "Line too long")).await?;
            continue;
        }

        let command = parse_command(trimmed);
        let response = session.apply(command, hostname, &pipeline);
        let quitting = response.code == 221;
        send(&mut writer, &response).await?;
        if quitting {
            break;
        }
    }

    Ok(())
}

/// Reads one `\n`-terminated line into `buf`. Returns the number of bytes
/// appended, 0 at end of stream, and `InvalidData` once `limit` bytes have
/// accumulated without a terminator showing up.
async fn read_line_bounded<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    limit: usize,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut read = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(read);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                if buf.len() + pos + 1 > limit {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "line exceeds length limit",
                    ));
                }
                buf.extend_from_slice(&available[..=pos]);
                reader.consume(pos + 1);
                return Ok(read + pos + 1);
            }
            None => {
                let n = available.len();
                if buf.len() + n > limit {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "line exceeds length limit",
                    ));
                }
                buf.extend_from_slice(available);
                reader.consume(n);
                read += n;
            }
        }
    }
}

/// Handles one raw line while in DATA mode. Returns a reply only when the
/// terminating dot arrives; intermediate lines are accumulated (or, after
/// the size cap trips, discarded) silently. Body content never reaches the
/// command parser.
async fn handle_data_line(
    line: &[u8],
    session: &mut Session,
    pipeline: &IngestPipeline,
) -> Option<SmtpResponse> {
    let stripped = strip_terminator(line);

    if stripped == b"." {
        if session.is_discarding() {
            session.reset();
            return Some(SmtpResponse::new(552, "Maximum message size exceeded"));
        }
        let Some((delivery, body)) = session.take_body() else {
            return Some(SmtpResponse::new(503, "No valid recipients"));
        };
        return Some(match pipeline.handle_body(&delivery, &body).await {
            Ok(token) => SmtpResponse::queued(&token),
            Err(e) => {
                error!(error = %e, queue = %delivery.queue, "Delivery failed");
                error_response(&e)
            }
        });
    }

    // Dot-unstuffing: a leading dot on a data line was doubled by the client
    let unstuffed: &[u8] = if stripped.starts_with(b".") {
        &stripped[1..]
    } else {
        stripped
    };

    let mut data_line = unstuffed.to_vec();
    data_line.extend_from_slice(b"\r\n");

    session.push_data_line(&data_line);
    None
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    &line[..end]
}
