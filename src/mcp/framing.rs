/// Message framing for the stdio transport
///
/// Peers disagree on how to delimit messages on a byte stream. Reading
/// accepts four shapes:
///
/// 1. `Content-Length: N\r\n\r\n` followed by N body bytes
/// 2. the same header block terminated by bare `\n\n`
/// 3. a single JSON value with no header, terminated by `\n`
/// 4. a single JSON value with no header, terminated by end of stream
///
/// Each read reports which framing it saw, and the reply is written with
/// that same framing so legacy line-oriented peers keep getting lines.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// How a message was delimited on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    ContentLength,
    Unframed,
}

/// One message body together with the framing it arrived in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub payload: Vec<u8>,
    pub framing: Framing,
}

/// Fatal errors while reading a framed message
#[derive(Error, Debug)]
pub enum FramingError {
    #[error("Missing or invalid Content-Length header")]
    InvalidContentLength,

    #[error("Unexpected end of stream while reading header")]
    EofInHeader,

    #[error("Unexpected end of stream while reading a {expected}-byte body")]
    EofInBody { expected: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Read the next message from `reader`
///
/// Returns `Ok(None)` when the stream ends cleanly between messages.
/// Whitespace between messages is skipped.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<InboundMessage>, FramingError>
where
    R: AsyncRead + Unpin,
{
    let mut header = Vec::new();

    loop {
        let Some(byte) = read_byte(reader).await? else {
            return finish_at_eof(&header);
        };

        if header.is_empty() && byte.is_ascii_whitespace() {
            continue;
        }
        header.push(byte);

        if header.ends_with(b"\r\n\r\n") || header.ends_with(b"\n\n") {
            let length = content_length(&header)?;
            let payload = read_body(reader, length).await?;
            return Ok(Some(InboundMessage {
                payload,
                framing: Framing::ContentLength,
            }));
        }

        if header.len() == 1 && looks_like_json(byte) {
            let payload = read_line(reader, header).await?;
            return Ok(Some(InboundMessage {
                payload,
                framing: Framing::Unframed,
            }));
        }
    }
}

/// Write one serialized envelope using `framing`, then flush
pub async fn write_message<W>(writer: &mut W, body: &[u8], framing: Framing) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match framing {
        Framing::ContentLength => {
            let header = format!("Content-Length: {}\r\n\r\n", body.len());
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(body).await?;
        }
        Framing::Unframed => {
            writer.write_all(body).await?;
            writer.write_all(b"\n").await?;
        }
    }
    writer.flush().await
}

async fn read_byte<R>(reader: &mut R) -> io::Result<Option<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut byte = [0u8; 1];
    match reader.read(&mut byte).await? {
        0 => Ok(None),
        _ => Ok(Some(byte[0])),
    }
}

fn looks_like_json(byte: u8) -> bool {
    byte == b'{' || byte == b'['
}

/// End of stream before a terminator: clean stop, bare JSON, or an error
fn finish_at_eof(header: &[u8]) -> Result<Option<InboundMessage>, FramingError> {
    if header.is_empty() {
        return Ok(None);
    }

    let trimmed = trim_whitespace(header);
    match trimmed.first() {
        Some(&first) if looks_like_json(first) => Ok(Some(InboundMessage {
            payload: trimmed.to_vec(),
            framing: Framing::Unframed,
        })),
        _ => Err(FramingError::EofInHeader),
    }
}

/// Extract the first `Content-Length` value from a header block
fn content_length(header: &[u8]) -> Result<usize, FramingError> {
    let text = String::from_utf8_lossy(header);
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| parse_length(value.trim()))
        .ok_or(FramingError::InvalidContentLength)
}

/// Plain decimal digits only; `parse` alone would accept a leading `+`
fn parse_length(value: &str) -> Option<usize> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

async fn read_body<R>(reader: &mut R, length: usize) -> Result<Vec<u8>, FramingError>
where
    R: AsyncRead + Unpin,
{
    // The buffer grows with bytes received, never with the declared length
    let mut body = Vec::new();
    reader.take(length as u64).read_to_end(&mut body).await?;
    if body.len() < length {
        return Err(FramingError::EofInBody { expected: length });
    }
    Ok(body)
}

/// Read the rest of a header-less JSON message up to `\n` or end of stream
async fn read_line<R>(reader: &mut R, mut buffer: Vec<u8>) -> Result<Vec<u8>, FramingError>
where
    R: AsyncRead + Unpin,
{
    while let Some(byte) = read_byte(reader).await? {
        if byte == b'\n' {
            break;
        }
        buffer.push(byte);
    }
    Ok(trim_whitespace(&buffer).to_vec())
}

fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
