//! Native messaging frame codec.
//!
//! Each frame is a 4-byte length in native byte order followed by that many
//! bytes of UTF-8 JSON. The browser accepts at most 1 MiB from the host and
//! may send up to 64 MiB to it.

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::CodecError;

/// Largest frame accepted from the browser (64 MiB).
pub const MAX_INBOUND_FRAME: usize = 67_108_864;

/// Largest frame sent to the browser (1 MiB).
pub const MAX_OUTBOUND_FRAME: usize = 1_048_576;

/// Read one frame payload.
///
/// Returns `Ok(None)` on a clean end of input (EOF before a length prefix).
///
/// # Errors
///
/// Returns [`CodecError::FrameTooLarge`] for a declared length above
/// [`MAX_INBOUND_FRAME`], or [`CodecError::Io`] if the pipe fails or closes
/// mid-frame.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, CodecError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0_u8; 4];
    match reader.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let declared = u32::from_ne_bytes(prefix);
    let len = usize::try_from(declared).unwrap_or(usize::MAX);
    if len > MAX_INBOUND_FRAME {
        return Err(CodecError::FrameTooLarge {
            len,
            max: MAX_INBOUND_FRAME,
        });
    }

    let mut payload = vec![0_u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Encode `message` as JSON and write it as one frame, then flush.
///
/// # Errors
///
/// Returns [`CodecError::FrameTooLarge`] if the encoding exceeds
/// [`MAX_OUTBOUND_FRAME`] (nothing is written), [`CodecError::Encode`] if
/// serialization fails, or [`CodecError::Io`] if the pipe fails.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let payload = serde_json::to_vec(message)?;
    let too_large = CodecError::FrameTooLarge {
        len: payload.len(),
        max: MAX_OUTBOUND_FRAME,
    };
    if payload.len() > MAX_OUTBOUND_FRAME {
        return Err(too_large);
    }
    let Ok(len) = u32::try_from(payload.len()) else {
        return Err(too_large);
    };

    writer.write_all(&len.to_ne_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use goblin_types::{Outbound, Response};

    use super::*;

    #[tokio::test]
    async fn frame_carries_native_endian_length() {
        let mut buf = Vec::new();
        let message = Outbound::Response {
            id: 3,
            response: Response::Ack,
        };
        write_frame(&mut buf, &message).await.unwrap();

        let (prefix, body) = buf.split_at(4);
        let len = u32::from_ne_bytes(prefix.try_into().unwrap());
        assert_eq!(usize::try_from(len).unwrap(), body.len());

        let mut reader = buf.as_slice();
        let payload = read_frame(&mut reader).await.unwrap().unwrap();
        let decoded: Outbound = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded, message);
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_inbound_frame_is_rejected() {
        let declared = u32::try_from(MAX_INBOUND_FRAME + 1).unwrap();
        let mut reader: &[u8] = &declared.to_ne_bytes();
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, CodecError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn truncated_frame_is_an_io_error() {
        let mut bytes = 10_u32.to_ne_bytes().to_vec();
        bytes.extend_from_slice(b"{\"ki");
        let mut reader = bytes.as_slice();
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, CodecError::Io { .. }));
    }

    #[tokio::test]
    async fn oversized_outbound_frame_writes_nothing() {
        let mut buf = Vec::new();
        let huge = "x".repeat(MAX_OUTBOUND_FRAME);
        let err = write_frame(&mut buf, &huge).await.unwrap_err();
        assert!(matches!(err, CodecError::FrameTooLarge { .. }));
        assert!(buf.is_empty());
    }
}
