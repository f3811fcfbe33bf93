//! Bounded, cancellable body copying.
//!
//! Every body that crosses the server (local files, request bodies sent
//! upstream, upstream responses) is re-chunked through one fixed 4 KiB buffer.
//! The copy checks the server's cancellation token between chunks and while
//! waiting on a read, so shutdown aborts in-flight transfers promptly.

use std::io;

use axum::body::Body;
use axum::http::Extensions;
use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

/// Size of the copy window.
pub const COPY_BUFFER_SIZE: usize = 4096;

/// Cancellation token attached to requests by the server runtime.
///
/// Requests built outside the server (tests, tools) get a token that is never cancelled.
pub fn cancel_token(extensions: &Extensions) -> CancellationToken {
    extensions
        .get::<CancellationToken>()
        .cloned()
        .unwrap_or_default()
}

/// Stream `reader` in chunks of at most [`COPY_BUFFER_SIZE`] bytes.
///
/// The stream ends at EOF, or yields one `Interrupted` error once `cancel` fires.
pub fn relay<R>(reader: R, cancel: CancellationToken) -> impl Stream<Item = io::Result<Bytes>> + Send
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let state = Some((reader, vec![0u8; COPY_BUFFER_SIZE], cancel));
    futures_util::stream::unfold(state, |state| async move {
        let (mut reader, mut buf, cancel) = state?;

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(interrupted()),
            read = reader.read(&mut buf) => read,
        };

        match read {
            Ok(0) => None,
            Ok(n) => {
                let chunk = Bytes::copy_from_slice(&buf[..n]);
                Some((Ok(chunk), Some((reader, buf, cancel))))
            }
            Err(e) => Some((Err(e), None)),
        }
    })
}

/// Wrap `reader` as a response or request body.
pub fn relay_body<R>(reader: R, cancel: CancellationToken) -> Body
where
    R: AsyncRead + Send + Unpin + 'static,
{
    Body::from_stream(relay(reader, cancel))
}

/// Adapt a body into an `AsyncRead` so it can go through [`relay`].
pub fn body_reader(body: Body) -> impl AsyncRead + Send + Unpin + 'static {
    StreamReader::new(body.into_data_stream().map_err(io::Error::other))
}

fn interrupted() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "transfer cancelled")
}
