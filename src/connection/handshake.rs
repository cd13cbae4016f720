use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::sasl::{Authenticated, Authenticator};

/// Drive `auth` over `stream` until the handshake completes.
///
/// The stream is shut down if authentication fails.
pub(crate) async fn authenticate<S>(stream: &mut S, auth: &mut Authenticator) -> Result<Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match drive(stream, auth).await {
        Ok(authenticated) => Ok(authenticated),
        Err(error) => {
            debug!(%error, "authentication failed, closing transport");
            _ = stream.shutdown().await;
            Err(error)
        }
    }
}

async fn drive<S>(stream: &mut S, auth: &mut Authenticator) -> Result<Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut out = Vec::new();
    let mut buf = vec![0; 4096];

    auth.start(&mut out)?;

    loop {
        if !out.is_empty() {
            stream.write_all(&out).await?;
            stream.flush().await?;
            out.clear();
        }

        let n = stream.read(&mut buf).await?;

        if n == 0 {
            return Err(Error::new(ErrorKind::AuthenticationFailed(
                "connection closed during authentication".into(),
            )));
        }

        if let Some(authenticated) = auth.feed(&buf[..n], &mut out)? {
            stream.write_all(&out).await?;
            stream.flush().await?;
            return Ok(authenticated);
        }
    }
}
