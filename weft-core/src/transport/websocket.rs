//! WebSocket carrier.
//!
//! The session identifier is the last segment of the upgrade request's path,
//! e.g. `ws://host/ws/1234`. Text frames are client messages; binary frames
//! must hold UTF-8. Every outbound fragment is one text frame.

use std::time::Duration;

use futures_util::{future, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::TransportError;
use crate::error::LiveError;
use crate::session::{SessionId, SessionManager};

/// Upgrade `stream` to a WebSocket and serve the session its path names.
///
/// Resolves when the client goes away; the session stays retained.
pub async fn accept<S>(manager: &SessionManager, stream: S) -> Result<(), LiveError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut path = String::new();
    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        path = request.uri().path().to_owned();
        if SessionId::from_path(&path).is_some() {
            return Ok(response);
        }
        let mut rejection = ErrorResponse::new(Some("missing session identifier".to_owned()));
        *rejection.status_mut() = StatusCode::BAD_REQUEST;
        Err(rejection)
    };

    let socket = tokio_tungstenite::accept_hdr_async(stream, callback)
        .await
        .map_err(TransportError::from)?;
    let session = SessionId::from_path(&path).ok_or_else(|| TransportError::MissingSession(path.clone()))?;
    debug!(session = %session, "websocket upgraded");

    let (sink, stream) = socket.split();

    let inbound = stream.filter_map(|frame| {
        future::ready(match frame {
            Ok(Message::Text(text)) => Some(Ok(text)),
            Ok(Message::Binary(bytes)) => {
                Some(String::from_utf8(bytes).map_err(|err| TransportError::InvalidFrame(err.to_string())))
            }
            // Control frames are answered by the protocol layer; a close
            // frame is followed by the end of the stream.
            Ok(_) => None,
            Err(err) => Some(Err(TransportError::from(err))),
        })
    });
    let outbound = sink.with(|fragment: String| future::ready(Ok::<_, TransportError>(Message::Text(fragment))));

    manager
        .serve(session, super::inbound(inbound), super::outbound(outbound))
        .await
}

/// Accept WebSocket clients on `listener` until the task is dropped.
///
/// Each client is served on its own task. Eviction is not started here; pair
/// this with [`SessionManager::spawn_sweeper`].
pub async fn listen(manager: SessionManager, listener: TcpListener) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "listening for websocket clients");

    loop {
        let (tcp, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "accept failed");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        let manager = manager.clone();
        tokio::spawn(async move {
            debug!(%peer, "client connected");
            if let Err(err) = accept(&manager, tcp).await {
                debug!(%peer, error = %err, "client session ended with error");
            }
        });
    }
}
