use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::SharedState,
};

/// Subscribe to the outbox stream.
pub fn subscribe_outbox(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.outbox().subscribe()
}

/// Greet a freshly connected outbox client with the current degraded flag.
pub async fn broadcast_handshake(state: &SharedState) {
    let handshake = Handshake {
        stream: "outbox".into(),
        message: "outbox stream connected".into(),
        degraded: state.is_degraded().await,
    };
    match ServerEvent::json(Some("handshake".to_owned()), &handshake) {
        Ok(event) => state.outbox().broadcast(event),
        Err(err) => warn!(error = %err, "failed to serialise handshake"),
    }
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // The connector missed actions; keep streaming.
                            warn!(skipped, "outbox subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!("outbox SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
