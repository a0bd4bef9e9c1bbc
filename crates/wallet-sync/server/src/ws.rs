use crate::{
    error::TransportError,
    pubsub::{PubSubConnection, PubSubHandler},
};
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{Sink, Stream, ready};
use std::{
    pin::Pin,
    task::{Context, Poll},
};

/// Handles incoming Websocket upgrade
///
/// This is the entrypoint invoked by the axum server for a websocket request
pub async fn handle_ws<Handler: PubSubHandler>(
    ws: WebSocketUpgrade,
    State(handler): State<Handler>,
) -> Response {
    ws.on_upgrade(|socket| PubSubConnection::new(handler, WsConn(socket)).run())
}

/// Adapts a [`WebSocket`] to the text frames of a [`PubSubConnection`].
#[pin_project::pin_project]
pub struct WsConn(#[pin] pub WebSocket);

impl Stream for WsConn {
    type Item = Result<Option<String>, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        fn on_message(msg: Message) -> Option<Result<Option<String>, TransportError>> {
            match msg {
                Message::Text(text) => Some(Ok(Some(text.as_str().to_owned()))),
                Message::Binary(_) => {
                    warn!(target: "server::ws", "unexpected binary data");
                    Some(Ok(None))
                }
                Message::Close(_) => {
                    trace!(target: "server::ws", "ws client disconnected");
                    None
                }
                // pongs are answered by the websocket implementation
                Message::Ping(_) | Message::Pong(_) => Some(Ok(None)),
            }
        }

        match ready!(self.project().0.poll_next(cx)) {
            Some(Ok(msg)) => Poll::Ready(on_message(msg)),
            Some(Err(err)) => Poll::Ready(Some(Err(err.into()))),
            None => Poll::Ready(None),
        }
    }
}

impl Sink<String> for WsConn {
    type Error = TransportError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().0.poll_ready(cx).map_err(Into::into)
    }

    fn start_send(self: Pin<&mut Self>, item: String) -> Result<(), Self::Error> {
        self.project().0.start_send(Message::Text(item.into())).map_err(Into::into)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().0.poll_flush(cx).map_err(Into::into)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().0.poll_close(cx).map_err(Into::into)
    }
}
