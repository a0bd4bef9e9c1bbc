use futures::{Sink, SinkExt, Stream, StreamExt, stream::BoxStream};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::TransportError;

/// The general purpose trait for handling messages of duplex connections.
#[async_trait::async_trait]
pub trait PubSubHandler: Clone + Send + Sync + 'static {
    /// The message type the client sends
    type Request: DeserializeOwned + Send;
    /// The message type pushed to the client
    type Notification: Serialize + Send + 'static;

    /// Invoked when a new connection was established.
    ///
    /// Everything the returned stream yields is forwarded to this client until either side closes.
    fn on_connect(&self) -> BoxStream<'static, Self::Notification>;

    /// Invoked for every request of the client.
    async fn on_request(&self, request: Self::Request);

    /// Invoked if a client message could not be deserialized into [`Self::Request`].
    fn on_invalid_request(&self, err: serde_json::Error, text: &str) {
        warn!(target: "server::pubsub", %err, len = text.len(), "invalid client message");
    }

    /// Invoked once the connection is gone.
    fn on_disconnect(&self) {}
}

/// A connection to a single client.
///
/// The connection yields `Ok(None)` for frames that carry no request (pings, binary data) and ends
/// when the client closed it.
pub struct PubSubConnection<Handler, Connection> {
    /// the handler for the connection
    handler: Handler,
    /// the underlying transport
    connection: Connection,
}

// === impl PubSubConnection ===

impl<Handler, Connection> PubSubConnection<Handler, Connection>
where
    Handler: PubSubHandler,
    Connection: Stream<Item = Result<Option<String>, TransportError>>
        + Sink<String, Error = TransportError>
        + Unpin,
{
    pub fn new(handler: Handler, connection: Connection) -> Self {
        Self { handler, connection }
    }

    /// Drives the connection until the client disconnects or a send fails.
    pub async fn run(self) {
        let Self { handler, mut connection } = self;
        let mut notifications = handler.on_connect();

        loop {
            tokio::select! {
                msg = connection.next() => match msg {
                    Some(Ok(Some(text))) => {
                        trace!(target: "server::pubsub", len = text.len(), "received client message");
                        match serde_json::from_str::<Handler::Request>(&text) {
                            Ok(request) => handler.on_request(request).await,
                            Err(err) => handler.on_invalid_request(err, &text),
                        }
                    }
                    Some(Ok(None)) => {}
                    Some(Err(err)) => {
                        trace!(target: "server::pubsub", %err, "client connection failed");
                        break
                    }
                    None => {
                        trace!(target: "server::pubsub", "client disconnected");
                        break
                    }
                },
                Some(notification) = notifications.next() => {
                    let text = match serde_json::to_string(&notification) {
                        Ok(text) => text,
                        Err(err) => {
                            error!(target: "server::pubsub", %err, "failed to serialize notification");
                            continue
                        }
                    };
                    if let Err(err) = connection.send(text).await {
                        trace!(target: "server::pubsub", %err, "failed to send to client");
                        break
                    }
                }
            }
        }

        handler.on_disconnect();
    }
}
