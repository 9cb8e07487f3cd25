//! WebSocket module for real-time fleet statistics streaming
//!
//! Provides a WebSocket endpoint for dashboard clients to receive fleet
//! statistics without polling the REST API.

use actix::{Actor, ActorContext, ActorFutureExt, AsyncContext, StreamHandler};
use actix_web_actors::ws;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::models::WsMessage;
use crate::store::SensorStore;

/// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// How long before lack of client response causes a timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// How often fleet statistics are re-evaluated for pushing
const STATS_INTERVAL: Duration = Duration::from_secs(1);

/// WebSocket session actor
pub struct WsSession {
    client_id: String,
    last_heartbeat: Instant,
    store: Arc<SensorStore>,
    /// Last payload pushed, to suppress unchanged updates
    last_payload: Option<String>,
}

impl WsSession {
    pub fn new(client_id: String, store: Arc<SensorStore>) -> Self {
        Self {
            client_id,
            last_heartbeat: Instant::now(),
            store,
            last_payload: None,
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    client_id = %act.client_id,
                    "WebSocket heartbeat timeout"
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn start_stats_polling(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(STATS_INTERVAL, |act, ctx| {
            let store = act.store.clone();

            let fut = async move { store.fleet_stats().await };
            let fut = actix::fut::wrap_future::<_, Self>(fut);

            ctx.spawn(fut.map(|stats, act, ctx| {
                let msg = WsMessage::FleetUpdate(stats);
                if let Ok(json) = serde_json::to_string(&msg) {
                    if act.last_payload.as_ref() != Some(&json) {
                        act.last_payload = Some(json.clone());
                        ctx.text(json);
                    }
                }
            }));
        });
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(client_id = %self.client_id, "WebSocket connected");

        self.start_heartbeat(ctx);
        self.start_stats_polling(ctx);

        let msg = WsMessage::Connected {
            client_id: self.client_id.clone(),
        };

        if let Ok(json) = serde_json::to_string(&msg) {
            ctx.text(json);
        }
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        info!(client_id = %self.client_id, "WebSocket disconnected");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                debug!(client_id = %self.client_id, message = %text);

                match serde_json::from_str::<WsMessage>(&text) {
                    Ok(WsMessage::Ping) => {
                        self.last_heartbeat = Instant::now();
                        if let Ok(json) = serde_json::to_string(&WsMessage::Pong) {
                            ctx.text(json);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(client_id = %self.client_id, error = %e);
                        let err = WsMessage::Error {
                            message: "Invalid message format".into(),
                        };
                        if let Ok(json) = serde_json::to_string(&err) {
                            ctx.text(json);
                        }
                    }
                }
            }
            Ok(ws::Message::Close(reason)) => {
                info!(client_id = %self.client_id, reason = ?reason);
                ctx.stop();
            }
            Err(e) => {
                warn!(client_id = %self.client_id, error = %e);
                ctx.stop();
            }
            _ => {}
        }
    }
}
