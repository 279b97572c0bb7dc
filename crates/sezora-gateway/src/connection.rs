use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use sezora_core::Session;
use sezora_db::Database;
use sezora_types::api::Claims;
use sezora_types::events::{GatewayCommand, GatewayEvent};

use crate::session::{GatewaySession, Step};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct GatewayContext {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub admin_email: String,
}

type Sender = SplitSink<WebSocket, Message>;
type Receiver = SplitStream<WebSocket>;

/// Handle a single WebSocket connection: Identify handshake, then the
/// conversation snapshot, then pushed messages until either side goes away.
pub async fn handle_connection(socket: WebSocket, ctx: GatewayContext) {
    let (mut sender, mut receiver) = socket.split();

    let Some(claims) = wait_for_identify(&mut receiver, &ctx.jwt_secret).await else {
        warn!("WebSocket client failed to identify, closing");
        return;
    };

    let Some(session) = load_session(&ctx, &claims).await else {
        warn!("Identified user {} has no profile, closing", claims.sub);
        return;
    };

    info!("{} ({}) connected to gateway", session.user().email, session.user_id());

    let (mut gw, initial) = GatewaySession::open(ctx.db.clone(), session).await;
    for event in &initial {
        if !send_event(&mut sender, event).await {
            gw.close();
            return;
        }
    }

    run_connection_loop(&mut gw, sender, receiver).await;

    gw.close();
    info!(
        "{} ({}) disconnected from gateway",
        gw.session().user().email,
        gw.session().user_id()
    );
}

async fn run_connection_loop(gw: &mut GatewaySession, mut sender: Sender, mut receiver: Receiver) {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<GatewayCommand>(16);

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_recv = pong_received.clone();
    let user_id = gw.session().user_id();

    // Read commands from client
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => {
                        if cmd_tx.send(cmd).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(
                            "{} bad command: {} -- raw: {}",
                            user_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut missed_heartbeats: u8 = 0;

    loop {
        tokio::select! {
            step = gw.next_step() => {
                let event = match step {
                    Step::Send(event) => event,
                    Step::Idle => continue,
                    Step::Reload => gw.reload().await,
                    Step::Closed => break,
                };
                if !send_event(&mut sender, &event).await {
                    break;
                }
            }
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                if let Some(event) = handle_command(gw, cmd).await {
                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
            }
            _ = heartbeat.tick() => {
                if pong_received.swap(false, Ordering::Acquire) {
                    missed_heartbeats = 0;
                } else {
                    missed_heartbeats += 1;
                    if missed_heartbeats >= 2 {
                        warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                        break;
                    }
                }
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    recv_task.abort();
    let _ = (&mut recv_task).await;
}

/// Reply to a command from an identified client.
async fn handle_command(gw: &mut GatewaySession, cmd: GatewayCommand) -> Option<GatewayEvent> {
    match cmd {
        // Already handled
        GatewayCommand::Identify { .. } => None,
        GatewayCommand::Reload => Some(gw.reload().await),
    }
}

/// First valid Identify within [`IDENTIFY_TIMEOUT`]. Other frames are skipped;
/// a bad token or a closed socket ends the handshake.
async fn wait_for_identify<S, E>(receiver: &mut S, jwt_secret: &str) -> Option<Claims>
where
    S: Stream<Item = Result<Message, E>> + Unpin,
{
    let identify = async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(GatewayCommand::Identify { token }) =
                    serde_json::from_str::<GatewayCommand>(&text)
                {
                    let token_data = decode::<Claims>(
                        &token,
                        &DecodingKey::from_secret(jwt_secret.as_bytes()),
                        &Validation::default(),
                    )
                    .ok()?;

                    return Some(token_data.claims);
                }
            }
        }
        None
    };

    tokio::time::timeout(IDENTIFY_TIMEOUT, identify).await.ok().flatten()
}

async fn load_session(ctx: &GatewayContext, claims: &Claims) -> Option<Session> {
    let db = ctx.db.clone();
    let admin_email = ctx.admin_email.clone();
    let user_id = claims.sub;

    match tokio::task::spawn_blocking(move || Session::load(&db, user_id, &admin_email)).await {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => {
            warn!("Could not load session for {}: {:#}", user_id, e);
            None
        }
        Err(e) => {
            error!("spawn_blocking join error: {}", e);
            None
        }
    }
}

async fn send_event(sender: &mut Sender, event: &GatewayEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(text) => sender.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            error!("Failed to encode gateway event: {}", e);
            true
        }
    }
}
