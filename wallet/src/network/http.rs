//! [`NodeGateway`] over a node's REST API and WebSocket push channel.
//!
//! REST calls go through one pooled `reqwest::Client` with the configured
//! request timeout. Each subscription owns its own WebSocket: a background
//! task pumps decoded frames into an mpsc channel until the subscription's
//! cancellation token fires, then unsubscribes and closes the socket.
//!
//! ## Push channel protocol
//!
//! ```text
//! node   -> {"uid": "..."}                                      on connect
//! client -> {"uid": "...", "subscribe": "block"}
//! client -> {"uid": "...", "subscribe": "confirmedAdded/ADDR"}
//! client -> {"uid": "...", "subscribe": "status/ADDR"}
//! node   -> {"topic": "...", "data": {...}}                     per event
//! ```

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::gateway::{
    AccountInfo, AnnounceResponse, ChannelEvent, ConfirmedTransaction, FeeMultipliers,
    GatewayError, NodeGateway, Subscription,
};
use crate::config::ClientConfig;
use crate::identity::address::Address;
use crate::transaction::signing::SignedTransaction;
use crate::transaction::types::{GenerationHash, Mosaic, MosaicId, TransactionHash};

/// Events buffered per subscription before the pump waits for the reader.
const EVENT_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// REST DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeInfoDto {
    network_identifier: u8,
    network_generation_hash_seed: String,
}

#[derive(Debug, Deserialize)]
struct NetworkPropertiesDto {
    #[serde(default)]
    network: NetworkSectionDto,
    #[serde(default)]
    chain: ChainSectionDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkSectionDto {
    epoch_adjustment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainSectionDto {
    currency_mosaic_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountEnvelopeDto {
    account: AccountDto,
}

#[derive(Debug, Deserialize)]
struct AccountDto {
    #[serde(default)]
    mosaics: Vec<MosaicDto>,
}

#[derive(Debug, Deserialize)]
struct MosaicDto {
    id: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct ConfirmedEnvelopeDto {
    meta: MetaDto,
}

#[derive(Debug, Deserialize)]
struct MetaDto {
    height: String,
}

fn decode_err(what: &str, detail: impl std::fmt::Display) -> GatewayError {
    GatewayError::Decode(format!("{}: {}", what, detail))
}

/// `"1667250467s"` -> `1667250467`. Nodes print durations with a unit
/// suffix and optional `'` separators.
fn parse_epoch_adjustment(raw: &str) -> Result<u64, GatewayError> {
    let digits: String = raw
        .trim()
        .trim_end_matches('s')
        .chars()
        .filter(|c| *c != '\'')
        .collect();
    digits
        .parse()
        .map_err(|e| decode_err("epochAdjustment", format!("'{}' ({})", raw, e)))
}

fn parse_u64(field: &str, raw: &str) -> Result<u64, GatewayError> {
    raw.parse()
        .map_err(|e| decode_err(field, format!("'{}' ({})", raw, e)))
}

fn to_account_info(address: &Address, dto: AccountDto) -> Result<AccountInfo, GatewayError> {
    let mosaics = dto
        .mosaics
        .into_iter()
        .map(|m| {
            let id = MosaicId::parse(&m.id).map_err(|e| decode_err("mosaic id", e))?;
            let amount = parse_u64("mosaic amount", &m.amount)?;
            Ok(Mosaic::new(id, amount))
        })
        .collect::<Result<Vec<_>, GatewayError>>()?;
    Ok(AccountInfo {
        address: *address,
        mosaics,
    })
}

// ---------------------------------------------------------------------------
// Push channel frames
// ---------------------------------------------------------------------------

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// Decodes one push-channel frame. `Ok(None)` for frames that carry no
/// event (the uid handshake, topics we did not ask for).
fn decode_frame(text: &str) -> Result<Option<ChannelEvent>, GatewayError> {
    let frame: Value = serde_json::from_str(text).map_err(|e| decode_err("push frame", e))?;
    let Some(topic) = frame.get("topic").and_then(Value::as_str) else {
        return Ok(None);
    };
    let data = frame.get("data").unwrap_or(&Value::Null);

    if topic == "block" {
        let height = str_at(data, "/block/height").ok_or_else(|| decode_err("block frame", "missing height"))?;
        return Ok(Some(ChannelEvent::Block {
            height: parse_u64("block height", height)?,
        }));
    }
    if topic.starts_with("confirmedAdded") {
        let hash = str_at(data, "/meta/hash").ok_or_else(|| decode_err("confirmed frame", "missing hash"))?;
        let height = str_at(data, "/meta/height").ok_or_else(|| decode_err("confirmed frame", "missing height"))?;
        return Ok(Some(ChannelEvent::Confirmed {
            hash: TransactionHash::from_hex(hash).map_err(|e| decode_err("confirmed frame", e))?,
            height: parse_u64("confirmed height", height)?,
        }));
    }
    if topic.starts_with("status") {
        let hash = str_at(data, "/hash").ok_or_else(|| decode_err("status frame", "missing hash"))?;
        let code = str_at(data, "/code").unwrap_or("unknown");
        return Ok(Some(ChannelEvent::Status {
            hash: TransactionHash::from_hex(hash).map_err(|e| decode_err("status frame", e))?,
            code: code.to_string(),
        }));
    }
    Ok(None)
}

fn channels_for(address: &Address) -> [String; 3] {
    [
        "block".to_string(),
        format!("confirmedAdded/{}", address),
        format!("status/{}", address),
    ]
}

// ---------------------------------------------------------------------------
// HttpGateway
// ---------------------------------------------------------------------------

/// Gateway to a live node.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    websocket_url: String,
    request_timeout: Duration,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.node_url.trim_end_matches('/').to_string(),
            websocket_url: config.websocket_endpoint(),
            request_timeout: config.request_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path`. `Ok(None)` on 404.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| decode_err(path, e))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.get_optional(path).await?.ok_or(GatewayError::Http {
            status: 404,
            body: format!("{} not found", path),
        })
    }
}

#[async_trait]
impl NodeGateway for HttpGateway {
    async fn network_identifier(&self) -> Result<u8, GatewayError> {
        let info: NodeInfoDto = self.get_json("/node/info").await?;
        Ok(info.network_identifier)
    }

    async fn epoch_adjustment(&self) -> Result<u64, GatewayError> {
        let props: NetworkPropertiesDto = self.get_json("/network/properties").await?;
        let raw = props
            .network
            .epoch_adjustment
            .ok_or_else(|| decode_err("/network/properties", "missing network.epochAdjustment"))?;
        parse_epoch_adjustment(&raw)
    }

    async fn generation_hash(&self) -> Result<GenerationHash, GatewayError> {
        let info: NodeInfoDto = self.get_json("/node/info").await?;
        GenerationHash::from_hex(&info.network_generation_hash_seed)
            .map_err(|e| decode_err("networkGenerationHashSeed", e))
    }

    async fn currency_id(&self) -> Result<Option<MosaicId>, GatewayError> {
        let props: NetworkPropertiesDto = self.get_json("/network/properties").await?;
        props
            .chain
            .currency_mosaic_id
            .map(|raw| MosaicId::parse(&raw).map_err(|e| decode_err("currencyMosaicId", e)))
            .transpose()
    }

    async fn fee_multipliers(&self) -> Result<FeeMultipliers, GatewayError> {
        self.get_json("/network/fees/transaction").await
    }

    async fn account_info(&self, address: &Address) -> Result<Option<AccountInfo>, GatewayError> {
        let envelope: Option<AccountEnvelopeDto> =
            self.get_optional(&format!("/accounts/{}", address)).await?;
        envelope
            .map(|e| to_account_info(address, e.account))
            .transpose()
    }

    async fn announce(&self, signed: &SignedTransaction) -> Result<AnnounceResponse, GatewayError> {
        let response = self
            .client
            .put(self.url("/transactions"))
            .json(&json!({ "payload": signed.payload_hex() }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            });
        }
        // The acceptance body is informational; keep it raw if it is not JSON.
        let message = serde_json::from_str::<AnnounceResponse>(&body)
            .map(|r| r.message)
            .unwrap_or(body);
        Ok(AnnounceResponse { message })
    }

    async fn confirmed_transaction(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<ConfirmedTransaction>, GatewayError> {
        let envelope: Option<ConfirmedEnvelopeDto> = self
            .get_optional(&format!("/transactions/confirmed/{}", hash))
            .await?;
        envelope
            .map(|e| {
                Ok(ConfirmedTransaction {
                    hash: *hash,
                    height: parse_u64("meta.height", &e.meta.height)?,
                })
            })
            .transpose()
    }

    async fn subscribe(&self, address: &Address) -> Result<Box<dyn Subscription>, GatewayError> {
        let (socket, _) = tokio_tungstenite::connect_async(self.websocket_url.as_str())
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let (mut sink, mut stream) = socket.split();

        let uid = tokio::time::timeout(self.request_timeout, async {
            while let Some(frame) = stream.next().await {
                let frame = frame.map_err(|e| GatewayError::Transport(e.to_string()))?;
                if let WsMessage::Text(text) = frame {
                    let value: Value = serde_json::from_str(&text).map_err(|e| decode_err("uid frame", e))?;
                    if let Some(uid) = value.get("uid").and_then(Value::as_str) {
                        return Ok(uid.to_string());
                    }
                }
            }
            Err::<String, GatewayError>(GatewayError::ChannelClosed)
        })
        .await
        .map_err(|_| GatewayError::Transport("timed out waiting for push channel uid".to_string()))??;

        let channels = channels_for(address);
        for channel in &channels {
            let frame = json!({ "uid": uid, "subscribe": channel }).to_string();
            sink.send(WsMessage::Text(frame))
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))?;
        }
        debug!(%address, %uid, "push channel subscribed");

        let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    frame = stream.next() => {
                        let outcome = match frame {
                            Some(Ok(WsMessage::Text(text))) => match decode_frame(&text) {
                                Ok(Some(event)) => Ok(event),
                                Ok(None) => continue,
                                Err(e) => {
                                    warn!(error = %e, "undecodable push frame skipped");
                                    continue;
                                }
                            },
                            Some(Ok(WsMessage::Close(_))) | None => Err(GatewayError::ChannelClosed),
                            Some(Ok(_)) => continue,
                            Some(Err(e)) => Err(GatewayError::Transport(e.to_string())),
                        };
                        let terminal = outcome.is_err();
                        if sender.send(outcome).await.is_err() || terminal {
                            break;
                        }
                    }
                }
            }

            for channel in &channels {
                let frame = json!({ "uid": uid, "unsubscribe": channel }).to_string();
                if sink.send(WsMessage::Text(frame)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
            debug!(%uid, "push channel closed");
        });

        Ok(Box::new(WebSocketSubscription {
            receiver,
            cancel,
        }))
    }
}

/// Subscription backed by a WebSocket pump task.
pub struct WebSocketSubscription {
    receiver: mpsc::Receiver<Result<ChannelEvent, GatewayError>>,
    cancel: CancellationToken,
}

#[async_trait]
impl Subscription for WebSocketSubscription {
    async fn next_event(&mut self) -> Result<ChannelEvent, GatewayError> {
        self.receiver
            .recv()
            .await
            .unwrap_or(Err(GatewayError::ChannelClosed))
    }

    fn close(&mut self) {
        self.cancel.cancel();
        self.receiver.close();
    }
}

impl Drop for WebSocketSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
