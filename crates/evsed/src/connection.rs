//! One EV connection
//!
//! Reads V2GTP frames from the socket, feeds them to the session engine and
//! writes the responses back. Control events from the host and the engine's
//! timers are multiplexed on the same task.

use anyhow::{bail, Context};
use bytes::{Bytes, BytesMut};
use d20_engine::{ControlEvent, Engine, Event, Feedback, Signal};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};
use v2g_proto::{read_header, PayloadType, SessionId, HEADER_LENGTH};

use crate::simulator::ChargerSimulator;

const CONTROL_QUEUE: usize = 32;

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnd {
    pub session_id: SessionId,
    /// The EV paused the session and may resume it on a new connection
    pub paused: bool,
    pub terminated: bool,
}

pub struct Connection<S> {
    stream: S,
    engine: Engine,
    buffer: BytesMut,
    max_payload: u32,
    controls_tx: mpsc::Sender<ControlEvent>,
    controls: mpsc::Receiver<ControlEvent>,
    simulator: Option<ChargerSimulator>,
    paused: bool,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, engine: Engine, max_payload: u32) -> Self {
        let (controls_tx, controls) = mpsc::channel(CONTROL_QUEUE);
        Self {
            stream,
            engine,
            buffer: BytesMut::with_capacity(4096),
            max_payload,
            controls_tx,
            controls,
            simulator: None,
            paused: false,
        }
    }

    /// Sender for control events from the host
    pub fn controls(&self) -> mpsc::Sender<ControlEvent> {
        self.controls_tx.clone()
    }

    /// Answer feedback signals with simulated hardware events
    pub fn with_simulator(mut self, config: crate::config::SimulatorConfig) -> Self {
        self.simulator = Some(ChargerSimulator::new(config, self.controls()));
        self
    }

    /// Serve the connection until the EV disconnects or the session ends
    pub async fn run(mut self) -> anyhow::Result<SessionEnd> {
        loop {
            let timer = self.engine.next_deadline();
            let wake_at = timer.map_or_else(Instant::now, |(_, at)| Instant::from_std(at));

            tokio::select! {
                read = self.stream.read_buf(&mut self.buffer) => {
                    if read.context("Socket read failed")? == 0 {
                        info!("EV closed the connection");
                        break;
                    }
                    while let Some((payload_type, payload)) = next_frame(&mut self.buffer, self.max_payload)? {
                        debug!(?payload_type, len = payload.len(), "Frame received");
                        let response = self
                            .engine
                            .handle_payload(payload_type, &payload)
                            .context("Unusable frame from EV")?;
                        self.send(response).await?;
                        self.dispatch_feedback();
                        if self.engine.is_terminated() {
                            break;
                        }
                    }
                }
                Some(event) = self.controls.recv() => {
                    let response = self.engine.handle_framed(Event::Control(event))?;
                    self.send(response).await?;
                }
                _ = tokio::time::sleep_until(wake_at), if timer.is_some() => {
                    if let Some((kind, _)) = timer {
                        let response = self.engine.handle_framed(Event::Timeout(kind))?;
                        self.send(response).await?;
                    }
                }
            }

            self.dispatch_feedback();
            if self.engine.is_terminated() {
                break;
            }
        }

        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "Socket shutdown failed");
        }

        Ok(SessionEnd {
            session_id: self.engine.session().id(),
            paused: self.paused,
            terminated: self.engine.is_terminated(),
        })
    }

    async fn send(&mut self, frame: Option<Vec<u8>>) -> anyhow::Result<()> {
        if let Some(frame) = frame {
            self.stream
                .write_all(&frame)
                .await
                .context("Socket write failed")?;
        }
        Ok(())
    }

    fn dispatch_feedback(&mut self) {
        for feedback in self.engine.drain_feedback() {
            match &feedback {
                Feedback::Signal(signal) => info!(%signal, "Signal"),
                Feedback::ResponseCode(code) => debug!(%code, "Response sent"),
                other => debug!(feedback = ?other, "Feedback"),
            }

            if feedback == Feedback::Signal(Signal::DlinkPause) {
                self.paused = true;
            }
            if let Some(simulator) = &self.simulator {
                simulator.on_feedback(&feedback);
            }
        }
    }
}

/// Split the next complete V2GTP message off the front of `buffer`
///
/// Returns `None` until the whole payload has arrived.
pub fn next_frame(
    buffer: &mut BytesMut,
    max_payload: u32,
) -> anyhow::Result<Option<(PayloadType, Bytes)>> {
    if buffer.len() < HEADER_LENGTH {
        return Ok(None);
    }

    let (len, payload_type) = read_header(&buffer[..], &PayloadType::SESSION)?;
    if len > max_payload {
        bail!("Payload of {len} bytes exceeds the limit of {max_payload}");
    }

    let total = HEADER_LENGTH + len as usize;
    if buffer.len() < total {
        buffer.reserve(total - buffer.len());
        return Ok(None);
    }

    let mut frame = buffer.split_to(total);
    let payload = frame.split_off(HEADER_LENGTH).freeze();
    Ok(Some((payload_type, payload)))
}
