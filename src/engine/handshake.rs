// Handshake state machines.
//
// Three wake-up rituals cover the supported protocol families. Each is
// an explicit state machine whose transitions are parameterized by the
// descriptor; terminal states are the identification bytes or a typed
// failure. Retries exist only where the wire protocol has them: the
// magic-variant candidate list and the program-variant ACK loop.

use super::error::{CloneError, CloneResult, Phase};
use crate::descriptors::{Handshake, MagicHandshake, ProgramHandshake, Timing, Uv17Handshake};
use crate::serial::{Transport, TransportError};

/// First-response polls for the UV17Pro variant.
const UV17_POLLS: u32 = 10;

/// Run the descriptor's handshake. Returns the identification bytes the
/// radio produced (possibly empty for protocols without an ident step).
pub async fn run<T: Transport>(
    transport: &mut T,
    handshake: &Handshake,
    timing: &Timing,
) -> CloneResult<Vec<u8>> {
    match handshake {
        Handshake::Magic(m) => run_magic(transport, m, timing).await,
        Handshake::Program(p) => run_program(transport, p, timing).await,
        Handshake::Uv17(u) => run_uv17(transport, u, timing).await,
    }
}

/// Discard stale bytes between steps. An empty drain is the normal case.
async fn drain<T: Transport>(transport: &mut T, timing: &Timing) -> CloneResult<()> {
    let stale = transport
        .read_available(64, timing.drain)
        .await
        .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
    if !stale.is_empty() {
        tracing::debug!(stale = ?stale, "drained stale bytes");
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MagicState {
    SendMagic,
    AwaitAck,
    SendIdent,
    ReadIdent,
    PostAck,
    Done,
}

async fn run_magic<T: Transport>(
    transport: &mut T,
    hs: &MagicHandshake,
    timing: &Timing,
) -> CloneResult<Vec<u8>> {
    let mut last_response = None;

    'candidates: for (attempt, magic) in hs.magics.iter().enumerate() {
        tracing::debug!(attempt, magic = ?magic, "trying magic sequence");
        drain(transport, timing).await?;

        let mut state = MagicState::SendMagic;
        let mut ident: Vec<u8> = Vec::with_capacity(hs.ident_max);

        loop {
            match state {
                MagicState::SendMagic => {
                    for &byte in magic.iter() {
                        transport
                            .write(&[byte])
                            .await
                            .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
                        tokio::time::sleep(hs.inter_byte_delay).await;
                    }
                    state = MagicState::AwaitAck;
                }
                MagicState::AwaitAck => {
                    match transport.read_exact(1, timing.handshake_ack).await {
                        Ok(byte) if byte[0] == hs.ack => state = MagicState::SendIdent,
                        Ok(byte) => {
                            tracing::debug!(got = byte[0], want = hs.ack, "wrong wake-up ACK");
                            last_response = Some(byte[0]);
                            continue 'candidates;
                        }
                        Err(TransportError::Timeout(_)) => continue 'candidates,
                        Err(e) => {
                            return Err(CloneError::from_transport(e, Phase::Handshake, None))
                        }
                    }
                }
                MagicState::SendIdent => {
                    transport
                        .write(&[hs.ident_cmd])
                        .await
                        .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
                    state = MagicState::ReadIdent;
                }
                MagicState::ReadIdent => {
                    while ident.len() < hs.ident_max {
                        match transport.read_exact(1, timing.ident_byte).await {
                            Ok(byte) => {
                                ident.push(byte[0]);
                                // The sentinel terminates the response, but
                                // only once the minimum length is in; short
                                // idents reuse the byte value mid-stream.
                                if ident.len() >= hs.ident_min
                                    && hs.ident_sentinel == Some(byte[0])
                                {
                                    break;
                                }
                            }
                            Err(TransportError::Timeout(_)) => break,
                            Err(e) => {
                                return Err(CloneError::from_transport(e, Phase::Handshake, None))
                            }
                        }
                    }
                    if ident.len() < hs.ident_min {
                        tracing::debug!(len = ident.len(), "identification too short");
                        continue 'candidates;
                    }
                    state = MagicState::PostAck;
                }
                MagicState::PostAck => {
                    if hs.ack_after_ident {
                        transport
                            .write(&[hs.ack])
                            .await
                            .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
                        // Trailing byte is read and discarded, whatever it is.
                        let _ = transport
                            .read_available(1, timing.handshake_ack)
                            .await
                            .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
                    }
                    state = MagicState::Done;
                }
                MagicState::Done => {
                    tracing::info!(ident = ?ident, "handshake complete");
                    return Ok(ident);
                }
            }
        }
    }

    Err(CloneError::HandshakeFailed {
        reason: "all magic sequences exhausted".to_string(),
        last_response,
    })
}

async fn run_program<T: Transport>(
    transport: &mut T,
    hs: &ProgramHandshake,
    timing: &Timing,
) -> CloneResult<Vec<u8>> {
    if let Some((cmd, delay)) = hs.pre_command {
        transport
            .write(cmd)
            .await
            .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
        tokio::time::sleep(delay).await;
    }

    let mut last_response = None;
    let mut acked = false;
    for attempt in 0..hs.retries {
        drain(transport, timing).await?;
        transport
            .write(hs.program)
            .await
            .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
        match transport.read_exact(1, hs.ack_window).await {
            Ok(byte) if byte[0] == hs.ack => {
                acked = true;
                break;
            }
            Ok(byte) => {
                tracing::debug!(attempt, got = byte[0], "program phrase rejected");
                last_response = Some(byte[0]);
            }
            Err(TransportError::Timeout(_)) => {
                tracing::debug!(attempt, "no answer to program phrase");
            }
            Err(e) => return Err(CloneError::from_transport(e, Phase::Handshake, None)),
        }
    }
    if !acked {
        return Err(CloneError::HandshakeFailed {
            reason: "program phrase never acknowledged".to_string(),
            last_response,
        });
    }

    let mut ident = Vec::new();
    if let Some(cmd) = hs.ident_cmd {
        transport
            .write(&[cmd])
            .await
            .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
        ident = transport
            .read_exact(hs.ident_len, timing.handshake_ack)
            .await
            .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
        if let Some(prefix) = hs.ident_prefix {
            if !ident.starts_with(prefix) {
                // Off-brand firmware revisions change the banner; warn
                // and keep going.
                tracing::warn!(ident = ?ident, expected = ?prefix, "identification prefix mismatch");
            }
        }
        if hs.ack_after_ident {
            transport
                .write(&[hs.ack])
                .await
                .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
            let _ = transport
                .read_available(1, timing.drain)
                .await
                .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
        }
    }

    tracing::info!(ident = ?ident, "handshake complete");
    Ok(ident)
}

async fn run_uv17<T: Transport>(
    transport: &mut T,
    hs: &Uv17Handshake,
    timing: &Timing,
) -> CloneResult<Vec<u8>> {
    let mut last_response = None;

    'candidates: for (attempt, ident_cmd) in hs.idents.iter().enumerate() {
        tracing::debug!(attempt, "sending identification literal");
        drain(transport, timing).await?;
        transport
            .write(ident_cmd)
            .await
            .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
        tokio::time::sleep(hs.settle).await;

        let mut first = None;
        for _ in 0..UV17_POLLS {
            let got = transport
                .read_available(1, timing.ident_byte)
                .await
                .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
            if let Some(&byte) = got.first() {
                first = Some(byte);
                break;
            }
        }
        let Some(first) = first else {
            continue 'candidates;
        };

        let mut response = vec![first];
        if hs.fingerprint.len() > 1 {
            match transport
                .read_exact(hs.fingerprint.len() - 1, timing.handshake_ack)
                .await
            {
                Ok(rest) => response.extend(rest),
                Err(TransportError::Timeout(_)) => {
                    last_response = Some(first);
                    continue 'candidates;
                }
                Err(e) => return Err(CloneError::from_transport(e, Phase::Handshake, None)),
            }
        }
        if !response.starts_with(hs.fingerprint) {
            tracing::debug!(got = ?response, "fingerprint mismatch");
            last_response = response.first().copied();
            continue 'candidates;
        }

        for (cmd, reply_len) in hs.followups {
            transport
                .write(cmd)
                .await
                .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
            let reply = transport
                .read_exact(*reply_len, timing.block)
                .await
                .map_err(|e| CloneError::from_transport(e, Phase::Handshake, None))?;
            tracing::debug!(cmd = ?cmd.first(), reply = ?reply, "follow-up answered");
            tokio::time::sleep(hs.followup_delay).await;
        }

        tracing::info!("handshake complete");
        return Ok(response);
    }

    Err(CloneError::HandshakeFailed {
        reason: "no identification literal accepted".to_string(),
        last_response,
    })
}
