// Block transfer loops.
//
// Reads and writes walk the descriptor's memory layout in block-size
// strides. Obfuscation is applied per block; progress is derived from
// the layout's byte budget; the cancellation flag is polled between
// blocks only so a frame in flight always completes or times out.

use super::error::{CloneError, CloneResult, Phase};
use super::progress::{CancelFlag, ProgressEvent, ProgressSender};
use crate::descriptors::{MemoryLayout, Obfuscation, ProtocolDescriptor};
use crate::obfuscate;
use crate::serial::{Transport, TransportError};

/// One planned frame: where it lives on the radio and in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStep {
    pub radio_addr: u32,
    pub image_off: usize,
    pub size: usize,
    pub aux: bool,
}

/// Expand a layout into block steps. `header_len` shifts image offsets
/// past a retained identification header.
pub fn plan_blocks(layout: &MemoryLayout, block_size: usize, header_len: usize) -> Vec<BlockStep> {
    let mut steps = Vec::new();
    let mut image_off = header_len;

    let mut push_range = |steps: &mut Vec<BlockStep>, start: u32, len: usize, aux: bool| {
        let mut addr = start;
        let end = start as usize + len;
        while (addr as usize) < end {
            let size = block_size.min(end - addr as usize);
            steps.push(BlockStep {
                radio_addr: addr,
                image_off,
                size,
                aux,
            });
            image_off += size;
            addr += size as u32;
        }
    };

    match layout {
        MemoryLayout::Ranged { main, aux } => {
            push_range(&mut steps, main.0, (main.1 - main.0) as usize, false);
            if let Some((start, end)) = aux {
                push_range(&mut steps, *start, (end - start) as usize, true);
            }
        }
        MemoryLayout::Regions { regions, .. } => {
            for (start, len) in regions.iter() {
                push_range(&mut steps, *start, *len, false);
            }
        }
    }
    steps
}

fn deobfuscate(block: &[u8], obfuscation: Obfuscation) -> Vec<u8> {
    match obfuscation {
        Obfuscation::None => block.to_vec(),
        Obfuscation::Uv17Pro { symbol_index } => obfuscate::uv17_xor(block, symbol_index),
        Obfuscation::Wouxun { init } => obfuscate::wouxun_decrypt(block, init),
    }
}

fn obfuscate_block(block: &[u8], obfuscation: Obfuscation) -> Vec<u8> {
    match obfuscation {
        Obfuscation::None => block.to_vec(),
        Obfuscation::Uv17Pro { symbol_index } => obfuscate::uv17_xor(block, symbol_index),
        Obfuscation::Wouxun { init } => obfuscate::wouxun_encrypt(block, init),
    }
}

fn emit(
    progress: Option<&ProgressSender>,
    phase: Phase,
    bytes_done: usize,
    bytes_total: usize,
    message: &str,
) {
    if let Some(tx) = progress {
        let _ = tx.send(ProgressEvent {
            phase,
            bytes_done,
            bytes_total,
            message: message.to_string(),
        });
    }
}

/// Read the whole layout. Returns the decoded (plaintext) bytes in
/// layout order. Auxiliary-range failures truncate instead of aborting.
pub async fn download<T: Transport>(
    transport: &mut T,
    proto: &ProtocolDescriptor,
    progress: Option<&ProgressSender>,
    cancel: &CancelFlag,
) -> CloneResult<Vec<u8>> {
    let steps = plan_blocks(&proto.layout, proto.read_frame.block_size, 0);
    let total = proto.layout.total_bytes();
    let mut data = Vec::with_capacity(total);

    for step in steps {
        if cancel.is_cancelled() {
            return Err(CloneError::Cancelled {
                phase: Phase::Download,
                bytes_done: data.len(),
            });
        }
        match read_block(transport, proto, step.radio_addr, step.size).await {
            Ok(block) => data.extend_from_slice(&block),
            Err(err) if step.aux => {
                tracing::warn!(addr = step.radio_addr, %err, "auxiliary range unreadable, truncating");
                break;
            }
            Err(err) => return Err(err),
        }
        emit(
            progress,
            Phase::Download,
            data.len(),
            total,
            "Cloning from radio",
        );
    }

    Ok(data)
}

async fn read_block<T: Transport>(
    transport: &mut T,
    proto: &ProtocolDescriptor,
    addr: u32,
    size: usize,
) -> CloneResult<Vec<u8>> {
    let rf = &proto.read_frame;
    let timing = &proto.timing;
    let frame = [rf.cmd, (addr >> 8) as u8, addr as u8, size as u8];
    transport
        .write(&frame)
        .await
        .map_err(|e| CloneError::from_transport(e, Phase::Download, Some(addr)))?;

    if rf.response_header {
        let echo_cmd = rf.response_cmd.unwrap_or(rf.cmd);
        let expected = [echo_cmd, frame[1], frame[2], frame[3]];
        let header = transport
            .read_exact(4, timing.block)
            .await
            .map_err(|e| CloneError::from_transport(e, Phase::Download, Some(addr)))?;
        if header != expected {
            return Err(CloneError::ProtocolError {
                address: Some(addr),
                observed: header,
                expected: expected.to_vec(),
            });
        }
    }

    let data = if rf.strip_prefix > 0 {
        let raw = transport
            .read_exact(rf.strip_prefix + size, timing.block)
            .await
            .map_err(|e| CloneError::from_transport(e, Phase::Download, Some(addr)))?;
        raw[rf.strip_prefix..].to_vec()
    } else {
        transport
            .read_exact(size, timing.block)
            .await
            .map_err(|e| CloneError::from_transport(e, Phase::Download, Some(addr)))?
    };

    if let Some((ack, delay)) = rf.ack_after_block {
        transport
            .write(&[ack])
            .await
            .map_err(|e| CloneError::from_transport(e, Phase::Download, Some(addr)))?;
        tokio::time::sleep(delay).await;
    }

    Ok(deobfuscate(&data, proto.obfuscation))
}

/// Write the whole layout from `image`. Every block must be ACKed.
pub async fn upload<T: Transport>(
    transport: &mut T,
    proto: &ProtocolDescriptor,
    image: &[u8],
    progress: Option<&ProgressSender>,
    cancel: &CancelFlag,
) -> CloneResult<()> {
    let steps = plan_blocks(
        &proto.layout,
        proto.write_frame.block_size,
        proto.ident_header_len,
    );
    let total = proto.layout.total_bytes();
    let mut done = 0usize;

    for step in steps {
        if cancel.is_cancelled() {
            return Err(CloneError::Cancelled {
                phase: Phase::Upload,
                bytes_done: done,
            });
        }
        let chunk = image
            .get(step.image_off..step.image_off + step.size)
            .ok_or_else(|| CloneError::UploadRefused {
                reason: format!(
                    "image too small: block at {:#06X} needs offset {:#06X}",
                    step.radio_addr,
                    step.image_off + step.size
                ),
            })?;
        write_block(transport, proto, step.radio_addr, chunk).await?;
        done += step.size;
        emit(progress, Phase::Upload, done, total, "Cloning to radio");
    }

    Ok(())
}

async fn write_block<T: Transport>(
    transport: &mut T,
    proto: &ProtocolDescriptor,
    addr: u32,
    data: &[u8],
) -> CloneResult<()> {
    let wf = &proto.write_frame;
    let payload = obfuscate_block(data, proto.obfuscation);

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&[wf.cmd, (addr >> 8) as u8, addr as u8, payload.len() as u8]);
    frame.extend_from_slice(&payload);
    transport
        .write(&frame)
        .await
        .map_err(|e| CloneError::from_transport(e, Phase::Upload, Some(addr)))?;

    match transport.read_exact(1, proto.timing.write_ack).await {
        Ok(byte) if byte[0] == wf.ack => {}
        Ok(byte) => {
            return Err(CloneError::WriteFailed {
                address: addr,
                ack: Some(byte[0]),
            })
        }
        Err(TransportError::Timeout(_)) => {
            return Err(CloneError::WriteFailed {
                address: addr,
                ack: None,
            })
        }
        Err(e) => return Err(CloneError::from_transport(e, Phase::Upload, Some(addr))),
    }
    tokio::time::sleep(wf.post_ack_delay).await;

    Ok(())
}
