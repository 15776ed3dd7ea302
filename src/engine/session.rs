// One clone session: handshake, then a full download or upload.

use super::error::{CloneError, CloneResult, Phase};
use super::progress::{CancelFlag, ProgressSender};
use super::{handshake, transfer};
use crate::core::{MemoryMap, RadioImage};
use crate::descriptors::{ModelDescriptor, ProtocolDescriptor};
use crate::obfuscate;
use crate::serial::Transport;

/// Drives a model's protocol over one transport. The session is strictly
/// serial; between sessions the caller re-opens the port.
pub struct CloneSession<'a, T: Transport> {
    transport: &'a mut T,
    model: &'a ModelDescriptor,
    proto: ProtocolDescriptor,
    progress: Option<ProgressSender>,
    cancel: CancelFlag,
}

impl<'a, T: Transport> CloneSession<'a, T> {
    pub fn new(transport: &'a mut T, model: &'a ModelDescriptor) -> Self {
        Self {
            transport,
            model,
            proto: model.effective_protocol(),
            progress: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Attach a progress channel owned by the caller.
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Attach a cancellation flag owned by the caller.
    pub fn with_cancellation(mut self, flag: CancelFlag) -> Self {
        self.cancel = flag;
        self
    }

    pub fn model(&self) -> &ModelDescriptor {
        self.model
    }

    /// Clone the radio's memory down. The returned image starts with the
    /// identification header when the protocol retains one.
    pub async fn download(&mut self) -> CloneResult<RadioImage> {
        tracing::info!(model = self.model.display, "starting download session");
        let ident =
            handshake::run(self.transport, &self.proto.handshake, &self.proto.timing).await?;

        let mut data = Vec::with_capacity(self.model.memsize);
        let header_len = self.proto.ident_header_len;
        if header_len > 0 {
            let take = ident.len().min(header_len);
            data.extend_from_slice(&ident[..take]);
            data.resize(header_len, 0xFF);
        }

        let body = transfer::download(
            self.transport,
            &self.proto,
            self.progress.as_ref(),
            &self.cancel,
        )
        .await?;
        data.extend_from_slice(&body);

        if let Some(kind) = self.proto.checksum {
            if !obfuscate::verify(kind, &data) {
                return Err(checksum_mismatch(kind, &data));
            }
        }

        tracing::info!(bytes = data.len(), "download complete");
        let mut image =
            RadioImage::new(self.model.vendor, self.model.model, MemoryMap::new(data));
        if !ident.is_empty() {
            image = image.with_ident(ident);
        }
        Ok(image)
    }

    /// Clone an image up into the radio.
    pub async fn upload(&mut self, image: &RadioImage) -> CloneResult<()> {
        let fmt = self.proto.mem_format;
        if !fmt.lossless {
            // Writing through a format that cannot reproduce unknown
            // bytes would corrupt the radio's settings.
            return Err(CloneError::UploadRefused {
                reason: format!("memory format '{}' is not lossless", fmt.id),
            });
        }
        let expected = self.proto.ident_header_len + self.proto.layout.total_bytes();
        if image.mmap.len() < expected {
            return Err(CloneError::UploadRefused {
                reason: format!(
                    "image is {} bytes, model needs {}",
                    image.mmap.len(),
                    expected
                ),
            });
        }

        tracing::info!(model = self.model.display, "starting upload session");
        handshake::run(self.transport, &self.proto.handshake, &self.proto.timing).await?;

        let stamped;
        let bytes: &[u8] = match self.proto.checksum {
            Some(kind) => {
                stamped = obfuscate::append(kind, image.mmap.bytes());
                &stamped
            }
            None => image.mmap.bytes(),
        };

        transfer::upload(
            self.transport,
            &self.proto,
            bytes,
            self.progress.as_ref(),
            &self.cancel,
        )
        .await?;

        tracing::info!("upload complete");
        Ok(())
    }
}

fn checksum_mismatch(kind: obfuscate::ChecksumKind, data: &[u8]) -> CloneError {
    let (address, observed) = match kind {
        obfuscate::ChecksumKind::RangeSum { store, .. } => {
            (Some(store as u32), data.get(store).copied())
        }
        _ => (None, data.last().copied()),
    };
    let body = match kind {
        obfuscate::ChecksumKind::RangeSum { .. } => data,
        _ => &data[..data.len().saturating_sub(1)],
    };
    CloneError::ProtocolError {
        address,
        observed: observed.into_iter().collect(),
        expected: vec![obfuscate::compute(kind, body)],
    }
}
