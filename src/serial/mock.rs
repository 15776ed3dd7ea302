// Scripted transport double.
//
// A script is an ordered list of exchanges: bytes the engine is expected
// to write, and the bytes the "radio" answers with. Responses become
// readable only once the matching request has fully arrived, which
// mirrors a real radio staying silent until it is spoken to.

use super::comm::{Result, Transport, TransportError};
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Exchange {
    expect: Vec<u8>,
    respond: Vec<u8>,
}

#[derive(Default)]
pub struct ScriptedPort {
    exchanges: VecDeque<Exchange>,
    pending: Vec<u8>,
    read_buf: VecDeque<u8>,
    written: Vec<u8>,
    mismatches: Vec<String>,
    signals: Vec<(bool, bool)>,
    min_write_gap: Option<Duration>,
    last_write: Option<tokio::time::Instant>,
    gap_violations: usize,
    closed: bool,
}

impl ScriptedPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an exchange: once `expect` has been written, `respond`
    /// becomes available to read.
    pub fn expect(mut self, expect: &[u8], respond: &[u8]) -> Self {
        self.exchanges.push_back(Exchange {
            expect: expect.to_vec(),
            respond: respond.to_vec(),
        });
        self
    }

    /// Make bytes readable immediately (stale data a drain should eat).
    pub fn push_response(&mut self, bytes: &[u8]) {
        self.read_buf.extend(bytes.iter().copied());
    }

    /// Fail writes that arrive closer together than `gap`. Used to pin
    /// down inter-byte pacing requirements.
    pub fn enforce_write_gap(mut self, gap: Duration) -> Self {
        self.min_write_gap = Some(gap);
        self
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn signals(&self) -> &[(bool, bool)] {
        &self.signals
    }

    pub fn gap_violations(&self) -> usize {
        self.gap_violations
    }

    /// Panic if the script was not consumed exactly.
    pub fn assert_complete(&self) {
        assert!(
            self.mismatches.is_empty(),
            "unexpected writes: {:?}",
            self.mismatches
        );
        assert!(
            self.exchanges.is_empty(),
            "script not finished: {} exchanges left, next expects {:02X?}",
            self.exchanges.len(),
            self.exchanges.front().map(|e| e.expect.clone())
        );
        assert_eq!(self.gap_violations, 0, "write pacing violated");
    }

    fn match_pending(&mut self) {
        while let Some(front) = self.exchanges.front() {
            if self.pending == front.expect {
                let ex = self.exchanges.pop_front().unwrap();
                self.read_buf.extend(ex.respond.iter().copied());
                self.pending.clear();
            } else if front.expect.starts_with(&self.pending) {
                break;
            } else {
                self.mismatches.push(format!(
                    "wrote {:02X?}, script expects {:02X?}",
                    self.pending, front.expect
                ));
                self.pending.clear();
                break;
            }
        }
    }

    fn take(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.read_buf.len());
        self.read_buf.drain(..n).collect()
    }
}

impl Transport for ScriptedPort {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::NotOpen);
        }
        if let Some(gap) = self.min_write_gap {
            let now = tokio::time::Instant::now();
            if let Some(last) = self.last_write {
                if now.duration_since(last) < gap {
                    self.gap_violations += 1;
                }
            }
            self.last_write = Some(now);
        }
        self.written.extend_from_slice(bytes);
        self.pending.extend_from_slice(bytes);
        self.match_pending();
        Ok(())
    }

    async fn read_exact(&mut self, n: usize, deadline: Duration) -> Result<Vec<u8>> {
        self.last_write = None;
        if self.read_buf.len() >= n {
            return Ok(self.take(n));
        }
        // Nothing more is coming until the next write; model the caller
        // waiting out its deadline, then discard the partial prefix.
        tokio::time::sleep(deadline).await;
        self.take(n);
        Err(TransportError::Timeout(deadline))
    }

    async fn read_available(&mut self, max: usize, deadline: Duration) -> Result<Vec<u8>> {
        self.last_write = None;
        if self.read_buf.is_empty() {
            tokio::time::sleep(deadline).await;
        }
        Ok(self.take(max))
    }

    async fn read_until(
        &mut self,
        suffix: &[u8],
        max: usize,
        deadline: Duration,
    ) -> Result<Vec<u8>> {
        self.last_write = None;
        let buf: Vec<u8> = self.read_buf.iter().copied().collect();
        let mut end = None;
        for i in suffix.len()..=buf.len().min(max) {
            if buf[..i].ends_with(suffix) {
                end = Some(i);
                break;
            }
        }
        match end {
            Some(i) => Ok(self.take(i)),
            None => {
                tokio::time::sleep(deadline).await;
                Err(TransportError::Timeout(deadline))
            }
        }
    }

    fn set_signals(&mut self, dtr: bool, rts: bool) -> Result<()> {
        self.signals.push((dtr, rts));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn exchange_gating() {
        let mut port = ScriptedPort::new()
            .expect(b"\x02", b"OK")
            .expect(b"GO", b"\x06");

        // Response is not readable before the request is written.
        let got = port.read_available(8, Duration::from_millis(10)).await.unwrap();
        assert!(got.is_empty());

        port.write(b"\x02").await.unwrap();
        assert_eq!(port.read_exact(2, Duration::from_secs(1)).await.unwrap(), b"OK");

        // Multi-byte request may arrive in pieces.
        port.write(b"G").await.unwrap();
        port.write(b"O").await.unwrap();
        assert_eq!(port.read_exact(1, Duration::from_secs(1)).await.unwrap(), vec![0x06]);

        port.assert_complete();
    }

    #[tokio::test(start_paused = true)]
    async fn read_exact_times_out_and_discards() {
        let mut port = ScriptedPort::new();
        port.push_response(b"AB");
        let err = port.read_exact(4, Duration::from_millis(50)).await;
        assert!(matches!(err, Err(TransportError::Timeout(_))));
        // The partial prefix is gone.
        let got = port.read_available(4, Duration::from_millis(10)).await.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn read_until_finds_sentinel() {
        let mut port = ScriptedPort::new();
        port.push_response(&[0xAA, 0xBB, 0xDD, 0x11]);
        let got = port
            .read_until(&[0xDD], 16, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(got, vec![0xAA, 0xBB, 0xDD]);
        // The byte after the sentinel is still there.
        let rest = port.read_available(4, Duration::from_millis(10)).await.unwrap();
        assert_eq!(rest, vec![0x11]);
    }

    #[tokio::test(start_paused = true)]
    async fn write_gap_enforcement() {
        let mut port = ScriptedPort::new().enforce_write_gap(Duration::from_millis(10));
        port.write(&[0x01]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        port.write(&[0x02]).await.unwrap();
        assert_eq!(port.gap_violations(), 0);

        port.write(&[0x03]).await.unwrap(); // no gap
        assert_eq!(port.gap_violations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_write_is_recorded() {
        let mut port = ScriptedPort::new().expect(b"\x55", b"\x06");
        port.write(b"\x99").await.unwrap();
        assert!(!port.mismatches.is_empty());
    }
}
