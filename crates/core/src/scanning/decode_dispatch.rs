use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::decoding::domain::qr_decoder::{DecodeError, DecodedPayload, QrDecoder};
use crate::shared::frame::Frame;

pub type DecodeOutcome = Result<Option<DecodedPayload>, DecodeError>;

/// Runs decodes for a scheduler with at most one decode outstanding.
pub trait DecodeDispatch: Send {
    /// True when no decode is in flight and a frame may be submitted.
    fn is_idle(&self) -> bool;

    /// Starts decoding `frame`. Callers submit only while idle.
    fn submit(&mut self, frame: Frame);

    /// Takes the outcome of the submitted decode once it has finished.
    fn poll(&mut self) -> Option<DecodeOutcome>;

    /// Forgets the in-flight decode. Its outcome is never returned by
    /// `poll`.
    fn cancel(&mut self);

    fn decoder_name(&self) -> &str;

    /// Outcomes dropped because they belonged to a cancelled decode.
    fn discarded(&self) -> u64 {
        0
    }
}

/// Decodes synchronously inside `submit`.
pub struct InlineDispatch {
    decoder: Box<dyn QrDecoder>,
    ready: Option<DecodeOutcome>,
}

impl InlineDispatch {
    pub fn new(decoder: Box<dyn QrDecoder>) -> Self {
        Self {
            decoder,
            ready: None,
        }
    }
}

impl DecodeDispatch for InlineDispatch {
    fn is_idle(&self) -> bool {
        true
    }

    fn submit(&mut self, frame: Frame) {
        self.ready = Some(self.decoder.detect(&frame));
    }

    fn poll(&mut self) -> Option<DecodeOutcome> {
        self.ready.take()
    }

    fn cancel(&mut self) {
        self.ready = None;
    }

    fn decoder_name(&self) -> &str {
        self.decoder.name()
    }
}

struct DecodeJob {
    generation: u64,
    frame: Frame,
}

struct DecodeDone {
    generation: u64,
    outcome: DecodeOutcome,
}

/// Decodes on a dedicated thread so render ticks never wait on the decoder.
///
/// Both queues hold a single item. `cancel` bumps the generation, so
/// whatever the worker is busy with is discarded when it lands; the slot
/// stays occupied until then, which keeps the one-outstanding rule even
/// across a cancel.
pub struct WorkerDispatch {
    name: String,
    job_tx: Option<Sender<DecodeJob>>,
    done_rx: Receiver<DecodeDone>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
    in_flight: bool,
    discarded: u64,
}

impl WorkerDispatch {
    pub fn spawn(decoder: Box<dyn QrDecoder>) -> std::io::Result<Self> {
        let name = decoder.name().to_string();
        let (job_tx, job_rx) = crossbeam_channel::bounded::<DecodeJob>(1);
        let (done_tx, done_rx) = crossbeam_channel::bounded::<DecodeDone>(1);

        let handle = std::thread::Builder::new()
            .name(format!("qr-decode-{name}"))
            .spawn(move || run_worker(decoder, job_rx, done_tx))?;

        Ok(Self {
            name,
            job_tx: Some(job_tx),
            done_rx,
            handle: Some(handle),
            generation: 0,
            in_flight: false,
            discarded: 0,
        })
    }
}

fn run_worker(
    mut decoder: Box<dyn QrDecoder>,
    job_rx: Receiver<DecodeJob>,
    done_tx: Sender<DecodeDone>,
) {
    for job in job_rx {
        let outcome = decoder.detect(&job.frame);
        let done = DecodeDone {
            generation: job.generation,
            outcome,
        };
        if done_tx.send(done).is_err() {
            break;
        }
    }
}

impl DecodeDispatch for WorkerDispatch {
    fn is_idle(&self) -> bool {
        !self.in_flight
    }

    fn submit(&mut self, frame: Frame) {
        if self.in_flight {
            return;
        }
        let job = DecodeJob {
            generation: self.generation,
            frame,
        };
        // A send failure means the worker is gone; poll reports it.
        if let Some(tx) = &self.job_tx {
            let _ = tx.send(job);
        }
        self.in_flight = true;
    }

    fn poll(&mut self) -> Option<DecodeOutcome> {
        if !self.in_flight {
            return None;
        }
        match self.done_rx.try_recv() {
            Ok(done) => {
                self.in_flight = false;
                if done.generation == self.generation {
                    Some(done.outcome)
                } else {
                    self.discarded += 1;
                    log::debug!(
                        "Discarding decode result from cancelled generation {}",
                        done.generation
                    );
                    None
                }
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = false;
                Some(Err(DecodeError::WorkerStopped))
            }
        }
    }

    fn cancel(&mut self) {
        self.generation += 1;
    }

    fn decoder_name(&self) -> &str {
        &self.name
    }

    fn discarded(&self) -> u64 {
        self.discarded
    }
}

impl Drop for WorkerDispatch {
    fn drop(&mut self) {
        self.job_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Decode worker for {} panicked", self.name);
            }
        }
    }
}
