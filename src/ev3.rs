//! The outward facing driver object.
//!
//! An [Ev3] runs one job at a time. The job is a closure handed an [Api]
//! on its own worker thread; it issues commands through the shared
//! [AsyncChannel] and polls [Api::is_cancelled] between steps.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::channel::{AsyncChannel, Channel};
use crate::errors::{ChannelError, DecodeError, Error, JobError};
use crate::executor::Executor;
use crate::pending::Pending;
use crate::ports::{InputPort, OutputMask, OutputPort};
use crate::protocol::{
    Bytecode, InputDeviceCommand, OpCode, Reply, SoundCommand, LAYER_MASTER, REPLY_HEADER_LEN,
};

/// Name of the thread running the active job.
pub const WORKER_THREAD_NAME: &str = "ev3-worker";

/// Name of the thread decoding replies.
pub const DECODER_THREAD_NAME: &str = "ev3-decoder";

/// Whether a job is currently running on an [Ev3]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
}

/// The job currently owning the brick.
struct ActiveJob {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

/// A connected EV3 brick.
pub struct Ev3 {
    channel: Arc<AsyncChannel>,
    decoder: Arc<Executor>,
    job: Arc<Mutex<Option<ActiveJob>>>,
    next_id: AtomicU64,
}

impl Ev3 {
    /// Starts the spooler and decoder threads around `channel`.
    pub fn new<C: Channel + 'static>(channel: C) -> std::io::Result<Self> {
        Ok(Ev3 {
            channel: Arc::new(AsyncChannel::new(channel)?),
            decoder: Arc::new(Executor::new(DECODER_THREAD_NAME)?),
            job: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        })
    }

    /// Runs `job` on a new worker thread.
    ///
    /// Fails with [JobError::AlreadyRunning] while another job is active,
    /// leaving that job untouched. Errors and panics escaping `job` are
    /// logged and end the job, they never reach the caller.
    pub fn run<F>(&self, job: F) -> Result<(), JobError>
    where
        F: FnOnce(Api) -> anyhow::Result<()> + Send + 'static,
    {
        let mut slot = self.job.lock();
        if slot.is_some() {
            tracing::warn!("refusing to start a job while another one is running");
            return Err(JobError::AlreadyRunning);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));
        let api = Api {
            channel: self.channel.clone(),
            decoder: self.decoder.clone(),
            cancelled: cancelled.clone(),
        };
        let finished = self.job.clone();

        // The worker cannot clear the slot before we fill it, we hold the lock.
        std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                tracing::info!(job = id, "job started");
                match catch_unwind(AssertUnwindSafe(|| job(api))) {
                    Ok(Ok(())) => tracing::info!(job = id, "job finished"),
                    Ok(Err(e)) => {
                        tracing::error!(job = id, error = ?e, "uncaught error, aborting job")
                    }
                    Err(_) => tracing::error!(job = id, "job panicked, aborting job"),
                }

                let mut slot = finished.lock();
                if slot.as_ref().map(|j| j.id) == Some(id) {
                    *slot = None;
                }
            })?;

        *slot = Some(ActiveJob { id, cancelled });
        Ok(())
    }

    /// Asks the active job to stop. Does nothing when idle.
    ///
    /// Cancellation is cooperative, a command already on the wire completes.
    pub fn cancel(&self) {
        if let Some(job) = self.job.lock().as_ref() {
            tracing::debug!(job = job.id, "cancelling job");
            job.cancelled.store(true, Ordering::SeqCst);
        }
    }

    /// True when no job is running or the running job was asked to stop.
    pub fn is_cancelled(&self) -> bool {
        match self.job.lock().as_ref() {
            Some(job) => job.cancelled.load(Ordering::SeqCst),
            None => true,
        }
    }

    pub fn state(&self) -> JobState {
        match *self.job.lock() {
            Some(_) => JobState::Running,
            None => JobState::Idle,
        }
    }
}

/// The operations available to a job.
#[derive(Clone)]
pub struct Api {
    channel: Arc<AsyncChannel>,
    decoder: Arc<Executor>,
    cancelled: Arc<AtomicBool>,
}

impl Api {
    /// True once [Ev3::cancel] was called for this job.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Plays a tone. `freq` is in Hz and `duration` in milliseconds.
    pub fn sound_tone(&self, volume: u8, freq: i16, duration: i16) -> Result<(), ChannelError> {
        let mut bc = Bytecode::new();
        bc.add_op_code(OpCode::Sound)
            .add_op_code(SoundCommand::Tone)
            .add_parameter(volume)
            .add_parameter(freq)
            .add_parameter(duration);
        self.channel.send_no_reply(bc)
    }

    /// Sets the power of a motor and starts it.
    pub fn set_output_speed(&self, port: OutputPort, speed: i8) -> Result<(), ChannelError> {
        self.channel.send_no_reply(output_speed(port.mask(), speed))
    }

    /// Reads `n` values of the sensor on `port`, converted to SI units by the brick.
    pub fn get_si_value(
        &self,
        port: InputPort,
        sensor_type: u8,
        mode: u8,
        n: u8,
    ) -> Pending<Vec<f32>> {
        let bc = ready_value(InputDeviceCommand::ReadySi, port, sensor_type, mode, n);
        let reply = self.channel.send(4 * n as u16, bc);
        self.exec_async(move || Ok(decode_si_values(&reply.wait()?, n as usize)?))
    }

    /// Reads `n` values of the sensor on `port` as percentages.
    pub fn get_percent_value(
        &self,
        port: InputPort,
        sensor_type: u8,
        mode: u8,
        n: u8,
    ) -> Pending<Vec<i8>> {
        let bc = ready_value(InputDeviceCommand::ReadyPct, port, sensor_type, mode, n);
        let reply = self.channel.send(2 * n as u16, bc);
        self.exec_async(move || Ok(decode_percent_values(&reply.wait()?, n as usize)?))
    }

    /// Sends arbitrary bytecode that produces no reply.
    pub fn send_no_reply(&self, bytecode: Bytecode) -> Result<(), ChannelError> {
        self.channel.send_no_reply(bytecode)
    }

    /// Sends arbitrary bytecode reserving `expected_reply_length` bytes of global buffer.
    pub fn send(&self, expected_reply_length: u16, bytecode: Bytecode) -> Pending<Reply> {
        self.channel.send(expected_reply_length, bytecode)
    }

    /// Runs `f` on the decoder thread, typically to turn a [Pending] reply into values.
    pub fn exec_async<T, F>(&self, f: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, Error> + Send + 'static,
    {
        self.decoder.exec_async(f)
    }
}

fn output_speed(mask: OutputMask, speed: i8) -> Bytecode {
    let mut bc = Bytecode::new();
    bc.add_op_code(OpCode::OutputPower)
        .add_parameter(LAYER_MASTER)
        .add_parameter(mask.bits())
        .add_parameter(speed)
        .add_op_code(OpCode::OutputStart)
        .add_parameter(LAYER_MASTER)
        .add_parameter(mask.bits());
    bc
}

fn ready_value(
    ready: InputDeviceCommand,
    port: InputPort,
    sensor_type: u8,
    mode: u8,
    n: u8,
) -> Bytecode {
    let mut bc = Bytecode::new();
    bc.add_op_code(OpCode::InputDevice)
        .add_op_code(ready)
        .add_parameter(LAYER_MASTER)
        .add_parameter(port.to_byte())
        .add_parameter(sensor_type)
        .add_parameter(mode)
        .add_parameter(n)
        .add_global_index(0x00);
    bc
}

/// Decodes `n` little endian floats following the reply header.
pub fn decode_si_values(reply: &Reply, n: usize) -> Result<Vec<f32>, DecodeError> {
    (0..n)
        .map(|i| reply.f32_le(REPLY_HEADER_LEN + 4 * i))
        .collect()
}

/// Decodes `n` signed bytes.
///
/// Unlike [decode_si_values] this starts at offset 0, on top of the reply
/// header. The brick's documentation does not settle which one is right,
/// so both are kept as they behave on the wire today.
pub fn decode_percent_values(reply: &Reply, n: usize) -> Result<Vec<i8>, DecodeError> {
    (0..n).map(|i| reply.i8(i)).collect()
}
