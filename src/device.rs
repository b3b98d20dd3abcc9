// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::{Error, Fault, Result, Violation},
    generation::Generation,
    image::{PlaneAddress, TransformRequest},
    lock::UnitLock,
    program::RegisterProgram,
    registers::RegisterBlock,
    regs::{VBSRR, VBSRR_RESET, VEVTR, VEVTR_ACK, VSTAR, VSTAR_BUSY},
    validate::validate,
};
use std::{
    hint::spin_loop,
    io,
    time::{Duration, Instant},
};
use tracing::{debug, trace, warn};
use uiomux::{Mapping, MemPool, UioDevice};

/// Delivers the engine's completion interrupt.
pub trait CompletionSource {
    /// Blocks until the engine signals that the running transform is done.
    fn wait_for_completion(&mut self) -> io::Result<()>;

    /// Drops events raised before this handle started its transform, such as
    /// the completion of another handle's transform on the same unit.
    fn discard_stale(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Masks the interrupt when the handle closes.
    fn disable(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CompletionSource for UioDevice {
    fn wait_for_completion(&mut self) -> io::Result<()> {
        let count = self.wait_irq()?;
        trace!("VEU interrupt #{}", count);
        Ok(())
    }

    fn discard_stale(&mut self) -> io::Result<()> {
        if let Some(count) = self.drain_irq()? {
            trace!("discarded stale VEU interrupt #{}", count);
        }
        Ok(())
    }

    fn disable(&mut self) -> io::Result<()> {
        self.disable_irq()
    }
}

/// How a handle learns that a transform has finished.
pub enum Completion {
    /// Block on an interrupt, then confirm through the status register.
    Interrupt(Box<dyn CompletionSource + Send>),
    /// Spin on the status register's busy bit.
    Poll,
}

/// Options for opening a VEU.
#[derive(Clone, Debug)]
pub struct Config {
    /// Prefix of the UIO device name, e.g. `VEU` matches `VEU3F0`
    pub device_name: String,
    /// How long the busy bit may stay set after completion is acknowledged.
    /// The transform itself is not bounded.
    pub busy_timeout: Duration,
    /// Wait on the UIO interrupt rather than polling the status register
    pub use_interrupt: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_name: "VEU".to_owned(),
            busy_timeout: Duration::from_millis(100),
            use_interrupt: true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Started,
    Faulted,
}

/// An open handle on one VEU.
///
/// The handle owns the register mapping and a lock on the physical unit.
/// Other handles on the same unit, in this process or another, hold their
/// own lock on it; at most one of them has a transform in flight at any
/// time.
///
/// # Example
///
/// ```no_run
/// use shveu::{Device, ImageDescriptor, PixelFormat, TransformRequest};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut veu = Device::open()?;
/// let src = ImageDescriptor::new(0x0d00_0000, 0x0d01_2c00, 320, 240, PixelFormat::YCbCr420);
/// let dst = ImageDescriptor::new(0x0d40_0000, 0, 640, 480, PixelFormat::Rgb565);
///
/// veu.transform(&TransformRequest::new(src, dst))?;
/// # Ok(())
/// # }
/// ```
pub struct Device<R: RegisterBlock = Mapping> {
    regs: R,
    generation: Generation,
    lock: Box<dyn UnitLock + Send>,
    completion: Completion,
    busy_timeout: Duration,
    state: State,
}

impl Device<Mapping> {
    /// Opens the first VEU with the default [`Config`].
    pub fn open() -> Result<Self> {
        Self::open_with(&Config::default())
    }

    /// Finds the VEU named by `config`, maps its registers and prepares its
    /// interrupt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceUnavailable`] if:
    /// - No UIO device matches `config.device_name`
    /// - The register block cannot be mapped
    /// - The device node cannot be opened for locking or interrupt delivery
    pub fn open_with(config: &Config) -> Result<Self> {
        let uio = UioDevice::find(&config.device_name).map_err(Error::DeviceUnavailable)?;
        let regs = uio.map(0).map_err(Error::DeviceUnavailable)?;
        let lock = uio.lock().map_err(Error::DeviceUnavailable)?;

        debug!("{} opened at {}", uio.name(), uio.node().display());
        let completion = if config.use_interrupt {
            uio.enable_irq().map_err(Error::DeviceUnavailable)?;
            Completion::Interrupt(Box::new(uio))
        } else {
            Completion::Poll
        };

        Ok(Self::from_parts(regs, lock, completion, config))
    }
}

impl<R: RegisterBlock> Device<R> {
    /// Assembles a handle from its collaborators.
    ///
    /// The generation is detected from the size of `regs`.
    pub fn from_parts(
        regs: R,
        lock: impl UnitLock + Send + 'static,
        completion: Completion,
        config: &Config,
    ) -> Self {
        let generation = Generation::detect(regs.size());
        debug!(
            "{} with {:#x} byte register block",
            generation,
            regs.size()
        );
        Self {
            regs,
            generation,
            lock: Box::new(lock),
            completion,
            busy_timeout: config.busy_timeout,
            state: State::Idle,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether a submitted transform has not been waited for yet.
    pub fn in_flight(&self) -> bool {
        self.state == State::Started
    }

    /// Validates `request`, takes the unit and starts the engine.
    ///
    /// Returns as soon as the start trigger is written. The returned
    /// [`Transfer`] must be waited on, or dropped, before the handle can be
    /// used again; dropping it still blocks until the engine is done.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] if the request breaks a constraint. The
    ///   hardware is left untouched.
    /// - [`Error::DeviceUnavailable`] if the unit lock cannot be taken.
    /// - [`Error::HardwareFault`] if this handle faulted earlier.
    pub fn submit<A: PlaneAddress>(
        &mut self,
        request: &TransformRequest<A>,
    ) -> Result<Transfer<'_, R>> {
        match self.state {
            State::Idle => {}
            State::Started => return Err(Violation::TransferInFlight.into()),
            State::Faulted => return Err(Fault::Poisoned.into()),
        }

        validate(request, self.generation)?;
        let program = RegisterProgram::build(request, self.generation);

        self.lock.acquire().map_err(Error::DeviceUnavailable)?;
        if let Completion::Interrupt(source) = &mut self.completion {
            if let Err(e) = source.discard_stale() {
                warn!("failed to discard stale VEU events: {}", e);
            }
        }
        debug!(
            "VEU start {} -> {} {:?}",
            request.source, request.destination, request.rotation
        );
        for w in &program {
            trace!("{:#05x} <- {:#010x}", w.offset, w.value);
            self.regs.write(w.offset, w.value);
        }
        self.state = State::Started;

        Ok(Transfer { device: self })
    }

    /// Blocks until the transform in flight completes, acknowledges it and
    /// releases the unit. Does nothing when no transform is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HardwareFault`] if the engine is still busy
    /// `busy_timeout` after its completion was acknowledged. The engine is
    /// then reset, the unit released and the handle must be reopened.
    pub fn wait(&mut self) -> Result<()> {
        match self.state {
            State::Idle => return Ok(()),
            State::Faulted => return Err(Fault::Poisoned.into()),
            State::Started => {}
        }

        let interrupted = match &mut self.completion {
            Completion::Interrupt(source) => match source.wait_for_completion() {
                Ok(()) => true,
                Err(e) => {
                    warn!("VEU completion event failed: {}, polling status", e);
                    false
                }
            },
            Completion::Poll => false,
        };
        if !interrupted {
            self.wait_finished();
        }

        self.regs.write(VEVTR, VEVTR_ACK);
        if let Err(fault) = self.wait_idle() {
            return Err(self.fault(fault));
        }

        self.state = State::Idle;
        self.release();
        debug!("VEU done");
        Ok(())
    }

    /// Runs `request` to completion.
    pub fn transform<A: PlaneAddress>(&mut self, request: &TransformRequest<A>) -> Result<()> {
        self.submit(request)?.wait()
    }

    /// Waits out any transform in flight, masks the interrupt and closes the
    /// handle.
    pub fn close(mut self) -> Result<()> {
        self.wait()
    }

    /// Spins until the busy bit clears, however long the transform takes.
    fn wait_finished(&self) {
        while self.regs.read(VSTAR) & VSTAR_BUSY != 0 {
            spin_loop();
        }
    }

    /// Spins until the busy bit clears once completion has been signalled,
    /// giving up after `busy_timeout`.
    fn wait_idle(&self) -> Result<(), Fault> {
        let start = Instant::now();
        loop {
            let status = self.regs.read(VSTAR);
            if status & VSTAR_BUSY == 0 {
                return Ok(());
            }
            let waited = start.elapsed();
            if waited > self.busy_timeout {
                return Err(Fault::StuckBusy { status, waited });
            }
            spin_loop();
        }
    }

    fn fault(&mut self, fault: Fault) -> Error {
        warn!("VEU fault: {}, resetting engine", fault);
        self.regs.write(VBSRR, VBSRR_RESET);
        self.state = State::Faulted;
        self.release();
        fault.into()
    }

    fn release(&mut self) {
        if let Err(e) = self.lock.release() {
            warn!("failed to release VEU lock: {}", e);
        }
    }
}

impl<R: RegisterBlock> Drop for Device<R> {
    fn drop(&mut self) {
        if let Err(e) = self.wait() {
            if self.state != State::Faulted {
                warn!("VEU close failed: {}", e);
            }
        }
        if let Completion::Interrupt(source) = &mut self.completion {
            if let Err(e) = source.disable() {
                warn!("failed to mask VEU interrupt: {}", e);
            }
        }
        debug!("VEU closed");
    }
}

/// A transform in flight, returned by [`Device::submit`].
///
/// Holds the handle mutably, so nothing else can be submitted through it
/// until the transfer is finished.
#[must_use = "dropping a Transfer blocks until the engine finishes"]
pub struct Transfer<'a, R: RegisterBlock = Mapping> {
    device: &'a mut Device<R>,
}

impl<R: RegisterBlock> Transfer<'_, R> {
    /// Blocks until the engine finishes; see [`Device::wait`].
    pub fn wait(self) -> Result<()> {
        self.device.wait()
    }
}

impl<R: RegisterBlock> Drop for Transfer<'_, R> {
    fn drop(&mut self) {
        if self.device.in_flight() {
            if let Err(e) = self.device.wait() {
                warn!("abandoned VEU transfer failed: {}", e);
            }
        }
    }
}

/// Opens the reserved memory of the VEU named by `config` as a buffer pool.
pub fn memory_pool(config: &Config) -> Result<MemPool> {
    let uio = UioDevice::find(&config.device_name).map_err(Error::DeviceUnavailable)?;
    let mem = uio.map(1).map_err(Error::DeviceUnavailable)?;
    MemPool::new(mem).map_err(Error::DeviceUnavailable)
}
