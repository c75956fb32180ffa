//! DSHOT session: the caller-owned context every send goes through
//!
//! A [`Session`] owns the register window, the per-pin "configured" flags and the
//! timing profile. Opening one maps the hardware; there is no hidden global state
//! and no lazy mapping on the first send. Pins are still configured on first use,
//! which [`Session::configure_pin`] makes explicit for callers who want it up front.
//!
//! All mutating operations take `&mut self`, so two threads cannot race on the
//! first use of a pin. Async hosts can wrap a session in [`SharedSession`].

mod shared;

pub use shared::SharedSession;

use std::time::Duration;

use tracing::{debug, info, trace};

use crate::gpio;
use crate::timer::{BusyWait, Calibration, CycleDelay};
use crate::transmit::transmit;
use crate::types::{
    CalibrationPolicy, Command, GpioPin, NUM_PINS, SessionConfig, ThrottlePacket, TimingProfile,
};
use crate::window::RegisterWindow;
use crate::Result;

#[cfg(unix)]
use crate::peripheral::MappedRegisters;

/// Pause between repeated command frames.
pub const COMMAND_REPEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Caller-owned DSHOT context.
///
/// `W` is the register window (hardware or in-memory) and `D` the delay used to
/// shape pulses, [`BusyWait`] unless a session is built for inspection.
pub struct Session<W, D = BusyWait> {
    window: W,
    delay: D,
    profile: TimingProfile,
    config: SessionConfig,
    configured: [bool; NUM_PINS],
    frames_sent: u64,
}

#[cfg(unix)]
impl Session<MappedRegisters> {
    /// Map the GPIO block of the default board with default timing.
    ///
    /// ```rust,no_run
    /// use dshot_gpio::Session;
    ///
    /// let mut session = Session::open()?;
    /// session.send(48, 5)?;
    /// # Ok::<(), dshot_gpio::DshotError>(())
    /// ```
    pub fn open() -> Result<Self> {
        Self::open_with(SessionConfig::default())
    }

    /// Map the GPIO block described by `config`.
    ///
    /// Mapping failures are fatal for the session and are returned as is.
    pub fn open_with(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        info!(board = ?config.board, calibration = ?config.calibration, "Opening DSHOT session");
        let window = MappedRegisters::open(config.board)?;
        Session::with_window(window, config)
    }
}

impl<W: RegisterWindow> Session<W> {
    /// Build a busy-waiting session over an existing window.
    ///
    /// Runs the calibration check unless the policy is [`CalibrationPolicy::Skip`].
    pub fn with_window(window: W, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let profile = match config.calibration {
            CalibrationPolicy::Skip => config.timing,
            policy => Calibration::measure().apply(policy, config.timing, config.tolerance_percent)?,
        };
        Ok(Self::from_parts(window, BusyWait, profile, config))
    }
}

impl<W: RegisterWindow, D: CycleDelay> Session<W, D> {
    /// Build a session with a custom delay.
    ///
    /// Calibration is skipped: it measures the busy-wait loop, which a custom
    /// delay does not use.
    pub fn with_delay(window: W, delay: D, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let profile = config.timing;
        Ok(Self::from_parts(window, delay, profile, config))
    }

    fn from_parts(window: W, delay: D, profile: TimingProfile, config: SessionConfig) -> Self {
        debug!(?profile, "Session ready");
        Self { window, delay, profile, config, configured: [false; NUM_PINS], frames_sent: 0 }
    }

    /// Configure `pin` as a DSHOT output if it is not already.
    ///
    /// Returns `true` when this call did the configuration and `false` when the
    /// pin was already configured, in which case no register is touched.
    pub fn configure_pin(&mut self, pin: u32) -> Result<bool> {
        let pin = GpioPin::new(pin)?;
        self.ensure_configured(pin)
    }

    fn ensure_configured(&mut self, pin: GpioPin) -> Result<bool> {
        if self.configured[pin.index()] {
            return Ok(false);
        }
        gpio::configure_output(&mut self.window, pin)?;
        self.configured[pin.index()] = true;
        debug!(%pin, "Configured pin as DSHOT output");
        Ok(true)
    }

    /// Send a throttle value (telemetry bit clear) on `pin`.
    ///
    /// Pin and throttle are validated before any register access. Values 0-47
    /// are sent as is and will be read by the ESC as special commands.
    pub fn send(&mut self, throttle: u16, pin: u32) -> Result<()> {
        let pin = GpioPin::new(pin)?;
        let packet = ThrottlePacket::new(throttle, false)?;
        self.transmit_packet(packet, pin)
    }

    /// Send a prepared packet on `pin`.
    pub fn send_packet(&mut self, packet: ThrottlePacket, pin: u32) -> Result<()> {
        let pin = GpioPin::new(pin)?;
        self.transmit_packet(packet, pin)
    }

    /// Send a special command on `pin`, repeated as many times as the ESC requires.
    pub fn send_command(&mut self, command: Command, pin: u32) -> Result<()> {
        let pin = GpioPin::new(pin)?;
        let packet = ThrottlePacket::from_command(command);
        let repeats = command.repeat_count();
        debug!(?command, %pin, repeats, "Sending DSHOT command");

        for i in 0..repeats {
            if i > 0 {
                std::thread::sleep(COMMAND_REPEAT_INTERVAL);
            }
            self.transmit_packet(packet, pin)?;
        }
        Ok(())
    }

    fn transmit_packet(&mut self, packet: ThrottlePacket, pin: GpioPin) -> Result<()> {
        self.ensure_configured(pin)?;
        let wire = packet.encode();
        trace!(%pin, throttle = packet.throttle(), frame = wire.raw(), "Transmitting frame");
        transmit(&mut self.window, pin, wire, &self.profile, &mut self.delay)?;
        self.frames_sent += 1;
        Ok(())
    }

    /// Whether `pin` has been configured in this session.
    pub fn is_configured(&self, pin: u32) -> bool {
        GpioPin::new(pin).map(|pin| self.configured[pin.index()]).unwrap_or(false)
    }

    /// Pins configured so far, in ascending order.
    pub fn configured_pins(&self) -> impl Iterator<Item = GpioPin> + '_ {
        GpioPin::all().filter(|pin| self.configured[pin.index()])
    }

    /// Current level of `pin` as read back from the level register.
    pub fn level(&self, pin: u32) -> Result<bool> {
        gpio::level(&self.window, GpioPin::new(pin)?)
    }

    /// Frames transmitted since the session was opened.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Timing profile in effect (after calibration).
    pub fn profile(&self) -> &TimingProfile {
        &self.profile
    }

    /// Configuration the session was built from.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Register window.
    pub fn window(&self) -> &W {
        &self.window
    }

    /// Delay used to shape pulses.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Mutable access to the delay, e.g. to clear a recorder between checks.
    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }
}

impl<W: std::fmt::Debug, D> std::fmt::Debug for Session<W, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let configured: Vec<usize> =
            (0..NUM_PINS).filter(|&i| self.configured[i]).collect();
        f.debug_struct("Session")
            .field("window", &self.window)
            .field("profile", &self.profile)
            .field("configured", &configured)
            .field("frames_sent", &self.frames_sent)
            .finish_non_exhaustive()
    }
}
