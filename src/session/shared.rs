//! Session handle for async hosts

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use super::Session;
use crate::timer::{BusyWait, CycleDelay};
use crate::types::Command;
use crate::window::RegisterWindow;
use crate::{DshotError, Result};

/// Cloneable handle that runs sends on tokio's blocking pool.
///
/// A burst spins the CPU for about a hundred microseconds. Doing that on an
/// async worker would stall every other task scheduled there, so each send is
/// moved to a blocking thread via [`tokio::task::spawn_blocking`]. The session
/// sits behind a mutex, which also keeps bursts on different pins from
/// interleaving.
///
/// ```rust,no_run
/// use dshot_gpio::{Session, SharedSession};
///
/// # #[tokio::main]
/// # async fn main() -> dshot_gpio::Result<()> {
/// let motors = SharedSession::new(Session::open()?);
/// motors.send(48, 5).await?;
/// # Ok(())
/// # }
/// ```
pub struct SharedSession<W, D = BusyWait> {
    inner: Arc<Mutex<Session<W, D>>>,
}

impl<W, D> Clone for SharedSession<W, D> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<W, D> SharedSession<W, D>
where
    W: RegisterWindow + Send + 'static,
    D: CycleDelay + Send + 'static,
{
    pub fn new(session: Session<W, D>) -> Self {
        Self { inner: Arc::new(Mutex::new(session)) }
    }

    /// Send a throttle value on `pin` without blocking the async executor.
    pub async fn send(&self, throttle: u16, pin: u32) -> Result<()> {
        self.run_blocking(move |session| session.send(throttle, pin)).await
    }

    /// Send a special command on `pin` without blocking the async executor.
    pub async fn send_command(&self, command: Command, pin: u32) -> Result<()> {
        self.run_blocking(move |session| session.send_command(command, pin)).await
    }

    /// Lock the session for synchronous use.
    pub fn lock(&self) -> Result<MutexGuard<'_, Session<W, D>>> {
        self.inner.lock().map_err(|_| poisoned())
    }

    /// Recover the session once every other handle is gone.
    pub fn try_into_inner(self) -> std::result::Result<Session<W, D>, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(|e| e.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }

    async fn run_blocking<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Session<W, D>) -> Result<()> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);

        tokio::task::spawn_blocking(move || {
            trace!("Running send on blocking thread");
            let mut session = inner.lock().map_err(|_| poisoned())?;
            f(&mut *session)
        })
        .await
        .map_err(|e| DshotError::Task { details: format!("send task did not complete: {e}") })?
    }
}

fn poisoned() -> DshotError {
    DshotError::Task { details: "session mutex poisoned by a panicking send".to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmit::PulseRecorder;
    use crate::types::{SessionConfig, WirePacket};
    use crate::window::MemoryRegisters;

    fn shared() -> SharedSession<MemoryRegisters, PulseRecorder> {
        let session = Session::with_delay(
            MemoryRegisters::gpio_block(),
            PulseRecorder::new(),
            SessionConfig::default(),
        )
        .unwrap();
        SharedSession::new(session)
    }

    #[tokio::test]
    async fn sends_run_to_completion_off_the_executor() {
        let motors = shared();
        motors.send(48, 5).await.unwrap();
        motors.send(2047, 7).await.unwrap();

        let session = motors.lock().unwrap();
        let frames = session.delay().frames(session.profile()).unwrap();
        assert_eq!(frames, vec![WirePacket(0x0606), WirePacket(0xFFEE)]);
    }

    #[tokio::test]
    async fn errors_propagate_from_blocking_thread() {
        let motors = shared();
        let err = motors.send(48, 99).await.unwrap_err();
        assert!(matches!(err, DshotError::InvalidPin { pin: 99, .. }));
    }

    #[tokio::test]
    async fn commands_repeat_on_blocking_thread() {
        let motors = shared();
        motors.send_command(Command::SpinDirectionNormal, 19).await.unwrap();

        let session = motors.lock().unwrap();
        assert_eq!(session.frames_sent(), 6);
        assert!(session.is_configured(19));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_sends_do_not_interleave() {
        let motors = shared();
        let handles: Vec<_> = [5u32, 7, 19, 20]
            .into_iter()
            .map(|pin| {
                let motors = motors.clone();
                tokio::spawn(async move { motors.send(99, pin).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let session = motors.try_into_inner().ok().expect("all handles dropped");
        let frames = session.delay().frames(session.profile()).unwrap();
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.decode().map(|p| p.throttle()) == Some(99)));
        assert_eq!(session.configured_pins().count(), 4);
    }
}
