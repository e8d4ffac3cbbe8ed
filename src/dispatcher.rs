//! Binds one in-flight command to its [`ResponseParser`].
//!
//! The transport calls [`Dispatcher::deliver`] for every chunk of modem
//! output, from a task or an interrupt, while the issuer awaits
//! [`OperationHandle::wait`]. Only one operation may be outstanding at a time.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::{Context, Poll};

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::{NoopRawMutex, RawMutex};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;
use embassy_time::{Duration, Instant, Timer};
use heapless::Vec;

use crate::command::HelperCommand;
use crate::config::Config;
use crate::error::{Error, ModemError};
use crate::response::{ChunkKind, ParsedPayload, ResponseParser, ResponseStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    Idle,
    AwaitingResponse,
    Completed,
    Failed,
    TimedOut,
}

/// What the transport should do after [`Dispatcher::deliver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delivery {
    /// The operation needs more chunks
    Continue,
    /// Nothing is waiting for chunks any more
    Stop,
}

/// Terminal outcome of one operation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Completion {
    pub status: ResponseStatus,
    /// Absent after a timeout, partial results are never handed out.
    pub payload: Option<ParsedPayload>,
    pub modem_error: Option<ModemError>,
}

impl Completion {
    fn timed_out() -> Self {
        Self {
            status: ResponseStatus::Timeout,
            payload: None,
            modem_error: None,
        }
    }

    pub fn into_result(self) -> Result<ParsedPayload, Error> {
        match (self.status, self.payload) {
            (ResponseStatus::Ok, Some(payload)) => Ok(payload),
            (ResponseStatus::Error, _) => Err(Error::Modem(
                self.modem_error.unwrap_or(ModemError::Error),
            )),
            _ => Err(Error::Timeout),
        }
    }
}

/// Finished operations whose handle has not collected the result yet.
/// `begin_operation` refuses to start once this many are waiting.
pub const MAX_UNCLAIMED_RESULTS: usize = 2;

struct Shared {
    state: SessionState,
    parser: Option<ResponseParser>,
    /// Terminal results keyed by operation id
    completions: Vec<(u32, Completion), MAX_UNCLAIMED_RESULTS>,
    deadline: Instant,
    operation: u32,
    waker: WakerRegistration,
}

impl Shared {
    fn finish(&mut self, completion: Completion) {
        self.state = match completion.status {
            ResponseStatus::Ok => SessionState::Completed,
            ResponseStatus::Timeout => SessionState::TimedOut,
            _ => SessionState::Failed,
        };
        self.parser = None;
        // Room is reserved when the operation begins
        if self.completions.push((self.operation, completion)).is_err() {
            error!("No room for the result of operation {}", self.operation);
        }
        self.waker.wake();
    }

    fn claim(&mut self, operation: u32) -> Option<Completion> {
        let i = self.completions.iter().position(|(id, _)| *id == operation)?;
        Some(self.completions.swap_remove(i).1)
    }

    fn expire(&mut self) {
        if let Some(mut parser) = self.parser.take() {
            parser.expire();
        }
        warn!("Operation {} timed out", self.operation);
        self.finish(Completion::timed_out());
    }

    fn expired(&self, now: Instant) -> bool {
        self.state == SessionState::AwaitingResponse && now >= self.deadline
    }
}

/// Session routing modem output to the parser of the outstanding command.
///
/// `M` is [`NoopRawMutex`] when the transport runs on the same executor as
/// the issuer, and e.g. `CriticalSectionRawMutex` when chunks are delivered
/// from an interrupt or another thread.
pub struct Dispatcher<M: RawMutex = NoopRawMutex> {
    config: Config,
    shared: Mutex<M, RefCell<Shared>>,
}

impl<M: RawMutex> Dispatcher<M> {
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            shared: Mutex::new(RefCell::new(Shared {
                state: SessionState::Idle,
                parser: None,
                completions: Vec::new(),
                deadline: Instant::from_ticks(0),
                operation: 0,
                waker: WakerRegistration::new(),
            })),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock(|s| s.borrow().state)
    }

    /// Start an operation decoded by `parser`. Fails with [`Error::Busy`]
    /// while another operation is awaiting its response, or while
    /// [`MAX_UNCLAIMED_RESULTS`] finished results still wait for their
    /// handles. Other operations are left untouched.
    pub fn begin_operation(
        &self,
        mut parser: ResponseParser,
        timeout: Duration,
    ) -> Result<OperationHandle<'_, M>, Error> {
        parser.reset();
        if self.config.debug {
            parser.set_debug(true);
        }

        self.shared.lock(|s| {
            let s = &mut *s.borrow_mut();
            let now = Instant::now();

            if s.expired(now) {
                s.expire();
            }
            if s.state == SessionState::AwaitingResponse {
                error!(
                    "Operation {} is still awaiting its response, refusing to start another",
                    s.operation
                );
                return Err(Error::Busy);
            }
            if s.completions.is_full() {
                error!(
                    "{} results are still unclaimed, refusing to start another operation",
                    s.completions.len()
                );
                return Err(Error::Busy);
            }

            s.operation = s.operation.wrapping_add(1);
            s.state = SessionState::AwaitingResponse;
            s.parser = Some(parser);
            s.deadline = now.checked_add(timeout).unwrap_or(Instant::MAX);
            debug!("Operation {} started", s.operation);

            Ok(OperationHandle {
                dispatcher: self,
                operation: s.operation,
                deadline: s.deadline,
            })
        })
    }

    /// [`Dispatcher::begin_operation`] with the configured default timeout.
    pub fn begin(&self, parser: ResponseParser) -> Result<OperationHandle<'_, M>, Error> {
        self.begin_operation(parser, self.config.default_timeout)
    }

    /// Encode `cmd` into `buf` and start the operation decoding its reply.
    /// Returns the handle and the number of bytes to send.
    pub fn begin_command<C: HelperCommand>(
        &self,
        cmd: &C,
        buf: &mut [u8],
    ) -> Result<(OperationHandle<'_, M>, usize), Error> {
        if buf.len() < C::MAX_LEN {
            return Err(Error::Encode);
        }

        let handle = self.begin_operation(cmd.parser(&self.config), cmd.timeout())?;
        let len = cmd.write(buf);
        Ok((handle, len))
    }

    /// Route one chunk of modem output to the outstanding operation.
    pub fn deliver(&self, kind: ChunkKind, bytes: &[u8]) -> Delivery {
        self.shared.lock(|s| {
            let s = &mut *s.borrow_mut();

            if s.expired(Instant::now()) {
                s.expire();
            }

            let Some(parser) = s.parser.as_mut() else {
                trace!("No operation in flight, dropping {:?} chunk", kind);
                return Delivery::Stop;
            };

            let status = parser.feed(kind, bytes);
            if !status.is_terminal() {
                return Delivery::Continue;
            }

            let modem_error = parser.modem_error();
            let payload = s.parser.take().map(ResponseParser::into_payload);
            s.finish(Completion {
                status,
                payload,
                modem_error,
            });
            Delivery::Stop
        })
    }

    fn poll_completion(&self, operation: u32, cx: &mut Context<'_>) -> Poll<Completion> {
        self.shared.lock(|s| {
            let s = &mut *s.borrow_mut();

            if let Some(completion) = s.claim(operation) {
                return Poll::Ready(completion);
            }
            if s.operation != operation || s.state != SessionState::AwaitingResponse {
                // Abandoned, nothing will ever complete it
                return Poll::Ready(Completion::timed_out());
            }

            s.waker.register(cx.waker());
            Poll::Pending
        })
    }

    fn expire(&self, operation: u32) -> Completion {
        self.shared.lock(|s| {
            let s = &mut *s.borrow_mut();

            if s.operation == operation && s.state == SessionState::AwaitingResponse {
                s.expire();
            }
            s.claim(operation).unwrap_or_else(Completion::timed_out)
        })
    }

    fn abandon(&self, operation: u32) {
        self.shared.lock(|s| {
            let s = &mut *s.borrow_mut();
            if s.operation == operation && s.state == SessionState::AwaitingResponse {
                debug!("Operation {} abandoned", operation);
                s.state = SessionState::Idle;
                s.parser = None;
            }
            // A result nobody will collect
            s.claim(operation);
        })
    }
}

/// The issuer's side of an operation. Dropping it without waiting abandons
/// the operation.
pub struct OperationHandle<'d, M: RawMutex> {
    dispatcher: &'d Dispatcher<M>,
    operation: u32,
    deadline: Instant,
}

impl<M: RawMutex> OperationHandle<'_, M> {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Wait for the final result or the deadline, whichever comes first.
    pub async fn wait(self) -> Completion {
        let completed = poll_fn(|cx| self.dispatcher.poll_completion(self.operation, cx));

        match select(completed, Timer::at(self.deadline)).await {
            Either::First(completion) => completion,
            Either::Second(()) => self.dispatcher.expire(self.operation),
        }
    }

    /// [`OperationHandle::wait`] mapped onto a `Result`.
    pub async fn result(self) -> Result<ParsedPayload, Error> {
        self.wait().await.into_result()
    }
}

impl<M: RawMutex> Drop for OperationHandle<'_, M> {
    fn drop(&mut self) {
        self.dispatcher.abandon(self.operation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::network_service::GetSignalQuality;
    use crate::response::RssiQual;
    use crate::test_helpers::init_logger;
    use embassy_futures::block_on;
    use embassy_futures::join::join;

    fn dispatcher() -> Dispatcher {
        init_logger();
        Dispatcher::new(Config::default())
    }

    fn rssi(completion: Completion) -> RssiQual {
        *completion.into_result().unwrap().as_rssi_qual().unwrap()
    }

    #[test]
    fn completes_on_final_ok() {
        let dispatcher = dispatcher();
        let handle = dispatcher
            .begin_operation(ResponseParser::rssi_qual(), Duration::from_secs(5))
            .unwrap();
        assert_eq!(dispatcher.state(), SessionState::AwaitingResponse);

        assert_eq!(
            dispatcher.deliver(ChunkKind::Data, b"+CSQ: 19,99\r\n"),
            Delivery::Continue
        );
        assert_eq!(dispatcher.deliver(ChunkKind::Final, b"OK\r\n"), Delivery::Stop);
        assert_eq!(dispatcher.state(), SessionState::Completed);

        let completion = block_on(handle.wait());
        assert_eq!(completion.status, ResponseStatus::Ok);
        assert_eq!(rssi(completion).rssi, -75);
    }

    #[test]
    fn wakes_waiting_issuer() {
        let dispatcher = dispatcher();
        let handle = dispatcher
            .begin_operation(ResponseParser::plain_string(), Duration::from_secs(5))
            .unwrap();

        let transport = async {
            Timer::after_millis(10).await;
            dispatcher.deliver(ChunkKind::Data, b"u-blox");
            Timer::after_millis(10).await;
            dispatcher.deliver(ChunkKind::Final, b"OK")
        };

        let (completion, delivery) = block_on(join(handle.wait(), transport));
        assert_eq!(delivery, Delivery::Stop);
        let payload = completion.into_result().unwrap();
        assert_eq!(payload.as_plain_string().unwrap().as_str(), "u-blox");
    }

    #[test]
    fn modem_error_fails_operation() {
        let dispatcher = dispatcher();
        let handle = dispatcher.begin(ResponseParser::rssi_qual()).unwrap();
        dispatcher.deliver(ChunkKind::Final, b"+CME ERROR: 100");
        assert_eq!(dispatcher.state(), SessionState::Failed);

        let result = block_on(handle.result());
        assert_eq!(result, Err(Error::Modem(ModemError::Cme(100))));
    }

    #[test]
    fn times_out_without_final_result() {
        let dispatcher = dispatcher();
        let handle = dispatcher
            .begin_operation(ResponseParser::plain_string(), Duration::from_millis(50))
            .unwrap();
        dispatcher.deliver(ChunkKind::Data, b"partial");

        let completion = block_on(handle.wait());
        assert_eq!(completion.status, ResponseStatus::Timeout);
        assert_eq!(completion.payload, None);
        assert_eq!(completion.into_result(), Err(Error::Timeout));
        assert_eq!(dispatcher.state(), SessionState::TimedOut);

        // Late chunks go nowhere
        assert_eq!(dispatcher.deliver(ChunkKind::Final, b"OK"), Delivery::Stop);
        assert!(dispatcher.begin(ResponseParser::plain_string()).is_ok());
    }

    #[test]
    fn second_operation_is_refused() {
        let dispatcher = dispatcher();
        let first = dispatcher
            .begin_operation(ResponseParser::rssi_qual(), Duration::from_secs(5))
            .unwrap();
        dispatcher.deliver(ChunkKind::Data, b"+CSQ: 12,3");

        assert!(matches!(
            dispatcher.begin_operation(ResponseParser::plain_string(), Duration::from_secs(5)),
            Err(Error::Busy)
        ));
        assert_eq!(dispatcher.state(), SessionState::AwaitingResponse);

        dispatcher.deliver(ChunkKind::Final, b"OK");
        let r = rssi(block_on(first.wait()));
        assert_eq!(r.rssi, -89);
        assert_eq!(r.qual, 3);
    }

    #[test]
    fn stale_operation_expires_on_next_begin() {
        let dispatcher = dispatcher();
        let stale = dispatcher
            .begin_operation(ResponseParser::plain_string(), Duration::from_millis(1))
            .unwrap();
        block_on(Timer::after_millis(5));

        let fresh = dispatcher.begin(ResponseParser::plain_string()).unwrap();
        assert_eq!(block_on(stale.wait()).status, ResponseStatus::Timeout);

        // The stale handle does not disturb its successor
        assert_eq!(dispatcher.state(), SessionState::AwaitingResponse);
        dispatcher.deliver(ChunkKind::Final, b"OK");
        assert_eq!(block_on(fresh.wait()).status, ResponseStatus::Ok);
    }

    #[test]
    fn finished_result_outlives_next_begin() {
        let dispatcher = dispatcher();
        let first = dispatcher.begin(ResponseParser::plain_string()).unwrap();
        dispatcher.deliver(ChunkKind::Data, b"u-blox");
        dispatcher.deliver(ChunkKind::Final, b"OK");
        assert_eq!(dispatcher.state(), SessionState::Completed);

        let second = dispatcher.begin(ResponseParser::rssi_qual()).unwrap();
        dispatcher.deliver(ChunkKind::Data, b"+CSQ: 19,99");

        let completion = block_on(first.wait());
        assert_eq!(completion.status, ResponseStatus::Ok);
        let payload = completion.into_result().unwrap();
        assert_eq!(payload.as_plain_string().unwrap().as_str(), "u-blox");

        // The newer operation is still in flight
        assert_eq!(dispatcher.state(), SessionState::AwaitingResponse);
        dispatcher.deliver(ChunkKind::Final, b"OK");
        assert_eq!(rssi(block_on(second.wait())).rssi, -75);
    }

    #[test]
    fn unclaimed_results_are_bounded() {
        let dispatcher = dispatcher();
        let mut handles: heapless::Vec<_, MAX_UNCLAIMED_RESULTS> = heapless::Vec::new();
        for _ in 0..MAX_UNCLAIMED_RESULTS {
            let handle = dispatcher.begin(ResponseParser::plain_string()).unwrap();
            dispatcher.deliver(ChunkKind::Final, b"OK");
            assert!(handles.push(handle).is_ok());
        }

        assert!(matches!(
            dispatcher.begin(ResponseParser::plain_string()),
            Err(Error::Busy)
        ));

        // Collecting one result makes room again
        let oldest = handles.swap_remove(0);
        assert_eq!(block_on(oldest.wait()).status, ResponseStatus::Ok);
        assert!(dispatcher.begin(ResponseParser::plain_string()).is_ok());
    }

    #[test]
    fn huge_timeout_saturates_deadline() {
        let dispatcher = dispatcher();
        let handle = dispatcher
            .begin_operation(ResponseParser::plain_string(), Duration::MAX)
            .unwrap();
        assert_eq!(handle.deadline(), Instant::MAX);
        assert_eq!(dispatcher.state(), SessionState::AwaitingResponse);

        dispatcher.deliver(ChunkKind::Final, b"OK");
        assert_eq!(block_on(handle.wait()).status, ResponseStatus::Ok);
    }

    #[test]
    fn dropped_handle_frees_session() {
        let dispatcher = dispatcher();
        let handle = dispatcher.begin(ResponseParser::plain_string()).unwrap();
        drop(handle);
        assert_eq!(dispatcher.state(), SessionState::Idle);
        assert_eq!(dispatcher.deliver(ChunkKind::Data, b"late"), Delivery::Stop);
    }

    #[test]
    fn begin_command_writes_request() {
        let dispatcher = dispatcher();
        let mut buf = [0u8; 32];
        let (handle, len) = dispatcher
            .begin_command(&GetSignalQuality, &mut buf)
            .unwrap();
        assert_eq!(&buf[..len], b"AT+CSQ\r\n");
        assert!(handle.deadline() <= Instant::now() + Duration::from_secs(10));

        dispatcher.deliver(ChunkKind::Data, b"+CSQ: 31,0");
        dispatcher.deliver(ChunkKind::Final, b"OK");
        assert_eq!(rssi(block_on(handle.wait())).rssi, -51);
    }

    #[test]
    fn begin_command_rejects_short_buffer() {
        let dispatcher = dispatcher();
        let mut buf = [0u8; 2];
        assert!(matches!(
            dispatcher.begin_command(&GetSignalQuality, &mut buf),
            Err(Error::Encode)
        ));
        assert_eq!(dispatcher.state(), SessionState::Idle);
    }
}
