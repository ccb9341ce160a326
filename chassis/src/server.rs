use foxtail_channel::{select, tick, Receiver, Request, Sender};
use foxtail_logger::{debug, info, warn};
use foxtail_scheduler::{Period, PeriodicScheduler};
use foxtail_systemtime::elapsed_usec;
use parking_lot::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;

enum ServerMsg {
    Open(Request<Vec<Period>, bool>),
    Close(Request<(), bool>),
}

/// The chassis server: one dedicated thread owning the periodic scheduler,
/// a mailbox for open/close control, and the tick source.
///
/// There is a one-to-one mapping of chassis to server to thread. The loop
/// blocks only on the ticker and the mailbox; on every tick it drains
/// pending messages and runs one scheduler pass at the current elapsed
/// time.
pub struct ChassisServer {
    sender: Option<Sender<ServerMsg>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ChassisServer {
    /// Spawn the server thread with the given timing-tick resolution.
    pub fn spawn(name: &str, tick_duration: Duration) -> ChassisServer {
        let (sender, receiver) = foxtail_channel::bounded(4);
        let thread = thread::Builder::new()
            .name(format!("ChassisServer-{name}"))
            .spawn(move || Self::run(tick_duration, receiver))
            .expect("spawn chassis server thread");

        ChassisServer {
            sender: Some(sender),
            thread: Mutex::new(Some(thread)),
        }
    }

    fn run(tick_duration: Duration, receiver: Receiver<ServerMsg>) {
        let mut scheduler = PeriodicScheduler::with_logging_slippage();
        let ticker = tick(tick_duration);

        loop {
            select! {
                recv(receiver) -> msg => match msg {
                    Ok(ServerMsg::Open(request)) => {
                        debug!("chassis server: open ({} periods)", request.arguments.len());
                        scheduler.start(request.arguments);
                        let _ = request.responder.send(true);
                    }
                    Ok(ServerMsg::Close(request)) => {
                        debug!("chassis server: close");
                        scheduler.stop();
                        let _ = request.responder.send(true);
                    }
                    Err(_) => {
                        info!("chassis server mailbox closed, exiting");
                        break;
                    }
                },
                recv(ticker) -> _ => {
                    scheduler.execute_scheduler(elapsed_usec());
                }
            }
        }
    }

    /// Deliver the period arrays to the loop and start the scheduler.
    pub fn open(&self, periods: Vec<Period>) -> bool {
        match &self.sender {
            Some(sender) => {
                let (responder, response) = foxtail_channel::bounded(1);
                if sender
                    .send(ServerMsg::Open(Request {
                        responder,
                        arguments: periods,
                    }))
                    .is_err()
                {
                    warn!("chassis server has gone away");
                    return false;
                }
                response.recv().unwrap_or(false)
            }
            None => false,
        }
    }

    /// Stop the scheduler; the thread stays parked on its mailbox.
    pub fn close(&self) -> bool {
        match &self.sender {
            Some(sender) => {
                let (responder, response) = foxtail_channel::bounded(1);
                if sender
                    .send(ServerMsg::Close(Request {
                        responder,
                        arguments: (),
                    }))
                    .is_err()
                {
                    warn!("chassis server has gone away");
                    return false;
                }
                response.recv().unwrap_or(false)
            }
            None => false,
        }
    }
}

impl Drop for ChassisServer {
    fn drop(&mut self) {
        // Closing the mailbox ends the loop.
        self.sender = None;
        if let Some(thread) = self.thread.lock().take() {
            let _ = thread.join();
        }
    }
}
