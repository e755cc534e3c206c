//! Collector (§6): a UDP server that decodes one datagram at a time and
//! hands each to the session, never letting a single bad datagram stop it.

use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::TransportError;
use crate::session::Session;

/// Maximum UDP datagram size accepted, matching the reference server's
/// 128 KiB receive buffer.
pub const MAX_DATAGRAM_SIZE: usize = 128 * 1024;

pub struct CollectorConfig {
    pub listen_ip: IpAddr,
    pub listen_port: u16,
}

pub struct Collector {
    session: Arc<Session>,
    config: CollectorConfig,
    stopping: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    bound_addr: Option<SocketAddr>,
}

impl Collector {
    pub fn new(session: Arc<Session>, config: CollectorConfig) -> Self {
        Collector {
            session,
            config,
            stopping: Arc::new(AtomicBool::new(false)),
            worker: None,
            bound_addr: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.bound_addr
    }

    /// The session backing this collector's ingest domains, e.g. for a
    /// template catalog to inject into (§4.13).
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Binds the listening socket and spawns the receive-loop thread.
    /// Returns immediately; the loop runs until `stop` is called.
    pub fn start(&mut self) -> Result<(), TransportError> {
        if self.is_running() {
            return Ok(());
        }
        let socket = UdpSocket::bind(SocketAddr::new(self.config.listen_ip, self.config.listen_port))
            .map_err(TransportError::Io)?;
        // A read timeout lets the worker thread notice `stopping` without
        // blocking forever on `recv_from`.
        socket
            .set_read_timeout(Some(std::time::Duration::from_millis(250)))
            .map_err(TransportError::Io)?;
        self.bound_addr = Some(socket.local_addr().map_err(TransportError::Io)?);
        log::info!("collector listening on udp:{}", self.bound_addr.unwrap());

        self.stopping.store(false, Ordering::SeqCst);
        let session = self.session.clone();
        let stopping = self.stopping.clone();
        self.worker = Some(
            thread::Builder::new()
                .name("ipfix-collector".to_string())
                .spawn(move || serve(socket, session, stopping))
                .expect("failed to spawn collector thread"),
        );
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.stopping.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.bound_addr = None;
    }
}

fn serve(socket: UdpSocket, session: Arc<Session>, stopping: Arc<AtomicBool>) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    while !stopping.load(Ordering::SeqCst) {
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
                continue;
            }
            Err(e) => {
                log::error!("collector socket error: {}", e);
                continue;
            }
        };
        if let Err(e) = session.read_message(&buf[..len], peer) {
            log::warn!("discarding malformed message from {}: {}", peer, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    #[test]
    fn start_stop_round_trip_binds_an_ephemeral_port() {
        let session = Arc::new(Session::new(|_domain, _message, _peer| {}));
        let mut collector = Collector::new(
            session,
            CollectorConfig {
                listen_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
                listen_port: 0,
            },
        );
        collector.start().unwrap();
        assert!(collector.is_running());
        assert!(collector.local_addr().unwrap().port() > 0);
        collector.stop();
        assert!(!collector.is_running());
    }

    #[test]
    fn received_datagram_reaches_the_session_callback() {
        use crate::field_specifier::FieldSpecifier;
        use crate::message::Message;
        use crate::set::Set;
        use crate::template::TemplateRecord;

        let received = Arc::new(Mutex::new(false));
        let received_clone = received.clone();
        let session = Arc::new(Session::new(move |_domain, _message, _peer| {
            *received_clone.lock().unwrap() = true;
        }));

        let mut collector = Collector::new(
            session.clone(),
            CollectorConfig {
                listen_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
                listen_port: 0,
            },
        );
        collector.start().unwrap();
        let addr = collector.local_addr().unwrap();

        let template = TemplateRecord::new(256, vec![FieldSpecifier::new(0, 1, 8)]).unwrap();
        let mut message = Message::new(1, vec![Set::template_set(vec![template])]);
        let domain = session.domain(1);
        let bytes = message.encode(&domain, 0).unwrap();

        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        client.send_to(&bytes, addr).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(400));
        collector.stop();
        assert!(*received.lock().unwrap());
    }
}
