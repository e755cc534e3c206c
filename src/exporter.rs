//! Exporter (§6): a UDP client bound to a server address, sending data
//! messages and periodically refreshing egress templates on a timer thread.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{IpfixError, TransportError};
use crate::message::Message;
use crate::session::Session;
use crate::set::Set;

/// Minimum and maximum template refresh interval, in seconds (§6).
pub const MIN_TEMPLATE_REFRESH_SECONDS: u64 = 1;
pub const MAX_TEMPLATE_REFRESH_SECONDS: u64 = 86400;

pub struct ExporterConfig {
    pub local_ip: IpAddr,
    pub server_ip: IpAddr,
    pub server_port: u16,
    pub template_refresh_interval: Duration,
}

/// A running exporter: owns the socket and the refresh timer thread.
pub struct Exporter {
    session: Arc<Session>,
    config: ExporterConfig,
    socket: Option<UdpSocket>,
    refresh_thread: Option<JoinHandle<()>>,
    stopping: Arc<AtomicBool>,
}

impl Exporter {
    pub fn new(session: Arc<Session>, config: ExporterConfig) -> Self {
        Exporter {
            session,
            config,
            socket: None,
            refresh_thread: None,
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.socket.is_some()
    }

    /// The session backing this exporter's egress domains, e.g. for a
    /// template catalog to inject into (§4.13).
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Opens the UDP socket, sends one template refresh immediately, and
    /// spawns a daemon-style thread that repeats the refresh on the
    /// configured interval.
    pub fn start(&mut self) -> Result<(), IpfixError> {
        if self.is_running() {
            return Ok(());
        }
        let bind_ip = if self.config.local_ip != IpAddr::V4(Ipv4Addr::UNSPECIFIED) && !is_loopback(self.config.local_ip)
        {
            self.config.local_ip
        } else {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        };
        let socket = UdpSocket::bind(SocketAddr::new(bind_ip, 0)).map_err(TransportError::Io)?;
        socket
            .connect(SocketAddr::new(self.config.server_ip, self.config.server_port))
            .map_err(TransportError::Io)?;
        log::info!(
            "exporter sending to udp:{}:{}",
            self.config.server_ip,
            self.config.server_port
        );

        self.refresh_all_templates(&socket)?;

        self.stopping.store(false, Ordering::SeqCst);
        let refresh_socket = socket.try_clone().map_err(TransportError::Io)?;
        let session = self.session.clone();
        let stopping = self.stopping.clone();
        let interval = self.config.template_refresh_interval;
        self.refresh_thread = Some(
            thread::Builder::new()
                .name("ipfix-template-refresh".to_string())
                .spawn(move || {
                    const POLL_INTERVAL: Duration = Duration::from_millis(200);
                    let mut elapsed = Duration::ZERO;
                    loop {
                        if stopping.load(Ordering::SeqCst) {
                            break;
                        }
                        thread::sleep(POLL_INTERVAL);
                        elapsed += POLL_INTERVAL;
                        if elapsed < interval {
                            continue;
                        }
                        elapsed = Duration::ZERO;
                        if let Err(e) = refresh_all_templates(&session, &refresh_socket) {
                            log::error!("template refresh failed: {}", e);
                        }
                    }
                })
                .expect("failed to spawn template refresh thread"),
        );
        self.socket = Some(socket);
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.stopping.store(true, Ordering::SeqCst);
        self.socket = None;
        if let Some(handle) = self.refresh_thread.take() {
            let _ = handle.join();
        }
    }

    /// Resets every domain's egress sequencer (§4.8) and, if running,
    /// bounces the transport to the new server address.
    pub fn reconfigure(&mut self, server_ip: IpAddr, server_port: u16) {
        self.config.server_ip = server_ip;
        self.config.server_port = server_port;
        self.session.reset_all_egress_sequencers();
        if self.is_running() {
            self.stop();
            let _ = self.start();
        }
    }

    /// Sends one message per domain whose egress table currently holds at
    /// least one template or option template. Does not advance any
    /// sequencer, since the resulting messages carry zero data records.
    pub fn refresh_all_templates(&self, socket: &UdpSocket) -> Result<(), IpfixError> {
        refresh_all_templates(&self.session, socket)
    }

    /// Immediately refreshes templates using the running socket, e.g. right
    /// after a catalog injects new egress templates.
    pub fn refresh_templates(&self) -> Result<(), IpfixError> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotRunning)?;
        refresh_all_templates(&self.session, socket)
    }

    pub fn send_message(&self, message: Message, now_unix_seconds: u32) -> Result<(), IpfixError> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotRunning)?;
        let bytes = self.session.write_message(message, now_unix_seconds)?;
        socket.send(&bytes).map_err(TransportError::Io)?;
        Ok(())
    }
}

fn refresh_all_templates(session: &Session, socket: &UdpSocket) -> Result<(), IpfixError> {
    for domain_id in session.domain_ids() {
        let domain = session.domain(domain_id);
        let templates = domain.egress_templates();
        let option_templates = domain.egress_option_templates();
        if templates.is_empty() && option_templates.is_empty() {
            continue;
        }
        let mut sets = Vec::new();
        if !templates.is_empty() {
            sets.push(Set::template_set(templates));
        }
        if !option_templates.is_empty() {
            sets.push(Set::option_template_set(option_templates));
        }
        let message = Message::new(domain_id, sets);
        let bytes = session.write_message(message, now_unix_seconds())?;
        socket.send(&bytes).map_err(TransportError::Io)?;
    }
    Ok(())
}

/// Current UTC time as IPFIX export time (§4.8: seconds since the Unix epoch).
fn now_unix_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.octets()[0] == 127,
        IpAddr::V6(v6) => v6.is_loopback(),
    }
}
