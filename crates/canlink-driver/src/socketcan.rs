//! SocketCAN raw-socket driver (Linux only)

use async_trait::async_trait;
use canlink_core::{Driver, DriverError, DriverResult, Frame, CLASSIC_MAX_DLC};
use parking_lot::Mutex;
use socketcan::{
    CanFrame, CanSocket, EmbeddedFrame, ExtendedId, Frame as _, Id, Socket, StandardId,
};

use crate::config::SocketCanConfig;

/// Classical CAN over a raw SocketCAN socket
///
/// The socket is non-blocking: a read with nothing pending returns
/// `NoFrameAvailable` instead of parking the task.
pub struct SocketCanDriver {
    interface: String,
    socket: Mutex<CanSocket>,
}

impl SocketCanDriver {
    /// Open the configured interface, or `channel` when none is configured
    pub fn open(config: &SocketCanConfig, channel: &str) -> DriverResult<Self> {
        let interface = config
            .interface
            .clone()
            .unwrap_or_else(|| channel.to_string());

        let socket = CanSocket::open(&interface).map_err(|e| {
            DriverError::Transport(format!("Failed to open CAN socket on {}: {}", interface, e))
        })?;

        socket.set_nonblocking(true).map_err(|e| {
            DriverError::InvalidConfig(format!("Failed to set non-blocking: {}", e))
        })?;

        tracing::info!(%interface, bitrate = config.bitrate, "SocketCAN driver opened");

        Ok(Self {
            interface,
            socket: Mutex::new(socket),
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

fn to_can_frame(frame: &Frame) -> DriverResult<CanFrame> {
    if frame.len() > CLASSIC_MAX_DLC {
        return Err(DriverError::InvalidFrame(format!(
            "payload of {} bytes exceeds {} bytes",
            frame.len(),
            CLASSIC_MAX_DLC
        )));
    }

    let id: Id = if frame.is_extended() {
        ExtendedId::new(frame.id())
            .map(Id::Extended)
            .ok_or_else(|| {
                DriverError::InvalidFrame(format!("Invalid extended CAN ID: 0x{:X}", frame.id()))
            })?
    } else {
        StandardId::new(frame.id() as u16)
            .map(Id::Standard)
            .ok_or_else(|| {
                DriverError::InvalidFrame(format!("Invalid standard CAN ID: 0x{:X}", frame.id()))
            })?
    };

    CanFrame::new(id, frame.data())
        .ok_or_else(|| DriverError::InvalidFrame(format!("Cannot encode frame {}", frame)))
}

#[async_trait]
impl Driver for SocketCanDriver {
    async fn write_frame(&self, frame: &Frame) -> DriverResult<()> {
        let can_frame = to_can_frame(frame)?;
        self.socket
            .lock()
            .write_frame(&can_frame)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::WouldBlock => {
                    DriverError::Transport("CAN transmit queue full".to_string())
                }
                _ => DriverError::from(e),
            })?;
        tracing::debug!(interface = %self.interface, %frame, "SocketCAN: sent frame");
        Ok(())
    }

    async fn read_frame(&self) -> DriverResult<Frame> {
        let can_frame = self.socket.lock().read_frame()?;
        let frame = Frame::new(can_frame.raw_id(), can_frame.data().to_vec());
        tracing::debug!(interface = %self.interface, %frame, "SocketCAN: received frame");
        Ok(frame)
    }

    fn kind(&self) -> &'static str {
        "socketcan"
    }
}
