//! Serial port transport (8N1, configured baud rate).

use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialPortType,
    SerialStream, StopBits,
};

use super::{LineLink, Transport, TransportError};
use crate::config::SerialConfig;

impl Transport for SerialStream {
    fn driver_pending(&self) -> usize {
        self.bytes_to_read().map_or(0, |n| n as usize)
    }

    fn clear_input(&mut self) -> std::io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(std::io::Error::from)
    }
}

/// Open the configured serial device as a line link.
pub fn open_serial(config: &SerialConfig) -> Result<LineLink<SerialStream>, TransportError> {
    tracing::info!(port = %config.port, baud = config.baud_rate, "Opening serial port");

    let stream = tokio_serial::new(&config.port, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open_native_async()
        .map_err(|e| TransportError::Open {
            target: config.port.clone(),
            message: e.to_string(),
        })?;

    let name = format!("serial:{}", config.port);
    Ok(LineLink::new(stream, name).with_read_timeout(config.read_timeout()))
}

/// A serial device visible to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}

/// Enumerate serial devices, sorted by name.
pub fn list_ports() -> Result<Vec<PortInfo>, TransportError> {
    let ports = tokio_serial::available_ports().map_err(|e| TransportError::Open {
        target: "serial port list".to_string(),
        message: e.to_string(),
    })?;

    let mut infos: Vec<PortInfo> = ports
        .into_iter()
        .map(|p| PortInfo {
            description: describe(&p.port_type),
            name: p.port_name,
        })
        .collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(infos)
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("USB serial");
            match usb.manufacturer.as_deref() {
                Some(m) => format!("{product} ({m}) [{:04x}:{:04x}]", usb.vid, usb.pid),
                None => format!("{product} [{:04x}:{:04x}]", usb.vid, usb.pid),
            }
        }
        SerialPortType::PciPort => "PCI serial".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth serial".to_string(),
        SerialPortType::Unknown => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_port_reports_target() {
        let config = SerialConfig {
            port: "/dev/accelmon-does-not-exist".to_string(),
            ..SerialConfig::default()
        };
        match open_serial(&config) {
            Err(TransportError::Open { target, .. }) => {
                assert_eq!(target, "/dev/accelmon-does-not-exist");
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("opening a missing device must fail"),
        }
    }

    #[test]
    fn test_port_info_display() {
        let info = PortInfo {
            name: "/dev/ttyUSB0".to_string(),
            description: "CP2102 [10c4:ea60]".to_string(),
        };
        assert_eq!(info.to_string(), "/dev/ttyUSB0: CP2102 [10c4:ea60]");
    }
}
