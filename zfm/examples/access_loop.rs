//! Full startup policy: enroll when the module is empty, then poll for
//! matches forever

use zfm::{AppConfig, ConsoleOperator, Device};

#[tokio::main]
async fn main() -> zfm::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Change to your serial port
    let port = std::env::var("ZFM_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    println!("Using fingerprint module on {}...", port);

    let mut device = Device::serial(port);
    let mut operator = ConsoleOperator;

    zfm::run(&mut device, &mut operator, &AppConfig::default()).await
}
