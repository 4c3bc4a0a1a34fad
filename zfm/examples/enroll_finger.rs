//! Enroll one finger into a chosen slot

use zfm::{ConsoleOperator, Device, EnrollConfig, Enrollment, SlotId};

#[tokio::main]
async fn main() -> zfm::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let port = std::env::var("ZFM_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());
    let slot: u16 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1);

    let mut device = Device::serial(port);
    device.connect().await?;
    println!("✓ Module connected");

    let mut operator = ConsoleOperator;
    let mut enrollment = Enrollment::new(SlotId(slot), EnrollConfig::default());
    enrollment.run(&mut device, &mut operator).await?;

    println!("✓ Stored; {} template(s) on the module", device.template_count().await?);

    device.disconnect().await?;
    Ok(())
}
