//! Drives the tracking module against the simulated SDK.
//!
//! ```text
//! cargo run -p core-tracking --example tracking_demo
//! ```

use std::sync::Arc;

use bridge_desktop::{LoggingEventSink, SimulatedTrackingSdk};
use bridge_traits::LogLevel;
use core_runtime::config::BridgeConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_tracking::TelematicsModule;

#[core_async::main]
async fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let sdk = Arc::new(SimulatedTrackingSdk::new());
    let config = BridgeConfig::builder()
        .tracking_sdk(sdk.clone())
        .activity_launcher(sdk.clone())
        .event_sink(Arc::new(LoggingEventSink::new()))
        .build()?;
    let module = TelematicsModule::new(config)?;

    module.initialize();
    let granted = module.request_permissions().await?;
    tracing::info!(granted, "Permission wizard finished");

    module.enable("demo-device-token").await?;
    module.add_future_track_tag("business", "demo").await?;
    module.add_future_track_tag("commute", "demo").await?;

    for tag in module.get_future_track_tags().await? {
        tracing::info!(tag = %tag.tag, source = %tag.source, "Future track tag");
    }

    sdk.emit_fix(52.52, 13.405, 11.2);
    core_async::task::yield_now().await;

    module.remove_all_future_track_tags().await?;
    module.disable();
    module.invalidate();

    Ok(())
}
