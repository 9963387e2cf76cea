use crate::error::DeliveryError;
use crate::reading::Reading;
use async_trait::async_trait;
use tracing::{debug, warn};

/// A destination for readings. Implementations own their transport and
/// report failures without affecting the other sinks.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Stable identifier used in logs and outcomes.
    fn name(&self) -> &'static str;

    async fn publish(&self, reading: &Reading) -> Result<(), DeliveryError>;
}

/// Delivery result for one sink within one cycle.
#[derive(Debug)]
pub struct SinkOutcome {
    pub sink: &'static str,
    pub result: Result<(), DeliveryError>,
}

/// Deliver a reading to every sink concurrently and wait for all of them.
/// Each outcome is logged on its own; no sink can block or cancel another.
pub async fn publish_all(sinks: &[Box<dyn Sink>], reading: &Reading) -> Vec<SinkOutcome> {
    let deliveries = sinks.iter().map(|sink| async move {
        let result = sink.publish(reading).await;
        match &result {
            Ok(()) => debug!(sink = sink.name(), "reading delivered"),
            Err(e) => warn!(sink = sink.name(), error = %e, "delivery failed"),
        }
        SinkOutcome {
            sink: sink.name(),
            result,
        }
    });
    futures::future::join_all(deliveries).await
}
