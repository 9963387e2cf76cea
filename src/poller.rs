use crate::config::PortalConfig;
use crate::error::CycleError;
use crate::portal::PortalSession;
use crate::sink::{publish_all, Sink};
use tracing::{info, warn};

/// One poll cycle: fresh portal login, one reading, fan-out to every sink.
pub struct Poller {
    portal: PortalConfig,
    sinks: Vec<Box<dyn Sink>>,
}

impl Poller {
    pub fn new(portal: PortalConfig, sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { portal, sinks }
    }

    /// Auth and fetch failures abort the cycle; sink failures are logged
    /// per sink and never abort it.
    pub async fn run_cycle(&self) -> Result<(), CycleError> {
        let session = PortalSession::login(&self.portal).await?;
        let reading = session.fetch_reading().await?;
        info!(
            ts = %reading.ts_string(),
            water_temp = reading.water_temp,
            outside_temp = reading.outside_temp,
            state = %reading.state,
            "reading fetched"
        );

        let outcomes = publish_all(&self.sinks, &reading).await;
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        if failed > 0 {
            warn!(
                failed,
                total = outcomes.len(),
                "some sinks did not accept the reading"
            );
        }
        Ok(())
    }
}
