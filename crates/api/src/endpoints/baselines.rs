use crate::wire::{BaselineInput, BulkBaselines, BulkBaselinesWire};
use crate::{ApiClient, ApiError, Baseline, ProgramId};

impl ApiClient {
    /// Create every baseline of a program in one call.
    ///
    /// When the server only acknowledges the request, the submitted
    /// baselines are returned as created.
    pub async fn create_baselines(
        &self,
        program_id: ProgramId,
        baselines: &[Baseline],
    ) -> Result<Vec<Baseline>, ApiError> {
        let body = BulkBaselines {
            baselines: baselines.iter().map(BaselineInput::from).collect(),
        };
        let created: BulkBaselinesWire = self
            .post(&format!("/programs/{}/baselines/bulk", program_id))
            .json(&body)?
            .execute()
            .await?;

        Ok(match created {
            BulkBaselinesWire::List(list) | BulkBaselinesWire::Wrapped { baselines: list } => {
                list.into_iter().map(Baseline::from).collect()
            }
            BulkBaselinesWire::Other(_) => baselines.to_vec(),
        })
    }
}
