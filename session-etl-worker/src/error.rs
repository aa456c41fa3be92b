use thiserror::Error;

use crate::job::Stage;

// A stage marker carried in the error chain. The driver extracts it with
// failed_stage() so the final log line names the stage that broke the run.
#[derive(Error, Debug, Clone, Copy)]
#[error("{stage} stage failed")]
pub struct StageFailure {
    pub stage: Stage,
}

pub trait AtStage<T> {
    fn at_stage(self, stage: Stage) -> anyhow::Result<T>;
}

impl<T> AtStage<T> for anyhow::Result<T> {
    fn at_stage(self, stage: Stage) -> anyhow::Result<T> {
        self.map_err(|e| e.context(StageFailure { stage }))
    }
}

pub fn failed_stage(error: &anyhow::Error) -> Option<Stage> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<StageFailure>())
        .map(|failure| failure.stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn stage_marker_survives_context_wrapping() {
        let base: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let error = base
            .context("reading raw events")
            .at_stage(Stage::Ingest)
            .map_err(|e| e.context("run aborted"))
            .unwrap_err();
        assert_eq!(failed_stage(&error), Some(Stage::Ingest));
    }

    #[test]
    fn unmarked_errors_have_no_stage() {
        let error = anyhow::anyhow!("boom");
        assert_eq!(failed_stage(&error), None);
    }
}
