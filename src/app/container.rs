use std::path::Path;
use std::sync::Arc;

use crate::adapters::{LocalFsAdapter, OsRandomAdapter, TokioProcessAdapter, ZipArchiveAdapter};
use crate::app::package_interactor::PackageInteractor;
use crate::domain::errors::DomainError;
use crate::domain::model::{JobContext, JobId};
use crate::engine::PipelineSettings;
use crate::ports::{ArchivePort, EventSink, FsPort, ProcessPort, RandomPort};

pub trait AppContainer: Send + Sync {
    fn package_interactor(&self) -> Arc<PackageInteractor>;

    /// Build the job context for `input`, generating a job id when none is given
    fn context_for(&self, input: &Path, job_id: Option<&str>) -> Result<JobContext, DomainError>;
}

pub struct DefaultAppContainer {
    settings: PipelineSettings,
    package_interactor: Arc<PackageInteractor>,
}

impl DefaultAppContainer {
    pub fn new(settings: PipelineSettings, events: Arc<dyn EventSink>) -> Result<Self, DomainError> {
        let fs_port = Arc::new(LocalFsAdapter::new()?);
        let random_port = Arc::new(OsRandomAdapter::new()?);
        let process_port = Arc::new(TokioProcessAdapter::new()?);
        let archive_port = Arc::new(ZipArchiveAdapter::new()?);

        let package_interactor = Arc::new(PackageInteractor::new(
            &settings,
            Arc::clone(&fs_port) as Arc<dyn FsPort>,
            Arc::clone(&random_port) as Arc<dyn RandomPort>,
            Arc::clone(&process_port) as Arc<dyn ProcessPort>,
            Arc::clone(&archive_port) as Arc<dyn ArchivePort>,
            events,
        ));

        Ok(Self {
            settings,
            package_interactor,
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn package_interactor(&self) -> Arc<PackageInteractor> {
        Arc::clone(&self.package_interactor)
    }

    fn context_for(&self, input: &Path, job_id: Option<&str>) -> Result<JobContext, DomainError> {
        let job_id = match job_id {
            Some(raw) => JobId::parse(raw)?,
            None => JobId::generate(),
        };
        JobContext::new(input, job_id, &self.settings.work_root)
    }
}
