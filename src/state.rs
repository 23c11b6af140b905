use crate::{
    config::Configuration, media::ArcMediaTools, repo::ArcRepo, store::Store, tmp_file::ArcTmpDir,
};

#[derive(Clone)]
pub(crate) struct State {
    pub(super) config: Configuration,
    pub(super) tmp_dir: ArcTmpDir,
    pub(super) repo: ArcRepo,
    pub(super) store: Store,
    pub(super) tools: ArcMediaTools,
}
