//! Broker Synthesizer - renders a package record and replaces its broker file.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    application::ports::{BrokerRenderer, Filesystem},
    domain::{BrokerArtifact, BrokerSlot, BrokerView, PackageRecord},
    error::GibranResult,
};

pub struct BrokerSynthesizer {
    renderer: Box<dyn BrokerRenderer>,
    filesystem: Arc<dyn Filesystem>,
}

impl BrokerSynthesizer {
    pub fn new(renderer: Box<dyn BrokerRenderer>, filesystem: Arc<dyn Filesystem>) -> Self {
        Self {
            renderer,
            filesystem,
        }
    }

    /// Render broker text without writing it.
    pub fn render(&self, record: &PackageRecord) -> GibranResult<String> {
        self.renderer.render(&BrokerView::from_record(record))
    }

    /// Render and atomically write the broker for `record` into `slot`.
    ///
    /// Nothing is written if rendering fails.
    #[instrument(skip_all, fields(package = record.name(), slot = %slot.path().display()))]
    pub fn synthesize(
        &self,
        record: &PackageRecord,
        slot: &BrokerSlot,
    ) -> GibranResult<BrokerArtifact> {
        let content = self.render(record)?;
        self.filesystem.write_atomic(slot.path(), &content)?;
        debug!(bytes = content.len(), "Broker written");

        Ok(BrokerArtifact {
            path: slot.path().to_path_buf(),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;
    use crate::application::ports::{MockBrokerRenderer, MockFilesystem};
    use crate::domain::{ErrorKind, Markers};
    use std::path::Path;

    fn record() -> PackageRecord {
        PackageRecord::new("models", "shop/models", "models", vec![], vec![], vec![], vec![])
    }

    fn slot() -> BrokerSlot {
        BrokerSlot::new("/work/shop/models/broker.go", &Markers::default()).unwrap()
    }

    #[test]
    fn writes_rendered_text_to_slot() {
        let mut renderer = MockBrokerRenderer::new();
        renderer
            .expect_render()
            .withf(|view| view.package_name == "models")
            .returning(|_| Ok("package models\n".into()));
        let mut fs = MockFilesystem::new();
        fs.expect_write_atomic()
            .withf(|p, c| p.ends_with("models/broker.go") && c.starts_with("package models"))
            .times(1)
            .returning(|_, _| Ok(()));

        let synth = BrokerSynthesizer::new(Box::new(renderer), Arc::new(fs));
        let artifact = synth.synthesize(&record(), &slot()).unwrap();
        assert_eq!(artifact.path, Path::new("/work/shop/models/broker.go"));
        assert_eq!(artifact.content, "package models\n");
    }

    #[test]
    fn render_failure_writes_nothing() {
        let mut renderer = MockBrokerRenderer::new();
        renderer.expect_render().returning(|_| {
            Err(ApplicationError::RenderingFailed {
                reason: "unknown field".into(),
            }
            .into())
        });
        let mut fs = MockFilesystem::new();
        fs.expect_write_atomic().never();

        let synth = BrokerSynthesizer::new(Box::new(renderer), Arc::new(fs));
        let err = synth.synthesize(&record(), &slot()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateFailure);
    }
}
