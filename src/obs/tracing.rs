// self
use crate::{_prelude::*, obs::Stage};

/// Future wrapped in a stage span.
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;

/// A span builder used by credentials, the directory client, and the session.
#[derive(Clone, Debug)]
pub struct StageSpan {
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage + call site.
	pub fn new(stage: Stage, site: &'static str) -> Self {
		let span = tracing::info_span!("azuread_connector.stage", stage = stage.as_str(), site);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}
