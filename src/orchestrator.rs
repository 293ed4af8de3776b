use std::sync::Arc;

use tracing::{error, info};

use crate::{
    error::AppError,
    models::{
        ArtifactBundle, ArtifactKind, GenerationRequest, GenerationResult, RefineRequest,
        RefinedScenes,
    },
    openai::TextProvider,
    prompts::{decorate_scene, PromptSpec, PromptTemplates},
};

/// Turns a validated request into provider calls and a decorated result.
///
/// Holds no per-request state: every prompt, call and result is owned by the `handle` call
/// that created it. Provider failures end the request immediately and are never retried.
pub struct Orchestrator {
    templates: PromptTemplates,
    provider: Option<Arc<dyn TextProvider>>,
}

impl Orchestrator {
    /// `provider` is `None` when no credential is configured; every request then fails with
    /// [`AppError::MissingCredential`].
    pub fn new(templates: PromptTemplates, provider: Option<Arc<dyn TextProvider>>) -> Self {
        Self { templates, provider }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn ensure_configured(&self) -> Result<&dyn TextProvider, AppError> {
        self.provider.as_deref().ok_or(AppError::MissingCredential)
    }

    pub async fn handle(&self, request: GenerationRequest) -> Result<GenerationResult, AppError> {
        let provider = self.ensure_configured()?;
        match request {
            GenerationRequest::Single { kind, news, has_reference_image } => {
                let spec = match kind {
                    ArtifactKind::Script => PromptSpec::Script { news: &news },
                    ArtifactKind::Scene => PromptSpec::Scene { news: &news, has_reference_image },
                    ArtifactKind::Video => PromptSpec::Video { news: &news },
                };
                let text = self.generate(provider, spec).await?;
                let text = match kind {
                    ArtifactKind::Scene => decorate_scene(&text, has_reference_image),
                    ArtifactKind::Script | ArtifactKind::Video => text,
                };
                Ok(GenerationResult::Text(text))
            }
            GenerationRequest::All { news, has_reference_image } => {
                let script = PromptSpec::Script { news: &news };
                let scene = PromptSpec::Scene { news: &news, has_reference_image };
                let video = PromptSpec::Video { news: &news };

                let (script, scene, video) = tokio::try_join!(
                    self.generate(provider, script),
                    self.generate(provider, scene),
                    self.generate(provider, video),
                )?;

                Ok(GenerationResult::Bundle(ArtifactBundle {
                    script,
                    scene: decorate_scene(&scene, has_reference_image),
                    video,
                }))
            }
            GenerationRequest::Refine(refine) => self.refine(provider, refine).await,
        }
    }

    async fn refine(
        &self,
        provider: &dyn TextProvider,
        request: RefineRequest,
    ) -> Result<GenerationResult, AppError> {
        let spec = PromptSpec::Refine {
            original_news: &request.original_news,
            current_scenes: &request.current_scenes,
            instruction: &request.instruction,
        };

        let (scenes, video) = if request.regenerate_video {
            let video = PromptSpec::Video { news: &request.original_news };
            let (scenes, video) =
                tokio::try_join!(self.generate(provider, spec), self.generate(provider, video))?;
            (scenes, Some(video))
        } else {
            (self.generate(provider, spec).await?, None)
        };

        Ok(GenerationResult::Refined(RefinedScenes {
            scenes: decorate_scene(&scenes, request.has_reference_image),
            video,
        }))
    }

    async fn generate(
        &self,
        provider: &dyn TextProvider,
        spec: PromptSpec<'_>,
    ) -> Result<String, AppError> {
        let prompt = self.templates.render(&spec);
        info!("🤖 Generating {} ({} chars of prompt)", spec.name(), prompt.chars().count());
        match provider.complete(&prompt).await {
            Ok(text) => {
                info!("✅ {} generated ({} chars)", spec.name(), text.chars().count());
                Ok(text)
            }
            Err(e) => {
                error!(status = ?e.status(), "💥 {} generation failed: {}", spec.name(), e);
                Err(e.into())
            }
        }
    }
}
