use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct GenerateQuery {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Raw JSON body of `POST /api/generate`. Which fields are required depends on the request mode.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    #[serde(default)]
    pub news: Option<String>,
    #[serde(default)]
    pub has_news_image: Option<bool>,
    #[serde(default)]
    pub current_scenes: Option<String>,
    #[serde(default)]
    pub user_request: Option<String>,
    #[serde(default)]
    pub original_news: Option<String>,
    #[serde(default)]
    pub regenerate_video: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Script,
    Scene,
    Video,
}

/// Value of the `type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Single(ArtifactKind),
    All,
    Refine,
}

impl FromStr for RequestMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" => Ok(RequestMode::Single(ArtifactKind::Script)),
            "scene" => Ok(RequestMode::Single(ArtifactKind::Scene)),
            "video" => Ok(RequestMode::Single(ArtifactKind::Video)),
            "all" => Ok(RequestMode::All),
            "refine" => Ok(RequestMode::Refine),
            other => Err(AppError::UnknownArtifactKind(other.to_string())),
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestMode::Single(ArtifactKind::Script) => "script",
            RequestMode::Single(ArtifactKind::Scene) => "scene",
            RequestMode::Single(ArtifactKind::Video) => "video",
            RequestMode::All => "all",
            RequestMode::Refine => "refine",
        };
        f.write_str(name)
    }
}

/// A validated generation request; required text is guaranteed non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    Single { kind: ArtifactKind, news: String, has_reference_image: bool },
    All { news: String, has_reference_image: bool },
    Refine(RefineRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefineRequest {
    pub current_scenes: String,
    pub instruction: String,
    pub original_news: String,
    pub has_reference_image: bool,
    pub regenerate_video: bool,
}

impl GenerationRequest {
    pub fn from_parts(mode: RequestMode, body: GenerateBody) -> Result<Self, AppError> {
        let has_reference_image = body.has_news_image.unwrap_or(false);
        match mode {
            RequestMode::Single(kind) => Ok(GenerationRequest::Single {
                kind,
                news: required(body.news, "News content is required")?,
                has_reference_image,
            }),
            RequestMode::All => Ok(GenerationRequest::All {
                news: required(body.news, "News content is required")?,
                has_reference_image,
            }),
            RequestMode::Refine => Ok(GenerationRequest::Refine(RefineRequest {
                current_scenes: required(body.current_scenes, "currentScenes is required")?,
                instruction: required(body.user_request, "userRequest is required")?,
                original_news: required(body.original_news, "originalNews is required")?,
                has_reference_image,
                regenerate_video: body.regenerate_video.unwrap_or(false),
            })),
        }
    }
}

fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AppError::MissingInput(message.to_string())),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArtifactBundle {
    pub script: String,
    pub scene: String,
    pub video: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefinedScenes {
    pub scenes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum GenerationResult {
    Text(String),
    Bundle(ArtifactBundle),
    Refined(RefinedScenes),
}

/// `{ success, result }` or `{ success, error }`; the only response shape callers see.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn ok(result: GenerationResult) -> Self {
        Self { success: true, result: Some(result), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, result: None, error: Some(error.into()) }
    }
}
