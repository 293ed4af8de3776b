use std::path::Path;

use anyhow::{anyhow, Context};
use include_dir::{include_dir, Dir};
use tracing::info;

static EMBEDDED_TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/prompts");

/// Banner prepended to scene prompts when the user supplies a news image.
pub const REFERENCE_IMAGE_BANNER: &str = "⚠️ Before generating: upload the Kongming reference \
    image AND the news image, and use the news image in scenes 2 and 3.";

/// Banner prepended to scene prompts when no news image is supplied.
pub const NO_IMAGE_BANNER: &str = "⚠️ Before generating: upload the Kongming reference image.";

/// The renderable prompt kinds, each carrying exactly the inputs its template needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSpec<'a> {
    Script {
        news: &'a str,
    },
    Scene {
        news: &'a str,
        has_reference_image: bool,
    },
    Video {
        news: &'a str,
    },
    Refine {
        original_news: &'a str,
        current_scenes: &'a str,
        instruction: &'a str,
    },
}

impl PromptSpec<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            PromptSpec::Script { .. } => "script",
            PromptSpec::Scene { .. } => "scene",
            PromptSpec::Video { .. } => "video",
            PromptSpec::Refine { .. } => "refine",
        }
    }
}

/// Template texts used by [`PromptTemplates::render`]. Slots are written as `{{name}}`.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    persona: String,
    script: String,
    scene_reference: String,
    scene_invented: String,
    video: String,
    refine: String,
}

impl PromptTemplates {
    /// Loads the embedded templates, letting any `<name>.txt` in `override_dir` replace its
    /// embedded counterpart.
    pub fn load(override_dir: Option<&Path>) -> anyhow::Result<Self> {
        let template = |name: &str| load_template(override_dir, name);
        Ok(Self {
            persona: template("persona")?,
            script: template("script")?,
            scene_reference: template("scene_reference")?,
            scene_invented: template("scene_invented")?,
            video: template("video")?,
            refine: template("refine")?,
        })
    }

    pub fn render(&self, spec: &PromptSpec<'_>) -> String {
        match *spec {
            PromptSpec::Script { news } => {
                fill(&self.script, &[("persona", self.persona.trim_end()), ("news", news)])
            }
            PromptSpec::Scene { news, has_reference_image } => {
                let template = if has_reference_image {
                    &self.scene_reference
                } else {
                    &self.scene_invented
                };
                fill(template, &[("news", news)])
            }
            PromptSpec::Video { news } => fill(&self.video, &[("news", news)]),
            PromptSpec::Refine { original_news, current_scenes, instruction } => fill(
                &self.refine,
                &[
                    ("news", original_news),
                    ("current_scenes", current_scenes),
                    ("instruction", instruction),
                ],
            ),
        }
    }
}

fn load_template(override_dir: Option<&Path>, name: &str) -> anyhow::Result<String> {
    let file_name = format!("{name}.txt");
    if let Some(dir) = override_dir {
        let path = dir.join(&file_name);
        if path.is_file() {
            info!("📄 Using prompt template override: {}", path.display());
            return std::fs::read_to_string(&path)
                .with_context(|| format!("reading prompt template {}", path.display()));
        }
    }
    EMBEDDED_TEMPLATES
        .get_file(&file_name)
        .and_then(|f| f.contents_utf8())
        .map(str::to_owned)
        .ok_or_else(|| anyhow!("embedded prompt template {file_name} is missing"))
}

pub fn scene_banner(has_reference_image: bool) -> &'static str {
    if has_reference_image {
        REFERENCE_IMAGE_BANNER
    } else {
        NO_IMAGE_BANNER
    }
}

/// Prefixes a scene completion with the usage banner for the given image mode.
pub fn decorate_scene(raw: &str, has_reference_image: bool) -> String {
    format!("{}\n\n{}", scene_banner(has_reference_image), raw)
}

// Single pass: values are never scanned for further slots, and unknown slots are kept verbatim.
fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let extra: usize = slots.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match slots.iter().find(|(name, _)| *name == key) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
