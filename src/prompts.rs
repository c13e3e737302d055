//! Extracts per-scene prompt text from a b-roll markdown document.
//!
//! ~~~text
//! # Episode 3 B-roll Prompts
//! ## Scene 1
//! ```
//! a rainy street at night
//! ```
//! ~~~
use crate::error::BatchError;
use regex::Regex;
use serde::Serialize;
use std::path::Path;

/// One prompt to generate, tagged with where it belongs in the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenePrompt {
    pub episode: u32,
    pub scene: u32,
    pub prompt: String,
}

impl ScenePrompt {
    /// File name of the generated image, `episode-<E>-scene-<S>.png`.
    pub fn image_file_name(&self) -> String {
        format!("episode-{}-scene-{}.png", self.episode, self.scene)
    }
}

pub struct ScenePromptParser {
    episode_heading: Regex,
    scene_heading: Regex,
}

impl Default for ScenePromptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenePromptParser {
    pub fn new() -> Self {
        Self {
            episode_heading: Regex::new(r"(?i)^\s*#+\s*Episode\s+(\d+)\b(?:\s+B-roll\s+Prompts)?")
                .expect("Valid episode heading regex"),
            scene_heading: Regex::new(r"(?i)^\s*#{2,}\s*Scene\s+(\d+)")
                .expect("Valid scene heading regex"),
        }
    }

    /// Parses `markdown` into prompts in document order.
    ///
    /// Episode headings are `# Episode <N>`, optionally followed by
    /// `B-roll Prompts`. Each scene takes the most recent preceding episode
    /// heading (episode 1 before any heading) and the first fenced block after its heading.
    /// Documents that do not follow the layout yield no prompts.
    pub fn parse(&self, markdown: &str) -> Vec<ScenePrompt> {
        let mut prompts = Vec::new();
        let mut episode = 1;
        let mut pending_scene: Option<u32> = None;
        // Open fenced block: the scene it belongs to (if any) and its lines.
        let mut block: Option<(Option<u32>, Vec<&str>)> = None;

        for line in markdown.lines() {
            let is_fence = line.trim_start().starts_with("```");

            if let Some((scene, lines)) = block.as_mut() {
                if !is_fence {
                    lines.push(line);
                    continue;
                }
                if let Some(scene) = *scene {
                    let prompt = lines.join("\n").trim().to_string();
                    if prompt.is_empty() {
                        tracing::debug!(episode, scene, "Skipping scene with empty prompt block");
                    } else {
                        prompts.push(ScenePrompt {
                            episode,
                            scene,
                            prompt,
                        });
                    }
                }
                block = None;
                continue;
            }

            if is_fence {
                block = Some((pending_scene.take(), Vec::new()));
            } else if let Some(number) = Self::heading_number(&self.episode_heading, line) {
                episode = number;
                pending_scene = None;
            } else if let Some(number) = Self::heading_number(&self.scene_heading, line) {
                pending_scene = Some(number);
            }
        }

        tracing::debug!(count = prompts.len(), "Parsed scene prompts");
        prompts
    }

    fn heading_number(pattern: &Regex, line: &str) -> Option<u32> {
        pattern
            .captures(line)
            .and_then(|captures| captures.get(1))
            .and_then(|number| number.as_str().parse().ok())
    }
}

/// Parses scene prompts with the default heading layout.
pub fn parse_scene_prompts(markdown: &str) -> Vec<ScenePrompt> {
    ScenePromptParser::new().parse(markdown)
}

/// Reads and parses a prompt file.
pub fn load_scene_prompts(path: impl AsRef<Path>) -> Result<Vec<ScenePrompt>, BatchError> {
    let path = path.as_ref();
    let markdown = std::fs::read_to_string(path).map_err(|e| BatchError::Prompts {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(parse_scene_prompts(&markdown))
}
