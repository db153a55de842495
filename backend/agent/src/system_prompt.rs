//! System prompt and default task text.

use std::path::Path;

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn system_prompt() -> String {
        "You are a helpful assistant designed to extract information from documents. \
         You have access to an OCR tool that extracts raw text from images. \
         Whenever you are given an image path, call the OCR tool on it before answering. \
         Always report extracted results clearly and only include the requested fields \
         without extraneous information."
            .to_string()
    }

    /// Task used when the caller gives no instruction.
    pub fn default_task(image_path: &Path) -> String {
        format!(
            "Process the document at '{}' using OCR and extract the information in a \
             structured format. Label each field clearly.",
            image_path.display()
        )
    }

    /// Task text sent to the agent: the caller's instruction anchored to the image path.
    pub fn task(image_path: &Path, instruction: Option<&str>) -> String {
        match instruction.map(str::trim).filter(|s| !s.is_empty()) {
            Some(instruction) => format!(
                "{instruction}\n\nThe document image is at '{}'.",
                image_path.display()
            ),
            None => Self::default_task(image_path),
        }
    }
}
