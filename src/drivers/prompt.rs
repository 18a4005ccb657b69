use crate::{Error, ErrorContext, Result};

pub const DEFAULT_PROMPT_TEMPLATE: &str = "Simplify the following error message delimited by triple dashes, answering in {language}: --- {prompt} ---.\n\
Give the most likely solution as short numbered steps, in no more than 280 characters. Use this output format:\n\
Error: {Explain error here}\n\
Solution: {Step by step solution here}";

const PROMPT_PLACEHOLDER: &str = "{prompt}";
const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// User-message template with `{language}` and `{prompt}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(PROMPT_PLACEHOLDER) {
            return Err(Error::configuration_with_context(
                "prompt template must contain {prompt}",
                ErrorContext::new()
                    .with_field_path("backend_config.prompt_template")
                    .with_source("prompt_template"),
            ));
        }
        Ok(Self(template))
    }

    pub fn from_config(template: Option<&str>) -> Result<Self> {
        match template {
            Some(t) => Self::new(t),
            None => Ok(Self::default()),
        }
    }

    /// Substitute placeholders in one pass; substituted text is never rescanned.
    pub fn render(&self, language: &str, prompt: &str) -> String {
        self.0
            .split(PROMPT_PLACEHOLDER)
            .map(|part| part.replace(LANGUAGE_PLACEHOLDER, language))
            .collect::<Vec<_>>()
            .join(prompt)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self(DEFAULT_PROMPT_TEMPLATE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_default_template() {
        let out = PromptTemplate::default().render("english", "pod crashloopbackoff");
        assert!(out.contains("answering in english"));
        assert!(out.contains("--- pod crashloopbackoff ---"));
        assert!(out.contains("Error: {Explain error here}"));
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        let t = PromptTemplate::new("[{language}] {prompt}").unwrap();
        assert_eq!(t.render("{prompt}", "say {language}"), "[{prompt}] say {language}");
    }

    #[test]
    fn requires_prompt_placeholder() {
        assert!(PromptTemplate::new("no placeholder").unwrap_err().is_configuration());
        assert_eq!(PromptTemplate::from_config(None).unwrap(), PromptTemplate::default());
    }
}
