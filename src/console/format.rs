use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output encoding requested from the prompt engine and used to pick the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnFormat {
    #[default]
    Markdown,
    Json,
    Html,
    Text,
}

impl ReturnFormat {
    pub const ALL: [ReturnFormat; 4] = [
        ReturnFormat::Markdown,
        ReturnFormat::Json,
        ReturnFormat::Html,
        ReturnFormat::Text,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReturnFormat::Markdown => "markdown",
            ReturnFormat::Json => "json",
            ReturnFormat::Html => "html",
            ReturnFormat::Text => "text",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReturnFormat::Markdown => "Markdown format",
            ReturnFormat::Json => "JSON format",
            ReturnFormat::Html => "HTML format",
            ReturnFormat::Text => "Plain text",
        }
    }

    /// Instruction appended to the prompt so the engine answers in this format.
    pub fn directive(self) -> String {
        format!("Return the result in {} format", self.as_str())
    }
}

impl fmt::Display for ReturnFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown return format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for ReturnFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReturnFormat::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_markdown() {
        assert_eq!(ReturnFormat::default(), ReturnFormat::Markdown);
    }

    #[test]
    fn directive_names_the_format() {
        assert_eq!(
            ReturnFormat::Json.directive(),
            "Return the result in json format"
        );
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("HTML".parse::<ReturnFormat>(), Ok(ReturnFormat::Html));
        assert_eq!(" text ".parse::<ReturnFormat>(), Ok(ReturnFormat::Text));
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "yaml".parse::<ReturnFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unknown return format: yaml");
    }

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&ReturnFormat::Markdown).unwrap(),
            "\"markdown\""
        );
    }
}
