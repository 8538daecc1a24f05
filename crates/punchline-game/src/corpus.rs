//! The pool of prompt texts sessions draw from.

use std::sync::Arc;

use crate::GameError;

/// Read-only list of prompt texts, loaded once at startup and shared by
/// every session.
///
/// Cloning is cheap (`Arc`). Blank entries are dropped and surrounding
/// whitespace trimmed on construction, so a corpus is never empty and
/// never hands out a blank prompt.
#[derive(Debug, Clone)]
pub struct PromptCorpus {
    prompts: Arc<[String]>,
}

impl PromptCorpus {
    /// Builds a corpus from prompt texts.
    ///
    /// # Errors
    /// [`GameError::EmptyPromptCorpus`] if no non-blank text remains.
    pub fn new<I, S>(prompts: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prompts: Vec<String> = prompts
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if prompts.is_empty() {
            return Err(GameError::EmptyPromptCorpus);
        }

        Ok(Self {
            prompts: prompts.into(),
        })
    }

    /// Builds a corpus from text holding one prompt per line.
    pub fn from_lines(text: &str) -> Result<Self, GameError> {
        Self::new(text.lines())
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.prompts.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prompts.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_trims_and_drops_blank_lines() {
        let corpus =
            PromptCorpus::from_lines("  Worst pizza topping \n\n\t\nBest excuse\n")
                .unwrap();
        let prompts: Vec<&str> = corpus.iter().collect();
        assert_eq!(prompts, vec!["Worst pizza topping", "Best excuse"]);
        assert_eq!(corpus.len(), 2);
        assert!(!corpus.is_empty());
    }

    #[test]
    fn test_corpus_rejects_empty() {
        let result = PromptCorpus::new(Vec::<String>::new());
        assert_eq!(result.unwrap_err(), GameError::EmptyPromptCorpus);

        let result = PromptCorpus::from_lines("\n   \n");
        assert_eq!(result.unwrap_err(), GameError::EmptyPromptCorpus);
    }

    #[test]
    fn test_corpus_get() {
        let corpus = PromptCorpus::new(["a", "b"]).unwrap();
        assert_eq!(corpus.get(1), Some("b"));
        assert_eq!(corpus.get(2), None);
    }
}
