//! Loading the prompt corpus from disk.

use std::path::Path;

use punchline_game::PromptCorpus;

use crate::PunchlineError;

/// Reads a prompt file with one prompt per line.
///
/// Blank lines and surrounding whitespace are dropped.
///
/// # Errors
/// - [`PunchlineError::PromptFile`] if the file cannot be read.
/// - [`PunchlineError::Game`] if it holds no prompts.
pub async fn load_prompts(path: impl AsRef<Path>) -> Result<PromptCorpus, PunchlineError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PunchlineError::PromptFile {
            path: path.to_path_buf(),
            source,
        })?;

    let corpus = PromptCorpus::from_lines(&text)?;
    tracing::info!(path = %path.display(), prompts = corpus.len(), "prompts loaded");
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use punchline_game::GameError;

    fn prompt_file(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("prompts.txt");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_prompts_reads_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = prompt_file(&dir, "First prompt\n\n  Second prompt  \n");
        let corpus = load_prompts(&path).await.unwrap();
        let prompts: Vec<&str> = corpus.iter().collect();
        assert_eq!(prompts, vec!["First prompt", "Second prompt"]);
    }

    #[tokio::test]
    async fn test_load_prompts_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_prompts(dir.path().join("absent.txt")).await.unwrap_err();
        assert!(matches!(err, PunchlineError::PromptFile { .. }));
    }

    #[tokio::test]
    async fn test_load_prompts_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = prompt_file(&dir, "\n   \n");
        let err = load_prompts(&path).await.unwrap_err();
        assert!(matches!(err, PunchlineError::Game(GameError::EmptyPromptCorpus)));
    }
}
