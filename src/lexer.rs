//! Splitting a raw command line into words.
//!
//! The shell has no quoting, escaping or expansion: a word is any run of
//! characters between single spaces. Runs of spaces collapse, so a line made of
//! spaces yields no words at all. Tabs and other whitespace are ordinary
//! characters and stay inside the word they appear in.

use crate::error::ShellError;

/// Word delimiter.
const DELIMITER: char = ' ';

/// Append the words of `line` to `tokens`, in their original order.
///
/// Fails with [`ShellError::Parse`] if the line holds a NUL byte, since such a
/// word could never be handed to a program. `tokens` is left untouched on error.
pub fn tokenize(line: &str, tokens: &mut Vec<String>) -> Result<(), ShellError> {
    if let Some(pos) = line.find('\0') {
        return Err(ShellError::Parse(format!(
            "unexpected NUL byte at offset {}",
            pos
        )));
    }

    tokens.extend(
        line.split(DELIMITER)
            .filter(|word| !word.is_empty())
            .map(str::to_owned),
    );
    Ok(())
}

/// Convenience wrapper around [`tokenize`] returning a fresh vector.
pub fn split_into_words(line: &str) -> Result<Vec<String>, ShellError> {
    let mut tokens = Vec::new();
    tokenize(line, &mut tokens)?;
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        split_into_words(line).unwrap()
    }

    #[test]
    fn test_redirection_line() {
        assert_eq!(words("ls -l > out.txt"), vec!["ls", "-l", ">", "out.txt"]);
    }

    #[test]
    fn test_empty_and_blank_lines_yield_nothing() {
        assert!(words("").is_empty());
        assert!(words("     ").is_empty());
    }

    #[test]
    fn test_repeated_spaces_collapse() {
        assert_eq!(words("  sleep   5  & "), vec!["sleep", "5", "&"]);
    }

    #[test]
    fn test_only_space_is_a_delimiter() {
        assert_eq!(words("echo a\tb"), vec!["echo", "a\tb"]);
        assert_eq!(words("\t"), vec!["\t"]);
    }

    #[test]
    fn test_appends_to_existing_tokens() {
        let mut tokens = vec!["first".to_string()];
        tokenize("second third", &mut tokens).unwrap();
        assert_eq!(tokens, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_nul_byte_is_rejected() {
        let mut tokens = Vec::new();
        let err = tokenize("echo a\0b", &mut tokens).unwrap_err();
        assert!(matches!(err, ShellError::Parse(_)));
        assert!(tokens.is_empty());
    }
}
