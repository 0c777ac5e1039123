//! Operator prompts on the terminal
//!
//! Generic over the reader and writer so prompts can be driven from tests.

use std::io::{self, BufRead, Write};

use crate::core::ports::TagSource;
use crate::core::services::RunError;

/// Print `message` and read one line; `None` on end of input
pub fn prompt_line<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    message: &str,
) -> io::Result<Option<String>> {
    write!(writer, "{message}")?;
    writer.flush()?;
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask until a non-empty answer is given
///
/// End of input means the value can never be supplied.
pub fn prompt_required<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    message: &str,
    what: &str,
) -> Result<String, RunError> {
    loop {
        match prompt_line(reader, writer, message) {
            Ok(Some(answer)) if !answer.is_empty() => return Ok(answer),
            Ok(Some(_)) => {},
            Ok(None) | Err(_) => return Err(RunError::MissingInput(what.to_string())),
        }
    }
}

/// Asks the operator for each replacement tag
#[derive(Debug)]
pub struct PromptTags<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> PromptTags<R, W> {
    /// Prompt on `writer`, read answers from `reader`
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl PromptTags<io::StdinLock<'static>, io::Stderr> {
    /// Read from stdin, prompt on stderr (stdout stays free for the report)
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TagSource for PromptTags<R, W> {
    fn replacement_tag(&mut self, repo: &str, job: &str, old_image: &str) -> anyhow::Result<String> {
        let message = format!(
            "\n[{repo}] job '{job}': deprecated image '{old_image}' found, specify new tag (press enter for default): "
        );
        prompt_line(&mut self.reader, &mut self.writer, &message)?
            .ok_or_else(|| anyhow::anyhow!("input closed while asking for a replacement tag"))
    }
}
