//! Replacement tag source port

/// Supplies the replacement tag for a deprecated image
///
/// The interactive terminal prompt is one implementation; a fixed tag given
/// on the command line is another. An empty answer selects the default tag.
pub trait TagSource {
    /// Tag to use in place of the version of `old_image` in `job` of `repo`
    fn replacement_tag(&mut self, repo: &str, job: &str, old_image: &str) -> anyhow::Result<String>;
}

/// Always answers with the same tag
#[derive(Debug, Clone, Default)]
pub struct FixedTag(pub String);

impl FixedTag {
    /// Use `tag` for every replacement
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl TagSource for FixedTag {
    fn replacement_tag(&mut self, _repo: &str, _job: &str, _old_image: &str) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}
