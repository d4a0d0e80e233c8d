use anyhow::Result;

/// Optional last pass of the advanced cleaner, e.g. a grammar model.
pub trait LinguisticModel: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn refine(&self, text: &str) -> Result<String>;
}

/// Hands text back untouched. Stands in until a real model is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughModel;

impl LinguisticModel for PassthroughModel {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn refine(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}
