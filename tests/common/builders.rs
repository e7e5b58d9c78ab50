//! Test data builders for creating test objects

use algoviz_rs::config::{AnimationConfig, DisplayLine};
use algoviz_rs::{NodeValue, StructureKind};

/// Builder for animation configs
pub struct ConfigBuilder {
    config: AnimationConfig,
}

impl ConfigBuilder {
    pub fn new(structure: StructureKind) -> Self {
        Self {
            config: AnimationConfig::new(structure, "[]"),
        }
    }

    pub fn executable(mut self, source: &str) -> Self {
        self.config.executable = source.to_string();
        self
    }

    /// Add display lines `line 0`, `line 1`, ... with matching comments
    pub fn numbered_lines(mut self, count: usize) -> Self {
        self.config.display_lines = (0..count)
            .map(|i| DisplayLine::new(format!("line {}", i), format!("comment {}", i)))
            .collect();
        self
    }

    pub fn values(mut self, values: &[f64]) -> Self {
        self.config.initial_values = values.iter().map(|&v| NodeValue::Number(v)).collect();
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.config.title = Some(title.to_string());
        self
    }

    pub fn build(self) -> AnimationConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new(StructureKind::List)
            .numbered_lines(3)
            .values(&[1.0])
            .title("demo")
            .build();

        assert_eq!(config.display_lines.len(), 3);
        assert_eq!(config.initial_values, vec![NodeValue::Number(1.0)]);
        assert_eq!(config.title.as_deref(), Some("demo"));
    }
}
