use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tab_width must be a positive integer")]
    ZeroTabWidth,
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Editor settings consumed by the mode handler.
///
/// The host owns the configuration; the handler keeps an immutable copy and
/// only reads it when rendering indentation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Display width of a tab character.
    pub tab_width: u32,
    /// Render indentation as spaces instead of tab characters.
    pub expand_tab: bool,
    /// Columns added or removed by `>` and `<`. Zero means "use `tab_width`".
    pub shift_width: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tab_width: 4,
            expand_tab: true,
            shift_width: 0,
        }
    }
}

impl Config {
    pub fn new(tab_width: u32, expand_tab: bool) -> Self {
        Self {
            tab_width,
            expand_tab,
            ..Self::default()
        }
    }

    /// Parses a TOML table such as `tab_width = 8` and validates it.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tab_width == 0 {
            return Err(ConfigError::ZeroTabWidth);
        }
        Ok(())
    }

    /// Tab width, never zero even for an unvalidated config.
    pub fn tab_width(&self) -> u32 {
        self.tab_width.max(1)
    }

    pub fn shift_width(&self) -> u32 {
        match self.shift_width {
            0 => self.tab_width(),
            sw => sw,
        }
    }

    /// Renders `width` display columns of indentation.
    pub fn indent_text(&self, width: u32) -> String {
        if self.expand_tab {
            return " ".repeat(width as usize);
        }
        let tab = self.tab_width();
        let mut text = "\t".repeat((width / tab) as usize);
        text.push_str(&" ".repeat((width % tab) as usize));
        text
    }

    /// Text inserted by the Tab key when the cursor sits at display column `col`.
    pub fn tab_text(&self, col: u32) -> String {
        if self.expand_tab {
            let tab = self.tab_width();
            " ".repeat((tab - col % tab) as usize)
        } else {
            "\t".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_from_toml_with_defaults() {
        let config = Config::from_toml("tab_width = 8\nexpand_tab = false").unwrap();
        assert_eq!(config.tab_width, 8);
        assert!(!config.expand_tab);
        assert_eq!(config.shift_width(), 8);

        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn rejects_zero_tab_width_and_unknown_keys() {
        assert!(matches!(
            Config::from_toml("tab_width = 0"),
            Err(ConfigError::ZeroTabWidth)
        ));
        assert!(matches!(
            Config::from_toml("tabstop = 4"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn indent_text_follows_expand_tab() {
        assert_eq!(Config::new(4, true).indent_text(6), "      ");
        assert_eq!(Config::new(4, false).indent_text(6), "\t  ");
        assert_eq!(Config::new(4, true).tab_text(1), "   ");
        assert_eq!(Config::new(4, false).tab_text(1), "\t");
    }
}
