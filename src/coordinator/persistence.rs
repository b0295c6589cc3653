use std::path::Path;

use super::CoordinatorOptions;

pub const OPTIONS_FORMAT_VERSION: u32 = 1;

#[derive(Debug)]
pub enum OptionsPersistenceError {
    UnsupportedVersion { found: u32, expected: u32 },
    RonSerialize(ron::Error),
    RonDeserialize(ron::error::SpannedError),
    Io(std::io::Error),
}

impl std::fmt::Display for OptionsPersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedVersion { found, expected } => {
                write!(
                    f,
                    "unsupported options file version: {found} (expected {expected})"
                )
            }
            Self::RonSerialize(err) => write!(f, "ron serialize error: {err}"),
            Self::RonDeserialize(err) => write!(f, "ron deserialize error: {err}"),
            Self::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for OptionsPersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnsupportedVersion { .. } => None,
            Self::RonSerialize(err) => Some(err),
            Self::RonDeserialize(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for OptionsPersistenceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ron::Error> for OptionsPersistenceError {
    fn from(err: ron::Error) -> Self {
        Self::RonSerialize(err)
    }
}

impl From<ron::error::SpannedError> for OptionsPersistenceError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::RonDeserialize(err)
    }
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
struct OptionsFile {
    version: u32,
    options: CoordinatorOptions,
}

fn pretty_ron_config() -> ron::ser::PrettyConfig {
    ron::ser::PrettyConfig::new()
        .depth_limit(128)
        .separate_tuple_members(true)
        .enumerate_arrays(true)
}

impl CoordinatorOptions {
    /// # Errors
    /// Fails if the options cannot be encoded as RON.
    pub fn to_ron_string(&self) -> Result<String, OptionsPersistenceError> {
        let file = OptionsFile {
            version: OPTIONS_FORMAT_VERSION,
            options: self.clone(),
        };
        Ok(ron::ser::to_string_pretty(&file, pretty_ron_config())?)
    }

    /// Fields missing from the file keep their defaults.
    ///
    /// # Errors
    /// Fails on malformed RON or a file of another format version.
    pub fn from_ron_str(ron_str: &str) -> Result<Self, OptionsPersistenceError> {
        let file: OptionsFile = ron::from_str(ron_str)?;
        if file.version != OPTIONS_FORMAT_VERSION {
            return Err(OptionsPersistenceError::UnsupportedVersion {
                found: file.version,
                expected: OPTIONS_FORMAT_VERSION,
            });
        }
        Ok(file.options)
    }

    /// # Errors
    /// See [`Self::to_ron_string`]; also fails if the file cannot be written.
    pub fn save_to_ron_file(&self, path: impl AsRef<Path>) -> Result<(), OptionsPersistenceError> {
        let ron = self.to_ron_string()?;
        std::fs::write(path, ron)?;
        Ok(())
    }

    /// # Errors
    /// See [`Self::from_ron_str`]; also fails if the file cannot be read.
    pub fn load_from_ron_file(path: impl AsRef<Path>) -> Result<Self, OptionsPersistenceError> {
        let ron_str = std::fs::read_to_string(path)?;
        Self::from_ron_str(&ron_str)
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;

    #[test]
    fn options_survive_a_ron_file() {
        let options = CoordinatorOptions {
            monitor_period: Duration::from_millis(750),
            signal_tag: "OPEN_PREVIEW".to_owned(),
            monitor_repair: false,
            ..Default::default()
        };
        let text = options.to_ron_string().expect("serialize");
        let loaded = CoordinatorOptions::from_ron_str(&text).expect("deserialize");
        assert_eq!(loaded, options);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let loaded = CoordinatorOptions::from_ron_str(
            "(version: 1, options: (signal_element_id: \"tab-signal\"))",
        )
        .expect("deserialize");
        assert_eq!(loaded.signal_element_id, "tab-signal");
        assert_eq!(loaded.bind_guard_window, Duration::from_millis(100));
        assert_eq!(loaded.selectors, super::super::Selectors::default());
    }

    #[test]
    fn newer_version_is_rejected() {
        let err = CoordinatorOptions::from_ron_str("(version: 7, options: (monitor_repair: true))")
            .expect_err("version check");
        assert!(matches!(
            err,
            OptionsPersistenceError::UnsupportedVersion {
                found: 7,
                expected: OPTIONS_FORMAT_VERSION
            }
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("dropwire-options-that-do-not-exist.ron");
        let err = CoordinatorOptions::load_from_ron_file(path).expect_err("missing file");
        assert!(matches!(err, OptionsPersistenceError::Io(_)));
    }
}
