use crate::shading::{ColorSlot, ParamId, ShaderParams, parse_color};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Saved panel state: preset name plus every control value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamFile {
    pub preset: Option<String>,
    pub params: ShaderParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamFileError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ParamFile {
    /// Parses `key=value` lines on top of `base`; keys not present keep
    /// their base value.
    pub fn parse(text: &str, base: &ShaderParams) -> Result<Self, ParamFileError> {
        let mut out = Self {
            preset: None,
            params: *base,
        };
        let mut seen: HashSet<String> = HashSet::new();

        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key_raw, value_raw)) = line.split_once('=') else {
                return Err(ParamFileError::Parse {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            let key = key_raw.trim();
            let value = value_raw.trim();
            if !seen.insert(key.to_string()) {
                return Err(ParamFileError::Parse {
                    line: line_no,
                    message: format!("duplicate '{key}' field"),
                });
            }

            if key == "preset" {
                if value.is_empty() {
                    return Err(ParamFileError::InvalidValue {
                        field: key.to_string(),
                        message: "must not be empty".to_string(),
                    });
                }
                out.preset = Some(value.to_string());
            } else if let Some(id) = ParamId::from_key(key) {
                let v = parse_f32(value, line_no, key)?;
                out.params.set(id, v);
            } else if let Some(slot) = ColorSlot::from_key(key) {
                let c = parse_color(value).map_err(|e| ParamFileError::InvalidValue {
                    field: key.to_string(),
                    message: e.to_string(),
                })?;
                out.params.palette.set(slot, c);
            } else {
                return Err(ParamFileError::Parse {
                    line: line_no,
                    message: format!("unknown key '{key}'"),
                });
            }
        }

        Ok(out)
    }

    /// A missing file is not an error: `base` comes back unchanged.
    pub fn load(path: Option<&Path>, base: &ShaderParams) -> Result<Self, ParamFileError> {
        let fallback = Self {
            preset: None,
            params: *base,
        };
        let Some(path) = path else {
            return Ok(fallback);
        };
        let text = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(fallback),
            Err(err) => return Err(ParamFileError::Io(err.to_string())),
        };
        Self::parse(&text, base)
    }

    pub fn to_text(&self) -> String {
        let mut lines = vec!["# blob_visualizer params v1".to_string()];
        if let Some(preset) = &self.preset {
            lines.push(format!("preset={preset}"));
        }
        for id in ParamId::all() {
            lines.push(format!("{}={}", id.key(), self.params.get(id)));
        }
        for slot in ColorSlot::all() {
            lines.push(format!("{}={}", slot.key(), self.params.palette.get(slot).to_hex()));
        }
        lines.push(String::new());
        lines.join("\n")
    }

    pub fn save(&self, path: &Path) -> Result<(), ParamFileError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ParamFileError::Io(e.to_string()))?;
            }
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.to_text()).map_err(|e| ParamFileError::Io(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| ParamFileError::Io(e.to_string()))
    }
}

pub fn params_storage_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Some(PathBuf::from(xdg).join("blob_visualizer").join("params.txt"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("blob_visualizer")
            .join("params.txt"),
    )
}

fn parse_f32(s: &str, line: usize, field: &str) -> Result<f32, ParamFileError> {
    match s.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParamFileError::Parse {
            line,
            message: format!("invalid float for {field}"),
        }),
    }
}
