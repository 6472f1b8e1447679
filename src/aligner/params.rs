//! MAUS parameter resolution.
//!
//! Every recognized parameter is either supplied by the caller or taken from
//! the configured defaults, then rendered as `KEY=value` arguments.

use crate::config::MausDefaults;
use crate::error::{MausError, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Parameters owned by the invoker; callers cannot override them.
pub const RESERVED_KEYS: &[&str] = &["SIGNAL", "BPF", "OUT"];

/// Format a boolean the way MAUS expects it.
pub fn maus_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Caller-supplied aligner options. `None` means "use the configured default".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignOptions {
    pub language: Option<String>,
    pub canonly: Option<bool>,
    pub minpauslen: Option<u32>,
    pub startword: Option<u32>,
    pub endword: Option<u32>,
    pub mausshift: Option<f64>,
    pub insprob: Option<f64>,
    pub inskantextgrid: Option<bool>,
    pub insorttextgrid: Option<bool>,
    pub usetrn: Option<bool>,
    pub outformat: Option<String>,
    /// Additional MAUS parameters, keyed by upper-cased name.
    pub extra: BTreeMap<String, String>,
}

impl AlignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn outformat(mut self, outformat: impl Into<String>) -> Self {
        self.outformat = Some(outformat.into());
        self
    }

    pub fn canonly(mut self, canonly: bool) -> Self {
        self.canonly = Some(canonly);
        self
    }

    /// Add an arbitrary MAUS parameter. The key is upper-cased.
    ///
    /// SIGNAL, BPF and OUT are managed by the invoker and rejected here.
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Result<Self> {
        let key = key.trim().to_ascii_uppercase();
        if key.is_empty() {
            return Err(MausError::Other("empty MAUS parameter name".to_string()));
        }
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(MausError::Other(format!(
                "MAUS parameter {} is set by the aligner and cannot be overridden",
                key
            )));
        }
        self.extra.insert(key, value.into());
        Ok(self)
    }

    /// Add a parameter given as `KEY=value`.
    pub fn param_assignment(self, assignment: &str) -> Result<Self> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            MausError::Other(format!(
                "invalid MAUS parameter '{}', expected KEY=VALUE",
                assignment
            ))
        })?;
        self.param(key, value)
    }

    /// Fill every unset option from `defaults`.
    pub fn resolve(&self, defaults: &MausDefaults) -> ResolvedParams {
        let mut entries: Vec<(String, String)> = vec![
            (
                "OUTFORMAT".into(),
                self.outformat.clone().unwrap_or_else(|| defaults.outformat.clone()),
            ),
            (
                "INSKANTEXTGRID".into(),
                maus_bool(self.inskantextgrid.unwrap_or(defaults.inskantextgrid)).into(),
            ),
            (
                "INSORTTEXTGRID".into(),
                maus_bool(self.insorttextgrid.unwrap_or(defaults.insorttextgrid)).into(),
            ),
            (
                "LANGUAGE".into(),
                self.language.clone().unwrap_or_else(|| defaults.language.clone()),
            ),
            (
                "CANONLY".into(),
                maus_bool(self.canonly.unwrap_or(defaults.canonly)).into(),
            ),
            (
                "MINPAUSLEN".into(),
                self.minpauslen.unwrap_or(defaults.minpauslen).to_string(),
            ),
            (
                "STARTWORD".into(),
                self.startword.unwrap_or(defaults.startword).to_string(),
            ),
            (
                "ENDWORD".into(),
                self.endword.unwrap_or(defaults.endword).to_string(),
            ),
            (
                "MAUSSHIFT".into(),
                self.mausshift.unwrap_or(defaults.mausshift).to_string(),
            ),
            (
                "INSPROB".into(),
                self.insprob.unwrap_or(defaults.insprob).to_string(),
            ),
            (
                "USETRN".into(),
                maus_bool(self.usetrn.unwrap_or(defaults.usetrn)).into(),
            ),
        ];

        for (key, value) in &self.extra {
            if RESERVED_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %key, "ignoring reserved MAUS parameter");
                continue;
            }
            match entries.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value.clone(),
                None => entries.push((key.clone(), value.clone())),
            }
        }

        ResolvedParams { entries }
    }
}

/// Fully resolved parameter set, in the order it is passed to MAUS.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    entries: Vec<(String, String)>,
}

impl ResolvedParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn outformat(&self) -> &str {
        self.get("OUTFORMAT").unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render `SIGNAL`, `BPF`, `OUT` and then every resolved parameter as
    /// `KEY=value`.
    pub fn to_args(&self, signal: &Path, bpf: &Path, out: &Path) -> Vec<String> {
        let mut args = vec![
            format!("SIGNAL={}", signal.display()),
            format!("BPF={}", bpf.display()),
            format!("OUT={}", out.display()),
        ];
        args.extend(self.iter().map(|(k, v)| format!("{}={}", k, v)));
        args
    }
}
