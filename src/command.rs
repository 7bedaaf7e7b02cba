//! Command records and the wire-grammar serializer.
//!
//! Every remote operation is one line of the form `Name(key=value;key=value)`.
//! Rather than hand-concatenating strings per operation, each command is a
//! structured record of named arguments rendered by a single serializer;
//! optional parameters are simply absent from the record.
//!
//! # Example
//! ```rust
//! use vlink::Command;
//!
//! let cmd = Command::new("ProjectAutomeasure")
//!     .arg("begin", true)
//!     .arg("close", true)
//!     .arg("attendedMode", false);
//! assert_eq!(
//!     cmd.render(),
//!     "ProjectAutomeasure(begin=true;close=true;attendedMode=false)"
//! );
//! ```
use std::fmt;

/// A single command argument, rendered with the host's value grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Bool(b) => write!(f, "{b}"),
            Arg::Int(i) => write!(f, "{i}"),
            Arg::Float(v) => write!(f, "{v}"),
            Arg::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Int(value)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

/// One remote operation with named arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    name: String,
    args: Vec<(String, Arg)>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Logical name of the operation, used for the response echo check.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.args.push((key.into(), value.into()));
        self
    }

    /// Include the argument only when a value is present.
    pub fn arg_opt(self, key: impl Into<String>, value: Option<impl Into<Arg>>) -> Self {
        match value {
            Some(value) => self.arg(key, value),
            None => self,
        }
    }

    /// Render into the host's wire grammar.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 2 + self.args.len() * 16);
        out.push_str(&self.name);
        out.push('(');
        for (i, (key, value)) in self.args.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            out.push_str(key);
            out.push('=');
            out.push_str(&value.to_string());
        }
        out.push(')');
        out
    }
}

/// Parameters for the automatic measurement operation.
///
/// Named optional fields; absent fields are left out of the rendered
/// command and the host applies its own defaults.
#[derive(Debug, Clone, Default)]
pub struct AutomeasureParams {
    pub begin: Option<bool>,
    pub close: Option<bool>,
    pub find_new_points: Option<bool>,
    pub attended_mode: Option<bool>,
}

impl AutomeasureParams {
    pub fn to_command(&self) -> Command {
        Command::new("ProjectAutomeasure")
            .arg_opt("begin", self.begin)
            .arg_opt("close", self.close)
            .arg_opt("findNewPoints", self.find_new_points)
            .arg_opt("attendedMode", self.attended_mode)
    }
}

/// Parameters for the XYZ export report operation.
#[derive(Debug, Clone, Default)]
pub struct ExportReportParams {
    pub filename: Option<String>,
    pub save_as: Option<String>,
    pub measured_data: Option<bool>,
    pub save: Option<bool>,
    pub ok: Option<bool>,
}

impl ExportReportParams {
    pub fn to_command(&self) -> Command {
        Command::new("XYZExportReport")
            .arg_opt("filename", self.filename.clone())
            .arg_opt("saveAs", self.save_as.clone())
            .arg_opt("measuredData", self.measured_data)
            .arg_opt("save", self.save)
            .arg_opt("ok", self.ok)
    }
}
