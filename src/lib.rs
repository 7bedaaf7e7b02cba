//! Scripting SDK for a photogrammetry measurement host.
//!
//! The host is an external, closed-source application controlled over two
//! TCP connections: a synchronous command channel speaking a textual
//! `Name(key=value;...)` grammar, and an asynchronous push channel carrying
//! `<json>`-framed payloads (point clouds, pictures, matrices, scale bars,
//! comparison statistics). A [`Session`] owns both connections and is the
//! single object a script holds:
//!
//! ```no_run
//! use vlink::{Session, SessionConfig};
//!
//! # fn main() -> Result<(), vlink::LinkError> {
//! let mut vs = Session::new(SessionConfig::default());
//! vs.connect()?;
//!
//! vs.file_open_template_project("Demo Project", "Job 42")?;
//! vs.project_automeasure(&Default::default())?;
//! let cloud = vs.get_cloud("Final Results", Some(std::time::Duration::from_secs(30)))?;
//! println!("measured {} points", cloud.points.len());
//! # Ok(())
//! # }
//! ```
pub mod command;
pub mod error;
pub mod payload;
pub mod protocol;
pub mod session;
pub mod stats;
pub mod transform;
pub mod values;
pub mod version;

pub use command::{Arg, AutomeasureParams, Command, ExportReportParams};
pub use error::LinkError;
pub use payload::{
    Cloud, ImagePoint, Matrix, ObjectPoint, Payload, PayloadKind, Picture, ProjectCompareStats,
    ScaleBar, ScaleBars, ScaleDistance,
};
pub use session::{Session, SessionConfig};
pub use stats::{AlignmentStats, AutoRelabelResults, BundleStats};
pub use transform::TransformationMatrix;
pub use values::{ReturnValue, ReturnValueStore, Value};
