//! The session facade.
//!
//! A [`Session`] is the single entry point a script holds for the lifetime
//! of the process. It owns the command channel, the return-value store and
//! the payload slots shared with the demultiplexer thread, and exposes both
//! the generic execute/wait pattern and thin wrappers for common remote
//! operations.
//!
//! Construction and connection are explicit: a session that has not been
//! connected fails every operation with [`LinkError::NotConnected`] rather
//! than initializing behind the caller's back.
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};

use crate::command::{AutomeasureParams, Command, ExportReportParams};
use crate::error::LinkError;
use crate::payload::{
    Cloud, Matrix, Payload, PayloadKind, Picture, ProjectCompareStats, ScaleBars,
};
use crate::protocol::{CommandChannel, Demultiplexer, Dispatcher, PayloadSlots, connect_with_retry};
use crate::stats::{AlignmentStats, AutoRelabelResults, BundleStats};
use crate::values::ReturnValueStore;
use crate::version::{ASYNC_MATRIX_AND_SCALEBARS, encode_version};

/// Connection settings for one host.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Host name or address of the measurement application.
    pub host: String,
    /// Command channel port; the push channel listens one port above.
    pub command_port: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            command_port: 1210,
        }
    }
}

/// A connected scripting session with the measurement host.
pub struct Session {
    config: SessionConfig,
    dispatcher: Option<Dispatcher<TcpStream>>,
    slots: Arc<PayloadSlots>,
    demux: Option<JoinHandle<()>>,
    push_stream: Option<TcpStream>,
    last_error: Option<String>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            dispatcher: None,
            slots: Arc::new(PayloadSlots::new()),
            demux: None,
            push_stream: None,
            last_error: None,
        }
    }

    /// Open both host connections, start the demultiplexer and read the
    /// host's version.
    ///
    /// Blocks until the host accepts both sockets, retrying indefinitely.
    /// Also serves as the re-initialization step after a send failure.
    pub fn connect(&mut self) -> Result<(), LinkError> {
        self.shutdown_push();

        let (command, push) = connect_with_retry(&self.config.host, self.config.command_port);
        info!(
            "connected to {}:{} (push on {})",
            self.config.host,
            self.config.command_port,
            self.config.command_port + 1
        );

        self.push_stream = push.try_clone().ok();
        self.demux = Some(Demultiplexer::spawn(push, Arc::clone(&self.slots)));

        let mut dispatcher = Dispatcher::new(CommandChannel::new(command));
        dispatcher.execute(&Command::new("GetVSTARSVersion"))?;
        let version = match dispatcher.store().get_str("v.versionString") {
            Ok(text) => encode_version(text),
            Err(_) => 0,
        };
        info!("host version encodes to {version}");
        dispatcher.set_host_version(version);

        self.dispatcher = Some(dispatcher);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Encoded host version; `0` until connected.
    pub fn host_version(&self) -> u64 {
        self.dispatcher
            .as_ref()
            .map(Dispatcher::host_version)
            .unwrap_or(0)
    }

    /// The session-wide return-value store.
    pub fn store(&self) -> Result<&ReturnValueStore, LinkError> {
        self.dispatcher
            .as_ref()
            .map(Dispatcher::store)
            .ok_or(LinkError::NotConnected)
    }

    /// Whether the most recent command reported a host-side failure.
    pub fn last_failed(&self) -> bool {
        self.dispatcher
            .as_ref()
            .map(Dispatcher::last_failed)
            .unwrap_or(false)
    }

    /// Message of the most recent host-reported failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Most recent payload of `kind` received on the push channel.
    pub fn latest(&self, kind: PayloadKind) -> Option<Payload> {
        self.slots.latest(kind)
    }

    /// Execute one command as a blocking round trip.
    ///
    /// A transport failure triggers exactly one full re-initialization and
    /// retry; a second failure propagates. Host-reported failures always
    /// propagate.
    pub fn execute(&mut self, command: &Command) -> Result<(), LinkError> {
        let first = match self.dispatcher.as_mut() {
            Some(dispatcher) => dispatcher.execute(command),
            None => return Err(LinkError::NotConnected),
        };

        let result = match first {
            Err(LinkError::Io(e)) => {
                warn!("send failed ({e}); re-initializing session and retrying once");
                self.connect()?;
                match self.dispatcher.as_mut() {
                    Some(dispatcher) => dispatcher.execute(command),
                    None => return Err(LinkError::NotConnected),
                }
            }
            other => other,
        };

        match &result {
            Ok(()) => self.last_error = None,
            Err(LinkError::Host(msg)) => self.last_error = Some(msg.clone()),
            Err(_) => {}
        }
        result
    }

    /// Execute a command expected to trigger an async payload, then block
    /// until the payload arrives or `timeout` elapses.
    ///
    /// The waiter is armed before dispatch since the payload may arrive
    /// before the command's own response. At most one outstanding wait per
    /// payload kind is supported.
    pub fn execute_expecting(
        &mut self,
        command: &Command,
        kind: PayloadKind,
        timeout: Option<Duration>,
    ) -> Result<Payload, LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }

        if !self.supports_payload(kind) {
            // The host still executes the command; it just never publishes
            // the payload, so fail loudly instead of waiting forever.
            self.execute(command)?;
            return Err(LinkError::UnsupportedPayload {
                kind,
                version: self.host_version(),
            });
        }

        let waiter = self.slots.arm(kind);
        if let Err(e) = self.execute(command) {
            self.slots.disarm(kind);
            return Err(e);
        }

        let outcome = Self::wait(&waiter, timeout);
        self.slots.disarm(kind);
        outcome.ok_or(LinkError::PayloadTimeout { kind })
    }

    fn wait(waiter: &Receiver<Payload>, timeout: Option<Duration>) -> Option<Payload> {
        match timeout {
            Some(timeout) => match waiter.recv_timeout(timeout) {
                Ok(payload) => Some(payload),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
            },
            None => waiter.recv().ok(),
        }
    }

    /// Whether the connected host publishes payloads of `kind`.
    pub fn supports_payload(&self, kind: PayloadKind) -> bool {
        match kind {
            PayloadKind::Matrix | PayloadKind::ScaleBars => {
                self.host_version() >= ASYNC_MATRIX_AND_SCALEBARS
            }
            _ => self.is_connected(),
        }
    }

    fn shutdown_push(&mut self) {
        if let Some(stream) = self.push_stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        if let Some(handle) = self.demux.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown_push();
    }
}

/// Thin wrappers over common remote operations. Each is one formatted
/// command plus, where relevant, a read from the return-value store or a
/// wait on an async payload.
impl Session {
    pub fn file_open_template_project(
        &mut self,
        template: &str,
        save: &str,
    ) -> Result<(), LinkError> {
        self.execute(
            &Command::new("FileOpenTemplateProject")
                .arg("template", template)
                .arg("save", save),
        )
    }

    pub fn pictures_set_image_path(&mut self, path: &str) -> Result<(), LinkError> {
        self.execute(&Command::new("PicturesSetImagePath").arg("path", path))
    }

    pub fn project_import_images(&mut self, below: bool) -> Result<(), LinkError> {
        self.execute(&Command::new("ProjectImportImages").arg("below", below))
    }

    pub fn project_automeasure(&mut self, params: &AutomeasureParams) -> Result<(), LinkError> {
        self.execute(&params.to_command())
    }

    pub fn rename_3d(&mut self, new_name: &str) -> Result<(), LinkError> {
        self.execute(&Command::new("Rename3D").arg("newName", new_name))
    }

    pub fn project_path(&mut self) -> Result<String, LinkError> {
        self.execute(&Command::new("ProjectPath"))?;
        Ok(self.store()?.get_str("v.projectPath")?.to_string())
    }

    /// Names of the driver and triangulation files of the open project.
    pub fn project_file_names(&mut self) -> Result<(String, String), LinkError> {
        self.execute(&Command::new("ProjectFileNames"))?;
        let store = self.store()?;
        Ok((
            store.get_str("v.driverFile")?.to_string(),
            store.get_str("v.triangulationFile")?.to_string(),
        ))
    }

    pub fn xyz_export_report(&mut self, params: &ExportReportParams) -> Result<(), LinkError> {
        self.execute(&params.to_command())
    }

    pub fn pause(&mut self, message: &str) -> Result<(), LinkError> {
        self.execute(&Command::new("Pause").arg("message", message))
    }

    pub fn mmode_setup(&mut self, save_epochs: bool, save_images: bool) -> Result<(), LinkError> {
        self.execute(
            &Command::new("MModeSetup")
                .arg("saveEpochs", save_epochs)
                .arg("saveImages", save_images),
        )
    }

    pub fn mmode_trigger(&mut self) -> Result<(), LinkError> {
        self.execute(&Command::new("MModeTrigger"))
    }

    /// Fetch a point cloud by name.
    pub fn get_cloud(
        &mut self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<Cloud, LinkError> {
        let command = Command::new("GetCloud").arg("name", name);
        match self.execute_expecting(&command, PayloadKind::Cloud, timeout)? {
            Payload::Cloud(cloud) => Ok(cloud),
            _ => unreachable!("cloud waiter signalled with a different payload kind"),
        }
    }

    /// Fetch a picture and its measured image points by label.
    pub fn get_picture(
        &mut self,
        label: &str,
        timeout: Option<Duration>,
    ) -> Result<Picture, LinkError> {
        let command = Command::new("GetPicture").arg("label", label);
        match self.execute_expecting(&command, PayloadKind::Picture, timeout)? {
            Payload::Picture(picture) => Ok(picture),
            _ => unreachable!("picture waiter signalled with a different payload kind"),
        }
    }

    /// Fetch a named matrix. Requires a host new enough to publish matrix
    /// payloads.
    pub fn get_matrix(
        &mut self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<Matrix, LinkError> {
        let command = Command::new("GetMatrix").arg("name", name);
        match self.execute_expecting(&command, PayloadKind::Matrix, timeout)? {
            Payload::Matrix(matrix) => Ok(matrix),
            _ => unreachable!("matrix waiter signalled with a different payload kind"),
        }
    }

    /// Fetch every scale bar in the project. Requires a host new enough to
    /// publish scale-bar payloads.
    pub fn get_scalebars(&mut self, timeout: Option<Duration>) -> Result<ScaleBars, LinkError> {
        let command = Command::new("GetScalebars");
        match self.execute_expecting(&command, PayloadKind::ScaleBars, timeout)? {
            Payload::ScaleBars(bars) => Ok(bars),
            _ => unreachable!("scale-bar waiter signalled with a different payload kind"),
        }
    }

    /// Compare the open project against another and collect the statistics.
    pub fn project_compare(
        &mut self,
        other_project: &str,
        timeout: Option<Duration>,
    ) -> Result<ProjectCompareStats, LinkError> {
        let command = Command::new("ProjectCompare").arg("project", other_project);
        match self.execute_expecting(&command, PayloadKind::CompareStats, timeout)? {
            Payload::CompareStats(stats) => Ok(stats),
            _ => unreachable!("compare-stats waiter signalled with a different payload kind"),
        }
    }

    /// Bundle statistics from the most recent bundle adjustment.
    pub fn bundle_stats(&self) -> Result<BundleStats, LinkError> {
        BundleStats::from_store(self.store()?)
    }

    /// Alignment statistics from the most recent alignment.
    pub fn alignment_stats(&self) -> Result<AlignmentStats, LinkError> {
        AlignmentStats::from_store(self.store()?)
    }

    /// Results of the most recent auto-relabel run.
    pub fn auto_relabel_results(&self) -> Result<AutoRelabelResults, LinkError> {
        AutoRelabelResults::from_store(self.store()?)
    }
}
