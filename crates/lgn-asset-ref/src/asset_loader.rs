use std::{
    any::Any,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, error, info, warn};

use crate::{
    asset_handler::{AssetHandler, LoadContext},
    events::EventDispatcher,
    vfs, AssetData, AssetEvent, AssetInfo, AssetManagerConfig, LoadError,
};

/// One load of one asset record.
///
/// The request keeps the record alive until the load completes, even if every
/// handle to it is dropped meanwhile.
pub(crate) struct LoadRequest {
    pub(crate) data: Arc<AssetData>,
    pub(crate) info: AssetInfo,
    pub(crate) handler: Arc<dyn AssetHandler>,
    pub(crate) context: LoadContext,
    /// The record was `Ready` or `Error` before this load.
    pub(crate) reload: bool,
}

impl LoadRequest {
    fn fail(&self, err: LoadError, events: &EventDispatcher) {
        self.data.fail(err.clone());
        events.send(&AssetEvent::Error(self.data.id(), err));
    }
}

pub(crate) enum LoaderRequest {
    Load(LoadRequest),
    Terminate,
}

#[derive(Clone)]
struct LoaderSettings {
    load_delay: Duration,
    force_load_error: bool,
    warning_threshold: Option<Duration>,
}

impl From<&AssetManagerConfig> for LoaderSettings {
    fn from(config: &AssetManagerConfig) -> Self {
        Self {
            load_delay: Duration::from_millis(config.load_delay_ms),
            force_load_error: config.force_load_error,
            warning_threshold: config.load_warning_threshold_ms.map(Duration::from_millis),
        }
    }
}

impl LoaderSettings {
    /// Returns true if a handler run of `elapsed` deserves a warning.
    fn is_slow(&self, elapsed: Duration) -> bool {
        self.warning_threshold
            .map_or(false, |threshold| elapsed > threshold)
    }
}

/// Pool of loader threads fed by a shared request queue.
pub(crate) struct AssetLoader {
    request_tx: crossbeam_channel::Sender<LoaderRequest>,
    request_rx: crossbeam_channel::Receiver<LoaderRequest>,
    terminating: Arc<AtomicBool>,
    events: Arc<EventDispatcher>,
    workers: Vec<JoinHandle<()>>,
}

impl AssetLoader {
    pub(crate) fn new(
        devices: Vec<Box<dyn vfs::Device>>,
        config: &AssetManagerConfig,
        events: Arc<EventDispatcher>,
    ) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<LoaderRequest>();
        let devices: Arc<[Box<dyn vfs::Device>]> = devices.into();
        let settings = LoaderSettings::from(config);
        let terminating = Arc::new(AtomicBool::new(false));

        let workers = (0..config.worker_count.max(1))
            .filter_map(|index| {
                let io = AssetLoaderIO {
                    devices: devices.clone(),
                    settings: settings.clone(),
                    terminating: terminating.clone(),
                    events: events.clone(),
                    request_rx: request_rx.clone(),
                };
                thread::Builder::new()
                    .name(format!("asset-loader-{}", index))
                    .spawn(move || io.run())
                    .map_err(|err| error!("Failed to spawn asset loader thread: {}", err))
                    .ok()
            })
            .collect::<Vec<_>>();

        Self {
            request_tx,
            request_rx,
            terminating,
            events,
            workers,
        }
    }

    /// Enqueues a load request.
    pub(crate) fn dispatch(&self, request: LoadRequest) {
        if self.workers.is_empty() {
            request.fail(LoadError::Terminated(request.data.id()), &self.events);
            return;
        }
        if let Err(err) = self.request_tx.send(LoaderRequest::Load(request)) {
            if let LoaderRequest::Load(request) = err.into_inner() {
                request.fail(LoadError::Terminated(request.data.id()), &self.events);
            }
        }
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        self.terminating.store(true, Ordering::Release);
        for _ in &self.workers {
            let _res = self.request_tx.send(LoaderRequest::Terminate);
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("Asset loader thread panicked");
            }
        }
        // Requests left behind by workers that exited early.
        for request in self.request_rx.try_iter() {
            if let LoaderRequest::Load(request) = request {
                request.fail(LoadError::Terminated(request.data.id()), &self.events);
            }
        }
    }
}

/// State owned by one loader thread.
struct AssetLoaderIO {
    devices: Arc<[Box<dyn vfs::Device>]>,
    settings: LoaderSettings,
    terminating: Arc<AtomicBool>,
    events: Arc<EventDispatcher>,
    request_rx: crossbeam_channel::Receiver<LoaderRequest>,
}

impl AssetLoaderIO {
    fn run(self) {
        while let Ok(LoaderRequest::Load(request)) = self.request_rx.recv() {
            if self.terminating.load(Ordering::Acquire) {
                request.fail(LoadError::Terminated(request.data.id()), &self.events);
                continue;
            }
            self.process(request);
        }
    }

    fn process(&self, request: LoadRequest) {
        let id = request.data.id();
        let start = Instant::now();

        if !self.settings.load_delay.is_zero() {
            thread::sleep(self.settings.load_delay);
        }

        if self.settings.force_load_error {
            debug!("Forcing load error for asset {}", id);
            request.fail(LoadError::Forced(id), &self.events);
            return;
        }

        let content = match self
            .devices
            .iter()
            .find_map(|device| device.load(&request.info))
        {
            Some(content) => content,
            None => {
                request.fail(LoadError::ContentNotFound(id), &self.events);
                return;
            }
        };

        let handler_start = Instant::now();
        let result = request
            .handler
            .load(&request.context, &mut content.as_slice());
        let handler_elapsed = handler_start.elapsed();

        match result {
            Ok(payload) => {
                let payload: Arc<dyn Any + Send + Sync> = Arc::from(payload);
                request.data.complete(payload);
                info!(
                    "Loaded asset {} ('{}'): {} bytes in {:?}",
                    id,
                    request.info.relative_path,
                    content.len(),
                    start.elapsed()
                );
                let event = if request.reload {
                    AssetEvent::Reloaded(id)
                } else {
                    AssetEvent::Ready(id)
                };
                self.events.send(&event);
            }
            Err(err) => {
                let err = LoadError::HandlerFailed {
                    id,
                    reason: err.to_string(),
                };
                request.fail(err, &self.events);
            }
        }

        if self.settings.is_slow(handler_elapsed) {
            warn!(
                "Load of asset {} ('{}') took {:?}, more than {:?}",
                id,
                request.info.relative_path,
                handler_elapsed,
                self.settings.warning_threshold.unwrap_or_default()
            );
        }
    }
}
